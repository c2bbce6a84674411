use std::ops::DerefMut;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use log::debug;

use crate::events::DomainEvent;
use crate::models::{HintId, HintStatus, NewAnswerSubmission, Puzzle, PuzzleId, Team, TeamId};

use super::answer::{answers_match, normalize_answer};
use super::db_util::{new_unlocated_server_error, EngineError, ERROR_DB_UNKNOWN};

pub struct SubmissionOutcome {
    /// False when the same normalized guess was already on file; nothing is
    /// recorded and no events fire in that case.
    pub recorded: bool,
    pub is_correct: bool,
    pub events: Vec<DomainEvent>,
}

/// Append one guess to the team's submission log. The guess is stored in
/// normalized form; the (team, puzzle, answer) unique constraint makes the
/// operation idempotent under resubmission. Correct solves bump the team's
/// last-solve cache (free answers excepted) and obsolete any hints still
/// waiting on this puzzle. All side effects are reported back as events.
pub async fn record_submission<C>(
    team: &Team,
    puzzle: &Puzzle,
    guess: &str,
    is_message: bool,
    used_free_answer: bool,
    now: DateTime<Utc>,
    conn: &mut C,
) -> Result<SubmissionOutcome, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::answer_submission::dsl as submission_dsl;

    let normalized = normalize_answer(guess);
    let is_correct = used_free_answer || answers_match(guess, &puzzle.answer);

    let inserted = diesel::insert_into(submission_dsl::answer_submission)
        .values(NewAnswerSubmission {
            team: team.id,
            puzzle: puzzle.id,
            submitted_answer: &normalized,
            is_correct,
            is_message,
            used_free_answer,
            submitted_time: now,
        })
        .on_conflict((
            submission_dsl::team,
            submission_dsl::puzzle,
            submission_dsl::submitted_answer,
        ))
        .do_nothing()
        .execute(conn)
        .await
        .map_err(|e| new_unlocated_server_error(e, ERROR_DB_UNKNOWN))?;

    if inserted == 0 {
        debug!(
            "team {} repeated guess on puzzle {}, ignoring",
            team.id, puzzle.slug
        );
        return Ok(SubmissionOutcome {
            recorded: false,
            is_correct,
            events: vec![],
        });
    }

    let mut events = vec![DomainEvent::SubmissionRecorded {
        team: team.id,
        puzzle: puzzle.id,
        is_correct,
        is_message,
        used_free_answer,
    }];

    if is_correct {
        if !used_free_answer {
            touch_last_solve(team.id, now, conn).await?;
        }
        events.extend(obsolete_open_hints(team.id, puzzle.id, now, conn).await?);
    }

    Ok(SubmissionOutcome {
        recorded: true,
        is_correct,
        events,
    })
}

async fn touch_last_solve<C>(
    team_id: TeamId,
    now: DateTime<Utc>,
    conn: &mut C,
) -> Result<(), EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::team::dsl as team_dsl;

    diesel::update(team_dsl::team.filter(team_dsl::id.eq(team_id)))
        .set(team_dsl::last_solve_time.eq(now))
        .execute(conn)
        .await
        .map_err(|e| new_unlocated_server_error(e, ERROR_DB_UNKNOWN))?;

    Ok(())
}

/// A solve makes any still-open hint on the puzzle moot; flip them to
/// obsolete so they stop consuming budget.
async fn obsolete_open_hints<C>(
    team_id: TeamId,
    puzzle_id: PuzzleId,
    now: DateTime<Utc>,
    conn: &mut C,
) -> Result<Vec<DomainEvent>, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::hint::dsl as hint_dsl;

    let obsoleted: Vec<HintId> = diesel::update(
        hint_dsl::hint
            .filter(hint_dsl::team.eq(team_id))
            .filter(hint_dsl::puzzle.eq(puzzle_id))
            .filter(hint_dsl::status.eq(HintStatus::NoResponse.code())),
    )
    .set((
        hint_dsl::status.eq(HintStatus::Obsolete.code()),
        hint_dsl::answered_time.eq(now),
    ))
    .returning(hint_dsl::id)
    .get_results::<HintId>(conn)
    .await
    .map_err(|e| new_unlocated_server_error(e, ERROR_DB_UNKNOWN))?;

    Ok(obsoleted
        .into_iter()
        .map(|hint| DomainEvent::HintStatusChanged {
            hint,
            team: team_id,
            puzzle: puzzle_id,
            status: HintStatus::Obsolete,
        })
        .collect())
}
