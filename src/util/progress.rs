use std::collections::HashMap;
use std::ops::DerefMut;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::Error;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::models::{
    AnswerSubmission, Hint, HintStatus, NewPuzzleUnlock, PuzzleId, PuzzleUnlock, Team, TeamId,
};

use super::db_util::{new_unlocated_server_error, EngineError, ERROR_DB_UNKNOWN};

pub async fn fetch_team<C>(team_id: TeamId, conn: &mut C) -> Result<Option<Team>, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::team::dsl as team_dsl;

    match team_dsl::team
        .filter(team_dsl::id.eq(team_id))
        .select(Team::as_select())
        .first::<Team>(conn)
        .await
    {
        Ok(t) => Ok(Some(t)),
        Err(Error::NotFound) => Ok(None),
        Err(e) => Err(new_unlocated_server_error(e, ERROR_DB_UNKNOWN)),
    }
}

/// Ascending by submission time, the order accrual-affecting computations
/// need. Callers wanting display order reverse it themselves.
pub async fn fetch_submissions<C>(
    team_id: TeamId,
    conn: &mut C,
) -> Result<Vec<AnswerSubmission>, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::answer_submission::dsl as submission_dsl;

    submission_dsl::answer_submission
        .filter(submission_dsl::team.eq(team_id))
        .order(submission_dsl::submitted_time.asc())
        .select(AnswerSubmission::as_select())
        .load::<AnswerSubmission>(conn)
        .await
        .map_err(|e| new_unlocated_server_error(e, ERROR_DB_UNKNOWN))
}

pub async fn fetch_hints<C>(team_id: TeamId, conn: &mut C) -> Result<Vec<Hint>, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::hint::dsl as hint_dsl;

    hint_dsl::hint
        .filter(hint_dsl::team.eq(team_id))
        .order(hint_dsl::submitted_time.asc())
        .select(Hint::as_select())
        .load::<Hint>(conn)
        .await
        .map_err(|e| new_unlocated_server_error(e, ERROR_DB_UNKNOWN))
}

pub async fn fetch_unlocks<C>(
    team_id: TeamId,
    conn: &mut C,
) -> Result<HashMap<PuzzleId, PuzzleUnlock>, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::puzzle_unlock::dsl as unlock_dsl;

    let rows = unlock_dsl::puzzle_unlock
        .filter(unlock_dsl::team.eq(team_id))
        .select(PuzzleUnlock::as_select())
        .load::<PuzzleUnlock>(conn)
        .await
        .map_err(|e| new_unlocated_server_error(e, ERROR_DB_UNKNOWN))?;

    Ok(rows.into_iter().map(|u| (u.puzzle, u)).collect())
}

pub async fn fetch_extra_guess_grants<C>(
    team_id: TeamId,
    conn: &mut C,
) -> Result<HashMap<PuzzleId, i32>, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::extra_guess_grant::dsl as grant_dsl;

    let rows = grant_dsl::extra_guess_grant
        .filter(grant_dsl::team.eq(team_id))
        .select((grant_dsl::puzzle, grant_dsl::extra_guesses))
        .load::<(PuzzleId, i32)>(conn)
        .await
        .map_err(|e| new_unlocated_server_error(e, ERROR_DB_UNKNOWN))?;

    Ok(rows.into_iter().collect())
}

/// Bulk-insert newly discovered unlocks. Concurrent computations may race to
/// insert the same (team, puzzle) pair; the unique constraint plus
/// DO NOTHING resolves the race silently. Returns the number of rows that
/// actually landed.
pub async fn insert_unlocks_ignore_conflicts<C>(
    rows: &[NewPuzzleUnlock],
    conn: &mut C,
) -> Result<usize, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::puzzle_unlock::dsl as unlock_dsl;

    if rows.is_empty() {
        return Ok(0);
    }

    diesel::insert_into(unlock_dsl::puzzle_unlock)
        .values(rows)
        .on_conflict((unlock_dsl::team, unlock_dsl::puzzle))
        .do_nothing()
        .execute(conn)
        .await
        .map_err(|e| new_unlocated_server_error(e, ERROR_DB_UNKNOWN))
}

/// Record when a team first opened a puzzle page. Only the first view sticks.
pub async fn mark_unlock_viewed<C>(
    team_id: TeamId,
    puzzle_id: PuzzleId,
    now: DateTime<Utc>,
    conn: &mut C,
) -> Result<(), EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::puzzle_unlock::dsl as unlock_dsl;

    diesel::update(
        unlock_dsl::puzzle_unlock
            .filter(unlock_dsl::team.eq(team_id))
            .filter(unlock_dsl::puzzle.eq(puzzle_id))
            .filter(unlock_dsl::view_time.is_null()),
    )
    .set(unlock_dsl::view_time.eq(now))
    .execute(conn)
    .await
    .map_err(|e| new_unlocated_server_error(e, ERROR_DB_UNKNOWN))?;

    Ok(())
}

/// Staff-side hint lifecycle transition. Answered/refunded/obsolete stamp the
/// answer time; resetting to no-response clears it.
pub async fn update_hint_status<C>(
    hint_id: i32,
    status: HintStatus,
    now: DateTime<Utc>,
    conn: &mut C,
) -> Result<crate::events::DomainEvent, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    use crate::schema::hint::dsl as hint_dsl;

    let answered_time = match status {
        HintStatus::NoResponse => None,
        _ => Some(now),
    };

    let (team_id, puzzle_id) = diesel::update(hint_dsl::hint.filter(hint_dsl::id.eq(hint_id)))
        .set((
            hint_dsl::status.eq(status.code()),
            hint_dsl::answered_time.eq(answered_time),
        ))
        .returning((hint_dsl::team, hint_dsl::puzzle))
        .get_result::<(TeamId, PuzzleId)>(conn)
        .await
        .map_err(|e| match e {
            Error::NotFound => EngineError::UnknownHint,
            e => new_unlocated_server_error(e, ERROR_DB_UNKNOWN),
        })?;

    Ok(crate::events::DomainEvent::HintStatusChanged {
        hint: hint_id,
        team: team_id,
        puzzle: puzzle_id,
        status,
    })
}
