use chrono::{DateTime, TimeDelta, Utc};

use crate::config::HuntConfig;
use crate::models::{AnswerSubmission, Hint, HintStatus, Puzzle, PuzzleId, Team};

use super::catalog::Catalog;

/// Number of accrual table entries that apply at `now`, for a schedule that
/// releases its first entry at `schedule_start` and one more per `interval`.
fn accrual_intervals(
    schedule_start: DateTime<Utc>,
    interval: TimeDelta,
    now: DateTime<Utc>,
) -> usize {
    let elapsed = (now - schedule_start).num_milliseconds();
    let step = interval.num_milliseconds();
    (elapsed.div_euclid(step) + 1).max(0) as usize
}

/// Sum of the applicable prefix of an accrual table. Entries beyond the table
/// length are simply zero, not an error.
fn accrued_total(
    table: &[i32],
    schedule_start: DateTime<Utc>,
    interval: TimeDelta,
    now: DateTime<Utc>,
) -> i32 {
    let k = accrual_intervals(schedule_start, interval, now).min(table.len());
    table[..k].iter().sum()
}

/// Hints available to the team (used or not) at `now`. A step function of
/// `now`: zero while hints are disabled or after hunt end, manual grants only
/// inside the age gate, then grants plus interval accrual. The team's start
/// offset shifts the accrual schedule, not the clock.
pub fn num_hints_total(config: &HuntConfig, team: &Team, now: DateTime<Utc>) -> i32 {
    if !config.hints_enabled || now >= config.end_time {
        return 0;
    }
    if now < team.creation_time + config.team_age_before_hints {
        return team.total_hints_awarded;
    }
    team.total_hints_awarded
        + accrued_total(
            &config.hints_per_interval,
            config.hint_time - team.start_offset(),
            config.hint_interval,
            now,
        )
}

pub fn num_hints_used(hints: &[Hint]) -> i32 {
    hints.iter().filter(|h| h.consumes_hint()).count() as i32
}

/// May go negative when grants were retroactively reduced; callers must not
/// clamp, a negative value is what blocks further requests.
pub fn num_hints_remaining(
    config: &HuntConfig,
    team: &Team,
    hints: &[Hint],
    now: DateTime<Utc>,
) -> i32 {
    num_hints_total(config, team, now) - num_hints_used(hints)
}

pub fn num_intro_hints_used(config: &HuntConfig, hints: &[Hint], catalog: &Catalog) -> i32 {
    let used = hints
        .iter()
        .filter(|h| h.consumes_hint())
        .filter(|h| catalog.puzzle(h.puzzle).is_some_and(|p| catalog.is_intro(p)))
        .count() as i32;
    used.min(config.intro_hints)
}

pub fn num_intro_hints_remaining(
    config: &HuntConfig,
    team: &Team,
    hints: &[Hint],
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> i32 {
    let remaining = num_hints_remaining(config, team, hints, now);
    remaining.min(config.intro_hints - num_intro_hints_used(config, hints, catalog))
}

pub fn num_nonintro_hints_remaining(
    config: &HuntConfig,
    team: &Team,
    hints: &[Hint],
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> i32 {
    num_hints_remaining(config, team, hints, now)
        - num_intro_hints_remaining(config, team, hints, catalog, now)
}

/// Whether an open hint blocks a new request under the one-at-a-time rule.
pub fn hint_request_blocked(config: &HuntConfig, hints: &[Hint]) -> bool {
    config.one_hint_at_a_time
        && hints
            .iter()
            .any(|h| h.status() == HintStatus::NoResponse)
}

pub fn num_free_answers_total(config: &HuntConfig, team: &Team, now: DateTime<Utc>) -> i32 {
    if !config.free_answers_enabled || now >= config.end_time {
        return 0;
    }
    if now < team.creation_time + config.team_age_before_free_answers {
        return team.total_free_answers_awarded;
    }
    team.total_free_answers_awarded
        + accrued_total(
            &config.free_answers_per_interval,
            config.free_answer_time - team.start_offset(),
            config.free_answer_interval,
            now,
        )
}

pub fn num_free_answers_used(submissions: &[AnswerSubmission]) -> i32 {
    submissions.iter().filter(|s| s.used_free_answer).count() as i32
}

pub fn num_free_answers_remaining(
    config: &HuntConfig,
    team: &Team,
    submissions: &[AnswerSubmission],
    now: DateTime<Utc>,
) -> i32 {
    num_free_answers_total(config, team, now) - num_free_answers_used(submissions)
}

pub fn num_wrong_guesses(submissions: &[AnswerSubmission], puzzle: PuzzleId) -> i32 {
    submissions
        .iter()
        .filter(|s| s.puzzle == puzzle && !s.is_correct && !s.is_message)
        .count() as i32
}

/// Remaining guesses on one puzzle. Same unclamped contract as the hint
/// budget: negative means over-drawn.
pub fn guesses_remaining(
    config: &HuntConfig,
    puzzle: &Puzzle,
    extra_guesses: i32,
    submissions: &[AnswerSubmission],
) -> i32 {
    let max_guesses = puzzle.max_guesses.unwrap_or(config.max_guesses_per_puzzle);
    max_guesses + extra_guesses - num_wrong_guesses(submissions, puzzle.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testkit::{
        hint_with_status, hunt_config, puzzle_in, round, team_created_at, wrong_guess,
    };
    use chrono::TimeDelta;

    #[test]
    fn hints_accrue_on_the_interval_schedule() {
        let config = hunt_config();
        let team = team_created_at(config.start_time);
        // Age gate: nothing but manual grants before one interval of age.
        assert_eq!(num_hints_total(&config, &team, config.start_time), 0);
        // First entry releases at hint_time (start + 6h).
        assert_eq!(
            num_hints_total(&config, &team, config.hint_time),
            config.hints_per_interval[0]
        );
        // Table prefix sums thereafter: entries 1,1,1,1 by start+24h.
        assert_eq!(
            num_hints_total(&config, &team, config.start_time + TimeDelta::hours(24)),
            4
        );
    }

    #[test]
    fn accrual_beyond_table_length_is_clamped() {
        let config = hunt_config();
        let team = team_created_at(config.start_time);
        let total: i32 = config.hints_per_interval.iter().sum();
        assert_eq!(
            num_hints_total(&config, &team, config.end_time - TimeDelta::seconds(1)),
            total
        );
    }

    #[test]
    fn young_teams_get_manual_grants_only() {
        let config = hunt_config();
        let mut team = team_created_at(config.start_time + TimeDelta::days(2));
        team.total_hints_awarded = 3;
        let now = team.creation_time + TimeDelta::hours(1);
        assert_eq!(num_hints_total(&config, &team, now), 3);
    }

    #[test]
    fn hints_are_zero_after_hunt_end() {
        let config = hunt_config();
        let team = team_created_at(config.start_time);
        assert_eq!(num_hints_total(&config, &team, config.end_time), 0);
    }

    #[test]
    fn start_offset_shifts_the_schedule() {
        let config = hunt_config();
        let mut team = team_created_at(config.start_time - TimeDelta::days(1));
        team.start_offset_seconds = TimeDelta::hours(6).num_seconds();
        // Offset team reaches the first entry one interval early.
        assert_eq!(num_hints_total(&config, &team, config.start_time), 1);
    }

    #[test]
    fn budget_is_monotonic_in_time() {
        let config = hunt_config();
        let team = team_created_at(config.start_time);
        let mut previous = i32::MIN;
        for minutes in (0..72 * 60).step_by(17) {
            let now = config.start_time + TimeDelta::minutes(minutes);
            let total = num_hints_total(&config, &team, now);
            assert!(total >= previous, "budget decreased at +{minutes}m");
            previous = total;
        }
    }

    #[test]
    fn followup_and_refunded_hints_do_not_consume() {
        use crate::models::HintStatus::*;
        let hints = vec![
            hint_with_status(1, 10, NoResponse, false),
            hint_with_status(2, 10, Answered, false),
            hint_with_status(3, 10, Answered, true), // followup
            hint_with_status(4, 11, Refunded, false),
            hint_with_status(5, 11, Obsolete, false),
        ];
        assert_eq!(num_hints_used(&hints), 2);
    }

    #[test]
    fn refund_releases_a_previously_counted_hint() {
        use crate::models::HintStatus::*;
        let mut hints = vec![hint_with_status(1, 10, Answered, false)];
        assert_eq!(num_hints_used(&hints), 1);
        hints[0].status = Refunded.code();
        assert_eq!(num_hints_used(&hints), 0);
    }

    #[test]
    fn remaining_hints_may_go_negative() {
        use crate::models::HintStatus::*;
        let config = hunt_config();
        let mut team = team_created_at(config.start_time);
        team.total_hints_awarded = -5;
        let hints = vec![hint_with_status(1, 10, Answered, false)];
        let now = config.start_time + TimeDelta::hours(6);
        assert_eq!(num_hints_remaining(&config, &team, &hints, now), -5);
    }

    #[test]
    fn intro_hints_are_capped_and_mutually_exclusive() {
        use crate::models::HintStatus::*;
        let mut config = hunt_config();
        config.intro_hints = 2;
        let rounds = vec![round(1, "intro", 0), round(2, "main", 1)];
        let puzzles = vec![puzzle_in(10, 1, 0, "i-a"), puzzle_in(20, 2, 0, "m-a")];
        let catalog = Catalog::new(rounds, puzzles, "intro");
        let team = team_created_at(config.start_time);
        let now = config.start_time + TimeDelta::hours(24); // 4 hints accrued

        let hints = vec![hint_with_status(1, 10, Answered, false)];
        assert_eq!(num_intro_hints_used(&config, &hints, &catalog), 1);
        assert_eq!(
            num_intro_hints_remaining(&config, &team, &hints, &catalog, now),
            1
        );
        assert_eq!(
            num_nonintro_hints_remaining(&config, &team, &hints, &catalog, now),
            2
        );
    }

    #[test]
    fn one_open_hint_blocks_new_requests() {
        use crate::models::HintStatus::*;
        let config = hunt_config();
        let open = vec![hint_with_status(1, 10, NoResponse, false)];
        let answered = vec![hint_with_status(1, 10, Answered, false)];
        assert!(hint_request_blocked(&config, &open));
        assert!(!hint_request_blocked(&config, &answered));
    }

    #[test]
    fn guess_budget_counts_wrong_non_message_guesses() {
        let config = hunt_config();
        let puzzle = puzzle_in(10, 1, 0, "p");
        let submissions = vec![
            wrong_guess(10, "AAA"),
            wrong_guess(10, "BBB"),
            wrong_guess(10, "CCC"),
            wrong_guess(99, "DDD"), // other puzzle
        ];
        // Default cap 20, +5 extra grant, 3 wrong guesses.
        assert_eq!(guesses_remaining(&config, &puzzle, 5, &submissions), 22);
    }

    #[test]
    fn per_puzzle_cap_overrides_the_default() {
        let config = hunt_config();
        let mut puzzle = puzzle_in(10, 1, 0, "p");
        puzzle.max_guesses = Some(2);
        let submissions = vec![
            wrong_guess(10, "AAA"),
            wrong_guess(10, "BBB"),
            wrong_guess(10, "CCC"),
        ];
        assert_eq!(guesses_remaining(&config, &puzzle, 0, &submissions), -1);
    }
}
