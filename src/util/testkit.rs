//! Fixture builders shared by the engine unit tests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::HuntConfig;
use crate::context::TeamSnapshot;
use crate::models::{
    AnswerSubmission, Hint, HintStatus, Puzzle, PuzzleId, Round, RoundId, Team, TeamId,
};
use crate::util::catalog::Catalog;

pub const TEST_TEAM: TeamId = 7;

pub fn hunt_config() -> HuntConfig {
    HuntConfig::standard(
        "2025-03-08T21:00:00Z".parse().unwrap(),
        "2025-03-17T00:00:00Z".parse().unwrap(),
        "2025-03-31T00:00:00Z".parse().unwrap(),
    )
}

pub fn team_created_at(creation_time: DateTime<Utc>) -> Team {
    Team {
        id: TEST_TEAM,
        name: "test team".to_owned(),
        creation_time,
        start_offset_seconds: 0,
        allow_time_unlocks: true,
        total_hints_awarded: 0,
        total_free_answers_awarded: 0,
        last_solve_time: None,
        is_prerelease_testsolver: false,
        is_hidden: false,
    }
}

pub fn round(id: RoundId, slug: &str, order: i32) -> Round {
    Round {
        id,
        name: slug.to_owned(),
        slug: slug.to_owned(),
        meta: None,
        order,
    }
}

pub fn puzzle_in(id: PuzzleId, round: RoundId, order: i32, slug: &str) -> Puzzle {
    Puzzle {
        id,
        name: slug.to_owned(),
        slug: slug.to_owned(),
        answer: "ANSWER".to_owned(),
        round,
        order,
        is_meta: false,
        unlock_hours: -1,
        unlock_global: -1,
        unlock_local: -1,
        max_guesses: None,
    }
}

/// Round 1 is the intro round, round 2 the main round.
pub fn catalog_with(puzzles: Vec<Puzzle>) -> Catalog {
    Catalog::new(
        vec![round(1, "intro", 0), round(2, "main", 1)],
        puzzles,
        "intro",
    )
}

pub fn solve(puzzle: PuzzleId, at: DateTime<Utc>) -> AnswerSubmission {
    AnswerSubmission {
        id: puzzle,
        team: TEST_TEAM,
        puzzle,
        submitted_answer: "ANSWER".to_owned(),
        is_correct: true,
        is_message: false,
        used_free_answer: false,
        submitted_time: at,
    }
}

pub fn wrong_guess(puzzle: PuzzleId, guess: &str) -> AnswerSubmission {
    AnswerSubmission {
        id: puzzle,
        team: TEST_TEAM,
        puzzle,
        submitted_answer: guess.to_owned(),
        is_correct: false,
        is_message: false,
        used_free_answer: false,
        submitted_time: "2025-03-09T00:00:00Z".parse().unwrap(),
    }
}

pub fn hint_with_status(id: i32, puzzle: PuzzleId, status: HintStatus, is_followup: bool) -> Hint {
    Hint {
        id,
        team: TEST_TEAM,
        puzzle,
        is_followup,
        question: "how?".to_owned(),
        status: status.code(),
        submitted_time: "2025-03-09T00:00:00Z".parse().unwrap(),
        claimed_time: None,
        answered_time: None,
        claimed_by: None,
    }
}

/// Snapshot for a zero-offset team created at hunt start, with no stored
/// unlocks or grants.
pub fn snapshot_for(
    config: &HuntConfig,
    catalog: &Catalog,
    submissions: Vec<AnswerSubmission>,
) -> TeamSnapshot {
    TeamSnapshot::assemble(
        team_created_at(config.start_time),
        submissions,
        vec![],
        HashMap::new(),
        HashMap::new(),
        catalog,
    )
    .expect("test fixtures are consistent")
}
