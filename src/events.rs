use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{HintId, HintStatus, PuzzleId, TeamId};

/// Facts produced by engine operations. Mutating operations return these
/// instead of firing side effects from inside the persistence path; a
/// notification dispatcher (out of scope here) consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DomainEvent {
    PuzzleUnlocked {
        team: TeamId,
        puzzle: PuzzleId,
        unlock_time: DateTime<Utc>,
    },
    SubmissionRecorded {
        team: TeamId,
        puzzle: PuzzleId,
        is_correct: bool,
        is_message: bool,
        used_free_answer: bool,
    },
    HintStatusChanged {
        hint: HintId,
        team: TeamId,
        puzzle: PuzzleId,
        status: HintStatus,
    },
}
