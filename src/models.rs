use chrono::{DateTime, TimeDelta, Utc};
use diesel::prelude::*;
use serde::Serialize;

pub type TeamId = i32;
pub type PuzzleId = i32;
pub type RoundId = i32;
pub type HintId = i32;

#[derive(Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::round)]
pub struct Round {
    pub id: RoundId,
    pub name: String,
    pub slug: String,
    pub meta: Option<PuzzleId>,
    pub order: i32,
}

#[derive(Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::puzzle)]
pub struct Puzzle {
    pub id: PuzzleId,
    pub name: String,
    pub slug: String,
    pub answer: String,
    pub round: RoundId,
    pub order: i32,
    pub is_meta: bool,
    pub unlock_hours: i32,
    pub unlock_global: i32,
    pub unlock_local: i32,
    pub max_guesses: Option<i32>,
}

impl Puzzle {
    pub fn normalized_answer(&self) -> String {
        crate::util::answer::normalize_answer(&self.answer)
    }
}

#[derive(Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::team)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub creation_time: DateTime<Utc>,
    pub start_offset_seconds: i64,
    pub allow_time_unlocks: bool,
    pub total_hints_awarded: i32,
    pub total_free_answers_awarded: i32,
    pub last_solve_time: Option<DateTime<Utc>>,
    pub is_prerelease_testsolver: bool,
    pub is_hidden: bool,
}

impl Team {
    /// Positive offsets start the team earlier than the official hunt start.
    pub fn start_offset(&self) -> TimeDelta {
        TimeDelta::seconds(self.start_offset_seconds)
    }
}

#[derive(Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::answer_submission)]
pub struct AnswerSubmission {
    pub id: i32,
    pub team: TeamId,
    pub puzzle: PuzzleId,
    pub submitted_answer: String,
    pub is_correct: bool,
    pub is_message: bool,
    pub used_free_answer: bool,
    pub submitted_time: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::answer_submission)]
pub struct NewAnswerSubmission<'a> {
    pub team: TeamId,
    pub puzzle: PuzzleId,
    pub submitted_answer: &'a str,
    pub is_correct: bool,
    pub is_message: bool,
    pub used_free_answer: bool,
    pub submitted_time: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::puzzle_unlock)]
pub struct PuzzleUnlock {
    pub id: i32,
    pub team: TeamId,
    pub puzzle: PuzzleId,
    pub unlock_time: DateTime<Utc>,
    pub view_time: Option<DateTime<Utc>>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = crate::schema::puzzle_unlock)]
pub struct NewPuzzleUnlock {
    pub team: TeamId,
    pub puzzle: PuzzleId,
    pub unlock_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HintStatus {
    NoResponse,
    Answered,
    Refunded,
    Obsolete,
}

impl HintStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => HintStatus::Answered,
            2 => HintStatus::Refunded,
            3 => HintStatus::Obsolete,
            _ => HintStatus::NoResponse,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            HintStatus::NoResponse => 0,
            HintStatus::Answered => 1,
            HintStatus::Refunded => 2,
            HintStatus::Obsolete => 3,
        }
    }
}

#[derive(Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::hint)]
pub struct Hint {
    pub id: HintId,
    pub team: TeamId,
    pub puzzle: PuzzleId,
    pub is_followup: bool,
    pub question: String,
    pub status: i32,
    pub submitted_time: DateTime<Utc>,
    pub claimed_time: Option<DateTime<Utc>>,
    pub answered_time: Option<DateTime<Utc>>,
    pub claimed_by: Option<i32>,
}

impl Hint {
    pub fn status(&self) -> HintStatus {
        HintStatus::from_code(self.status)
    }

    /// Refunded and obsolete hints give the budget unit back; followups never
    /// took one in the first place.
    pub fn consumes_hint(&self) -> bool {
        !matches!(self.status(), HintStatus::Refunded | HintStatus::Obsolete) && !self.is_followup
    }
}

#[derive(Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::extra_guess_grant)]
pub struct ExtraGuessGrant {
    pub id: i32,
    pub team: TeamId,
    pub puzzle: PuzzleId,
    pub extra_guesses: i32,
}
