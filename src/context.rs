use std::collections::HashMap;
use std::ops::DerefMut;

use chrono::{DateTime, TimeDelta, Utc};
use diesel_async::AsyncPgConnection;

use crate::config::HuntConfig;
use crate::models::{
    AnswerSubmission, Hint, Puzzle, PuzzleId, PuzzleUnlock, RoundId, Team, TeamId,
};
use crate::util::budget;
use crate::util::catalog::Catalog;
use crate::util::db_util::EngineError;
use crate::util::progress;

/// Everything the engines need to know about one team, fetched eagerly at
/// request start. Derived fields (solve map, main-round solve counters) are
/// computed here once instead of being lazily cached per attribute.
pub struct TeamSnapshot {
    pub team: Team,
    /// Ascending by submission time.
    pub submissions: Vec<AnswerSubmission>,
    pub hints: Vec<Hint>,
    pub extra_guesses: HashMap<PuzzleId, i32>,
    pub db_unlocks: HashMap<PuzzleId, PuzzleUnlock>,
    /// First correct submission time per solved puzzle.
    pub solves: HashMap<PuzzleId, DateTime<Utc>>,
    /// Solves that are neither metas nor in the intro round.
    pub global_solves: i32,
    /// Non-meta solves per round (intro included).
    pub local_solves: HashMap<RoundId, i32>,
}

impl TeamSnapshot {
    pub fn assemble(
        team: Team,
        submissions: Vec<AnswerSubmission>,
        hints: Vec<Hint>,
        extra_guesses: HashMap<PuzzleId, i32>,
        db_unlocks: HashMap<PuzzleId, PuzzleUnlock>,
        catalog: &Catalog,
    ) -> Result<Self, EngineError> {
        let mut solves = HashMap::new();
        for submission in &submissions {
            if submission.is_correct {
                solves
                    .entry(submission.puzzle)
                    .or_insert(submission.submitted_time);
            }
        }

        let mut global_solves = 0;
        let mut local_solves: HashMap<RoundId, i32> = HashMap::new();
        for &puzzle_id in solves.keys() {
            let puzzle = catalog
                .puzzle(puzzle_id)
                .ok_or(EngineError::DanglingReference { puzzle: puzzle_id })?;
            if puzzle.is_meta {
                continue;
            }
            *local_solves.entry(puzzle.round).or_insert(0) += 1;
            if !catalog.is_intro(puzzle) {
                global_solves += 1;
            }
        }

        Ok(Self {
            team,
            submissions,
            hints,
            extra_guesses,
            db_unlocks,
            solves,
            global_solves,
            local_solves,
        })
    }

    pub async fn load<C>(
        team_id: TeamId,
        catalog: &Catalog,
        conn: &mut C,
    ) -> Result<Option<Self>, EngineError>
    where
        C: DerefMut<Target = AsyncPgConnection> + Send,
    {
        let Some(team) = progress::fetch_team(team_id, conn).await? else {
            return Ok(None);
        };
        let submissions = progress::fetch_submissions(team_id, conn).await?;
        let hints = progress::fetch_hints(team_id, conn).await?;
        let extra_guesses = progress::fetch_extra_guess_grants(team_id, conn).await?;
        let db_unlocks = progress::fetch_unlocks(team_id, conn).await?;
        Self::assemble(team, submissions, hints, extra_guesses, db_unlocks, catalog).map(Some)
    }

    pub fn has_solved(&self, puzzle: PuzzleId) -> bool {
        self.solves.contains_key(&puzzle)
    }

    pub fn local_solves_in(&self, round: RoundId) -> i32 {
        self.local_solves.get(&round).copied().unwrap_or(0)
    }

    pub fn num_extra_guesses(&self, puzzle: PuzzleId) -> i32 {
        self.extra_guesses.get(&puzzle).copied().unwrap_or(0)
    }
}

/// Request-scoped view of the hunt: validated config, the caller-supplied
/// clock, and optionally a team. Constructed once per request and passed by
/// reference to every engine call; nothing in here is cached globally.
pub struct HuntContext<'a> {
    pub config: &'a HuntConfig,
    pub now: DateTime<Utc>,
    pub team: Option<TeamSnapshot>,
}

impl<'a> HuntContext<'a> {
    pub fn new(config: &'a HuntConfig, now: DateTime<Utc>, team: Option<TeamSnapshot>) -> Self {
        Self { config, now, team }
    }

    pub fn anonymous(config: &'a HuntConfig, now: DateTime<Utc>) -> Self {
        Self::new(config, now, None)
    }

    pub async fn for_team<C>(
        config: &'a HuntConfig,
        team_id: TeamId,
        catalog: &Catalog,
        now: DateTime<Utc>,
        conn: &mut C,
    ) -> Result<Self, EngineError>
    where
        C: DerefMut<Target = AsyncPgConnection> + Send,
    {
        let snapshot = TeamSnapshot::load(team_id, catalog, conn)
            .await?
            .ok_or(EngineError::UnknownTeam)?;
        Ok(Self::new(config, now, Some(snapshot)))
    }

    /// Hunt start as this team experiences it; their start offset moves it
    /// earlier.
    pub fn start_time(&self) -> DateTime<Utc> {
        match &self.team {
            Some(snapshot) => self.config.start_time - snapshot.team.start_offset(),
            None => self.config.start_time,
        }
    }

    pub fn time_since_start(&self) -> TimeDelta {
        self.now - self.start_time()
    }

    pub fn hunt_is_prereleased(&self) -> bool {
        self.team
            .as_ref()
            .is_some_and(|snapshot| snapshot.team.is_prerelease_testsolver)
    }

    pub fn hunt_has_started(&self) -> bool {
        self.hunt_is_prereleased() || self.now >= self.start_time()
    }

    pub fn hunt_is_over(&self) -> bool {
        self.now >= self.config.end_time
    }

    pub fn hunt_is_closed(&self) -> bool {
        self.now >= self.config.close_time
    }

    pub fn has_finished_hunt(&self, catalog: &Catalog) -> bool {
        let Some(snapshot) = &self.team else {
            return false;
        };
        catalog
            .puzzle_by_slug(&self.config.meta_meta_slug)
            .is_some_and(|meta| snapshot.has_solved(meta.id))
    }

    pub fn num_hints_remaining(&self) -> i32 {
        match &self.team {
            Some(snapshot) => budget::num_hints_remaining(
                self.config,
                &snapshot.team,
                &snapshot.hints,
                self.now,
            ),
            None => 0,
        }
    }

    pub fn num_intro_hints_remaining(&self, catalog: &Catalog) -> i32 {
        match &self.team {
            Some(snapshot) => budget::num_intro_hints_remaining(
                self.config,
                &snapshot.team,
                &snapshot.hints,
                catalog,
                self.now,
            ),
            None => 0,
        }
    }

    pub fn num_free_answers_remaining(&self) -> i32 {
        match &self.team {
            Some(snapshot) => budget::num_free_answers_remaining(
                self.config,
                &snapshot.team,
                &snapshot.submissions,
                self.now,
            ),
            None => 0,
        }
    }

    pub fn guesses_remaining(&self, puzzle: &Puzzle) -> Option<i32> {
        self.team.as_ref().map(|snapshot| {
            budget::guesses_remaining(
                self.config,
                puzzle,
                snapshot.num_extra_guesses(puzzle.id),
                &snapshot.submissions,
            )
        })
    }
}
