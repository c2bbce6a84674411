use std::collections::HashMap;
use std::ops::DerefMut;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::models::{Puzzle, PuzzleId, Round, RoundId};

use super::db_util::{log_server_error, EngineError, ERROR_DB_UNKNOWN};

/// Immutable snapshot of the hunt structure, in the stable total order the
/// unlock engine iterates in: rounds by their ordering key, puzzles by
/// (round order, puzzle order). Loaded once per request.
pub struct Catalog {
    rounds: Vec<Round>,
    puzzles: Vec<Puzzle>,
    round_index: HashMap<RoundId, usize>,
    puzzle_index: HashMap<PuzzleId, usize>,
    intro_round: Option<RoundId>,
}

impl Catalog {
    pub fn new(mut rounds: Vec<Round>, mut puzzles: Vec<Puzzle>, intro_round_slug: &str) -> Self {
        rounds.sort_by_key(|r| (r.order, r.id));
        let round_index: HashMap<RoundId, usize> = rounds
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
        // Puzzles in an unknown round sort last; they stay reachable by id so
        // the inconsistency surfaces at lookup time instead of vanishing.
        puzzles.sort_by_key(|p| {
            (
                round_index.get(&p.round).copied().unwrap_or(usize::MAX),
                p.order,
                p.id,
            )
        });
        let puzzle_index = puzzles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        let intro_round = rounds
            .iter()
            .find(|r| r.slug == intro_round_slug)
            .map(|r| r.id);
        Self {
            rounds,
            puzzles,
            round_index,
            puzzle_index,
            intro_round,
        }
    }

    pub async fn load<C>(intro_round_slug: &str, conn: &mut C) -> Result<Self, EngineError>
    where
        C: DerefMut<Target = AsyncPgConnection> + Send,
    {
        use crate::schema::puzzle::dsl as puzzle_dsl;
        use crate::schema::round::dsl as round_dsl;

        let rounds = round_dsl::round
            .select(Round::as_select())
            .load::<Round>(conn)
            .await
            .map_err(|e| log_server_error(e, "catalog", ERROR_DB_UNKNOWN))?;

        let puzzles = puzzle_dsl::puzzle
            .select(Puzzle::as_select())
            .load::<Puzzle>(conn)
            .await
            .map_err(|e| log_server_error(e, "catalog", ERROR_DB_UNKNOWN))?;

        Ok(Self::new(rounds, puzzles, intro_round_slug))
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    pub fn puzzle(&self, id: PuzzleId) -> Option<&Puzzle> {
        self.puzzle_index.get(&id).map(|&i| &self.puzzles[i])
    }

    pub fn puzzle_by_slug(&self, slug: &str) -> Option<&Puzzle> {
        self.puzzles.iter().find(|p| p.slug == slug)
    }

    /// Slug resolution for caller-supplied identifiers; a miss is the
    /// caller's fault, not a data inconsistency.
    pub fn require_puzzle_by_slug(&self, slug: &str) -> Result<&Puzzle, EngineError> {
        self.puzzle_by_slug(slug).ok_or(EngineError::UnknownPuzzle)
    }

    pub fn round_of(&self, puzzle: &Puzzle) -> Option<&Round> {
        self.round_index.get(&puzzle.round).map(|&i| &self.rounds[i])
    }

    pub fn is_intro(&self, puzzle: &Puzzle) -> bool {
        self.intro_round == Some(puzzle.round)
    }
}
