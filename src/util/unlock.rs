use std::ops::DerefMut;

use chrono::{DateTime, TimeDelta, Utc};
use diesel_async::AsyncPgConnection;
use log::debug;
use serde::Serialize;

use crate::context::HuntContext;
use crate::events::DomainEvent;
use crate::models::{NewPuzzleUnlock, PuzzleId};

use super::catalog::Catalog;
use super::db_util::EngineError;
use super::progress::insert_unlocks_ignore_conflicts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unlocked {
    pub puzzle: PuzzleId,
    pub unlock_time: DateTime<Utc>,
}

pub struct UnlockOutcome {
    /// Every puzzle visible to this context, in catalog order, with the
    /// instant it became visible.
    pub unlocked: Vec<Unlocked>,
    /// Unlock rows discovered on this pass that have no stored counterpart.
    pub new_unlocks: Vec<NewPuzzleUnlock>,
    pub events: Vec<DomainEvent>,
}

/// Walk the catalog and decide, per puzzle, whether and when it unlocked for
/// this context. Pure: reads only the context and catalog, writes nothing.
///
/// Ordering matters twice. Solve counters are fixed for the whole pass (they
/// come from the snapshot), but the metas-solved list grows as metas are
/// passed, so a puzzle's global-rule eligibility can depend on a meta earlier
/// in catalog order. Stored unlock rows always win over freshly computed
/// candidates: an unlock timestamp is immutable once recorded.
pub fn compute_unlocks(ctx: &HuntContext<'_>, catalog: &Catalog) -> UnlockOutcome {
    let mut metas_solved: Vec<bool> = Vec::new();
    let mut unlocked = Vec::new();
    let mut new_unlocks = Vec::new();
    let mut events = Vec::new();

    let start_time = ctx.start_time();
    let full_reveal = ctx.hunt_is_prereleased() || ctx.hunt_is_over();

    for puzzle in catalog.puzzles() {
        let mut unlocked_at: Option<DateTime<Utc>> = None;

        let time_rule_applies = puzzle.unlock_hours >= 0
            && (puzzle.unlock_hours == 0
                || ctx
                    .team
                    .as_ref()
                    .is_none_or(|snapshot| snapshot.team.allow_time_unlocks));
        if time_rule_applies {
            let unlock_time = start_time + TimeDelta::hours(puzzle.unlock_hours.into());
            if unlock_time <= ctx.now {
                unlocked_at = Some(unlock_time);
            }
        }

        if full_reveal {
            // Prerelease testers and everyone after hunt end see the whole
            // catalog from the hunt start instant. No rows are recorded in
            // this mode and stored rows are not consulted.
            unlocked_at = Some(start_time);
        } else if let Some(snapshot) = &ctx.team {
            if puzzle.unlock_global >= 0
                && snapshot.global_solves >= puzzle.unlock_global
                && (snapshot.global_solves > 0 || metas_solved.iter().any(|&solved| solved))
            {
                unlocked_at = Some(ctx.now);
            }
            if puzzle.unlock_local >= 0
                && snapshot.local_solves_in(puzzle.round) >= puzzle.unlock_local
            {
                unlocked_at = Some(ctx.now);
            }
            if puzzle.is_meta {
                metas_solved.push(snapshot.has_solved(puzzle.id));
            }
            if let Some(stored) = snapshot.db_unlocks.get(&puzzle.id) {
                unlocked_at = Some(stored.unlock_time);
            } else if let Some(at) = unlocked_at {
                debug!(
                    "team {} unlocks puzzle {} at {}",
                    snapshot.team.id, puzzle.slug, at
                );
                new_unlocks.push(NewPuzzleUnlock {
                    team: snapshot.team.id,
                    puzzle: puzzle.id,
                    unlock_time: at,
                });
                if at == ctx.now {
                    events.push(DomainEvent::PuzzleUnlocked {
                        team: snapshot.team.id,
                        puzzle: puzzle.id,
                        unlock_time: at,
                    });
                }
            }
        }

        if let Some(at) = unlocked_at {
            unlocked.push(Unlocked {
                puzzle: puzzle.id,
                unlock_time: at,
            });
        }
    }

    UnlockOutcome {
        unlocked,
        new_unlocks,
        events,
    }
}

/// `compute_unlocks` plus the durable side: newly discovered rows are
/// bulk-inserted, ignoring conflicts, so a duplicate-key race between
/// concurrent requests never fails the surrounding call.
pub async fn compute_and_persist_unlocks<C>(
    ctx: &HuntContext<'_>,
    catalog: &Catalog,
    conn: &mut C,
) -> Result<UnlockOutcome, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    let outcome = compute_unlocks(ctx, catalog);
    insert_unlocks_ignore_conflicts(&outcome.new_unlocks, conn).await?;
    Ok(outcome)
}
