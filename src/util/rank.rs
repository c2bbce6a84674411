use std::cmp::Reverse;
use std::ops::DerefMut;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Integer, Nullable, Text, Timestamptz};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::config::HuntConfig;
use crate::models::TeamId;

use super::db_util::{log_server_error, EngineError, ERROR_DB_UNKNOWN};

/// One team's aggregated standing. A qualifying solve is correct, not a free
/// answer, and strictly before hunt end.
#[derive(Serialize, QueryableByName, Clone)]
pub struct LeaderboardRow {
    #[diesel(sql_type = Integer)]
    pub team_id: TeamId,
    #[diesel(sql_type = Text)]
    pub team_name: String,
    #[diesel(sql_type = BigInt)]
    pub total_solves: i64,
    #[diesel(sql_type = Timestamptz)]
    pub last_solve_or_creation_time: DateTime<Utc>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub finish_time: Option<DateTime<Utc>>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub milestone_time: Option<DateTime<Utc>>,
}

/// Sort rows into leaderboard order: finishing-meta solve time (unsolved
/// last), then the secondary milestone the same way, then solve count
/// descending, then most recent qualifying activity. The input arrives
/// ordered by team id, so fully tied teams keep a deterministic order under
/// the stable sort.
pub fn rank_leaderboard(rows: &mut [LeaderboardRow]) {
    rows.sort_by_key(|row| {
        (
            row.finish_time.is_none(),
            row.finish_time,
            row.milestone_time.is_none(),
            row.milestone_time,
            Reverse(row.total_solves),
            row.last_solve_or_creation_time,
        )
    });
}

/// 1-indexed position of a team in already-ranked rows.
pub fn team_rank(rows: &[LeaderboardRow], team_id: TeamId) -> Option<usize> {
    rows.iter()
        .position(|row| row.team_id == team_id)
        .map(|i| i + 1)
}

/// Aggregate every visible team's qualifying solves and sort them into
/// leaderboard order. Hidden teams are excluded unless `show_hidden` (or the
/// hidden team is the viewer itself).
pub async fn fetch_leaderboard<C>(
    config: &HuntConfig,
    viewer: Option<TeamId>,
    show_hidden: bool,
    conn: &mut C,
) -> Result<Vec<LeaderboardRow>, EngineError>
where
    C: DerefMut<Target = AsyncPgConnection> + Send,
{
    let query = diesel::sql_query(
        r#"
        SELECT
            t.id AS team_id,
            t.name AS team_name,
            COALESCE(COUNT(s.id), 0) AS total_solves,
            COALESCE(t.last_solve_time, t.creation_time) AS last_solve_or_creation_time,
            MIN(CASE WHEN p.slug = $2 THEN s.submitted_time END) AS finish_time,
            MIN(CASE WHEN p.slug = $3 THEN s.submitted_time END) AS milestone_time
        FROM team AS t
        LEFT JOIN answer_submission AS s
            ON s.team = t.id
            AND s.is_correct
            AND NOT s.used_free_answer
            AND s.submitted_time < $1
        LEFT JOIN puzzle AS p
            ON p.id = s.puzzle
        WHERE t.creation_time < $1
          AND (NOT t.is_hidden OR t.id = $4 OR $5)
        GROUP BY t.id
        ORDER BY t.id;
    "#,
    )
    .bind::<Timestamptz, _>(config.end_time)
    .bind::<Text, _>(&config.meta_meta_slug)
    .bind::<Text, _>(config.secondary_milestone_slug.as_deref().unwrap_or(""))
    .bind::<Integer, _>(viewer.unwrap_or(-1))
    .bind::<Bool, _>(show_hidden);

    let mut rows: Vec<LeaderboardRow> = query
        .load(conn)
        .await
        .map_err(|e| log_server_error(e, "rank", ERROR_DB_UNKNOWN))?;

    rank_leaderboard(&mut rows);
    Ok(rows)
}
