use chrono::Utc;
use sqlx::{Sqlite, SqliteExecutor, Transaction, prelude::FromRow};

use crate::{
    engine::schedule::Schedule,
    models::tournament::{GameScore, MatchStatus, Stage},
    repositories::{player_repo, tournament_repo::mark_tournament_updated},
};

#[derive(Debug, FromRow)]
pub struct DbMatch {
    pub id: u32,
    pub tournament_id: u32,
    pub player1_id: u32,
    pub player2_id: u32,
    pub status: String,
    pub round: u32,
    pub stage: String,
    pub group_name: Option<String>,
    pub bracket_position: Option<u32>,
    pub best_of_three: bool,
    pub player1_score: Option<u32>,
    pub player2_score: Option<u32>,
    pub game1_player1: Option<u32>,
    pub game1_player2: Option<u32>,
    pub game2_player1: Option<u32>,
    pub game2_player2: Option<u32>,
    pub game3_player1: Option<u32>,
    pub game3_player2: Option<u32>,
}

const MATCH_COLUMNS: &str = "id, tournament_id, player1_id, player2_id, status, round, stage,
    group_name, bracket_position, best_of_three, player1_score, player2_score,
    game1_player1, game1_player2, game2_player1, game2_player2, game3_player1, game3_player2";

/// Writes every generated match. Undecided sides point at the placeholder
/// player. Returns the number of inserted rows.
pub async fn insert_schedule(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
    schedule: &Schedule,
) -> sqlx::Result<usize> {
    let needs_placeholder = schedule
        .matches
        .iter()
        .any(|m| m.player1.player().is_none() || m.player2.player().is_none());
    let tbd = if needs_placeholder {
        Some(player_repo::tbd_player_id(tx).await?)
    } else {
        None
    };
    let now = Utc::now().timestamp();
    for spec in schedule.matches.iter() {
        sqlx::query(
            "insert into matches
                (tournament_id, player1_id, player2_id, status, round, stage, group_name, bracket_position, best_of_three, updated_at)
                values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(tournament_id)
        .bind(spec.player1.player().or(tbd))
        .bind(spec.player2.player().or(tbd))
        .bind(spec.status.to_string())
        .bind(spec.round)
        .bind(spec.stage.to_string())
        .bind(&spec.group_name)
        .bind(spec.bracket_position)
        .bind(spec.best_of_three)
        .bind(now)
        .execute(tx.as_mut())
        .await?;
    }
    if !schedule.matches.is_empty() {
        mark_tournament_updated(tournament_id, tx).await?;
    }
    Ok(schedule.matches.len())
}

pub async fn get_match(executor: impl SqliteExecutor<'_>, id: u32) -> sqlx::Result<Option<DbMatch>> {
    sqlx::query_as(&format!("select {MATCH_COLUMNS} from matches where id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_matches(
    executor: impl SqliteExecutor<'_>,
    tournament_id: u32,
) -> sqlx::Result<Vec<DbMatch>> {
    sqlx::query_as(&format!(
        "select {MATCH_COLUMNS} from matches where tournament_id = ?1 order by round asc, id asc"
    ))
    .bind(tournament_id)
    .fetch_all(executor)
    .await
}

pub async fn list_stage_matches(
    executor: impl SqliteExecutor<'_>,
    tournament_id: u32,
    stage: Stage,
) -> sqlx::Result<Vec<DbMatch>> {
    sqlx::query_as(&format!(
        "select {MATCH_COLUMNS} from matches
        where tournament_id = ?1 and stage = ?2
        order by round asc, id asc"
    ))
    .bind(tournament_id)
    .bind(stage.to_string())
    .fetch_all(executor)
    .await
}

/// Every completed match across all tournaments in the order it was created.
pub async fn list_completed_matches(executor: impl SqliteExecutor<'_>) -> sqlx::Result<Vec<DbMatch>> {
    sqlx::query_as(&format!(
        "select {MATCH_COLUMNS} from matches where status = ?1 order by id asc"
    ))
    .bind(MatchStatus::Completed.to_string())
    .fetch_all(executor)
    .await
}

/// Matches of the tournament that are neither completed nor cancelled.
pub async fn count_open_matches(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
) -> sqlx::Result<u32> {
    let (open,): (u32,) = sqlx::query_as(
        "select count(*) from matches where tournament_id = ?1 and status not in (?2, ?3)",
    )
    .bind(tournament_id)
    .bind(MatchStatus::Completed.to_string())
    .bind(MatchStatus::Cancelled.to_string())
    .fetch_one(tx.as_mut())
    .await?;
    Ok(open)
}

pub async fn update_status(
    tx: &mut Transaction<'_, Sqlite>,
    id: u32,
    status: MatchStatus,
) -> sqlx::Result<()> {
    sqlx::query("update matches set status = ?1, updated_at = ?2 where id = ?3")
        .bind(status.to_string())
        .bind(Utc::now().timestamp())
        .bind(id)
        .execute(tx.as_mut())
        .await?;
    Ok(())
}

/// Stores the final score and the individual games (up to three) and marks
/// the match completed.
pub async fn record_scores(
    tx: &mut Transaction<'_, Sqlite>,
    id: u32,
    score: Option<GameScore>,
    games: &[GameScore],
) -> sqlx::Result<()> {
    let game = |i: usize| games.get(i).copied();
    sqlx::query(
        "update matches set
            status = ?1,
            player1_score = ?2,
            player2_score = ?3,
            game1_player1 = ?4,
            game1_player2 = ?5,
            game2_player1 = ?6,
            game2_player2 = ?7,
            game3_player1 = ?8,
            game3_player2 = ?9,
            updated_at = ?10
        where id = ?11",
    )
    .bind(MatchStatus::Completed.to_string())
    .bind(score.map(|s| s.player1))
    .bind(score.map(|s| s.player2))
    .bind(game(0).map(|g| g.player1))
    .bind(game(0).map(|g| g.player2))
    .bind(game(1).map(|g| g.player1))
    .bind(game(1).map(|g| g.player2))
    .bind(game(2).map(|g| g.player1))
    .bind(game(2).map(|g| g.player2))
    .bind(Utc::now().timestamp())
    .bind(id)
    .execute(tx.as_mut())
    .await?;
    Ok(())
}

pub async fn set_players(
    tx: &mut Transaction<'_, Sqlite>,
    id: u32,
    player1_id: u32,
    player2_id: u32,
) -> sqlx::Result<()> {
    sqlx::query("update matches set player1_id = ?1, player2_id = ?2, updated_at = ?3 where id = ?4")
        .bind(player1_id)
        .bind(player2_id)
        .bind(Utc::now().timestamp())
        .bind(id)
        .execute(tx.as_mut())
        .await?;
    Ok(())
}
