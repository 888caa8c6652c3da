use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, SqliteExecutor, Transaction, prelude::FromRow};

use crate::models::player::Player;

/// Name of the sentinel row that stands in for an undecided bracket slot.
pub const TBD_PLAYER_NAME: &str = "TBD";

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbPlayer {
    pub id: u32,
    pub name: String,
    pub rating: i32,
    pub level: u8,
    pub wins: u32,
    pub losses: u32,
    pub updated_at: i64,
}

pub async fn create_player(pool: &sqlx::SqlitePool, name: &str) -> sqlx::Result<i64> {
    let now = Utc::now().timestamp();
    let result = sqlx::query(
        "insert into players (name, created_at, updated_at) values (?1, ?2, ?3)",
    )
    .bind(name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_player(executor: impl SqliteExecutor<'_>, id: u32) -> sqlx::Result<Option<DbPlayer>> {
    sqlx::query_as(
        "select id, name, rating, level, wins, losses, updated_at
        from players
        where id = ?1 and is_placeholder = 0",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Real players, strongest first. The placeholder row is never listed.
pub async fn list_players(executor: impl SqliteExecutor<'_>) -> sqlx::Result<Vec<DbPlayer>> {
    sqlx::query_as(
        "select id, name, rating, level, wins, losses, updated_at
        from players
        where is_placeholder = 0
        order by rating desc, id asc",
    )
    .fetch_all(executor)
    .await
}

/// Id of the placeholder player, inserting it on first use.
pub async fn tbd_player_id(tx: &mut Transaction<'_, Sqlite>) -> sqlx::Result<u32> {
    let existing: Option<(u32,)> =
        sqlx::query_as("select id from players where is_placeholder = 1 order by id limit 1")
            .fetch_optional(tx.as_mut())
            .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }
    let now = Utc::now().timestamp();
    let result = sqlx::query(
        "insert into players (name, is_placeholder, created_at, updated_at) values (?1, 1, ?2, ?3)",
    )
    .bind(TBD_PLAYER_NAME)
    .bind(now)
    .bind(now)
    .execute(tx.as_mut())
    .await?;
    tracing::debug!("created placeholder player {}", result.last_insert_rowid());
    Ok(result.last_insert_rowid() as u32)
}

pub async fn update_player_stats(
    tx: &mut Transaction<'_, Sqlite>,
    player: &Player,
) -> sqlx::Result<()> {
    sqlx::query(
        "update players set
            rating = ?1,
            level = ?2,
            wins = ?3,
            losses = ?4,
            updated_at = ?5
        where id = ?6",
    )
    .bind(player.rating)
    .bind(player.level)
    .bind(player.wins)
    .bind(player.losses)
    .bind(Utc::now().timestamp())
    .bind(player.id)
    .execute(tx.as_mut())
    .await?;
    Ok(())
}
