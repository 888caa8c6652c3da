use chrono::Utc;
use sqlx::{Sqlite, SqliteExecutor, Transaction, prelude::FromRow};

use crate::{models::tournament::Format, payloads::NewTournament};

pub const STATUS_REGISTRATION: &str = "registration";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_COMPLETED: &str = "completed";

pub async fn create_tournament(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: u32,
    format: Format,
    payload: &NewTournament,
) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "insert into tournaments
            (created_by, name, format, rounds, group_count, advance_count, seeded, status, start_date, updated_at)
            values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(user_id)
    .bind(payload.name.trim())
    .bind(format.to_string())
    .bind(payload.rounds.unwrap_or(1))
    .bind(payload.group_count)
    .bind(payload.advance_count)
    .bind(payload.seeded.unwrap_or(true))
    .bind(STATUS_REGISTRATION)
    .bind(payload.start_date)
    .bind(Utc::now().timestamp())
    .execute(tx.as_mut())
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn mark_tournament_updated(
    tournament_id: u32,
    tx: &mut Transaction<'_, Sqlite>,
) -> sqlx::Result<()> {
    let now = Utc::now();
    let _ = sqlx::query("update tournaments set updated_at = ? where id = ?")
        .bind(now.timestamp())
        .bind(tournament_id)
        .execute(tx.as_mut())
        .await?;
    Ok(())
}

pub async fn set_status(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
    status: &str,
) -> sqlx::Result<()> {
    sqlx::query("update tournaments set status = ?1, updated_at = ?2 where id = ?3")
        .bind(status)
        .bind(Utc::now().timestamp())
        .bind(tournament_id)
        .execute(tx.as_mut())
        .await?;
    Ok(())
}

#[derive(Debug, FromRow)]
pub struct DbTournament {
    pub id: u32,
    pub name: String,
    pub format: String,
    pub rounds: u32,
    pub group_count: Option<u32>,
    pub advance_count: Option<u32>,
    pub seeded: bool,
    pub status: String,
    pub start_date: Option<i64>,
    pub updated_at: i64,
}

pub async fn list_tournaments(pool: &sqlx::SqlitePool) -> sqlx::Result<Vec<DbTournament>> {
    sqlx::query_as(
        "select id, name, format, rounds, group_count, advance_count, seeded, status, start_date, updated_at
        from tournaments
        order by updated_at desc, id desc",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_tournament(executor: impl SqliteExecutor<'_>, id: u32) -> sqlx::Result<DbTournament> {
    sqlx::query_as(
        "select id, name, format, rounds, group_count, advance_count, seeded, status, start_date, updated_at
        from tournaments
        where id = ?1",
    )
    .bind(id)
    .fetch_one(executor)
    .await
}
