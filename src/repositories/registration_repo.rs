use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, SqliteExecutor, Transaction, prelude::FromRow};

pub async fn create_registration(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
    player_id: u32,
) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "insert into registrations (tournament_id, player_id, paid, created_at) values (?1, ?2, 0, ?3)",
    )
    .bind(tournament_id)
    .bind(player_id)
    .bind(Utc::now().timestamp())
    .execute(tx.as_mut())
    .await?;
    Ok(result.last_insert_rowid())
}

/// Returns `false` when the player is not registered for the tournament.
pub async fn confirm_payment(
    pool: &sqlx::SqlitePool,
    tournament_id: u32,
    player_id: u32,
) -> sqlx::Result<bool> {
    let result =
        sqlx::query("update registrations set paid = 1 where tournament_id = ?1 and player_id = ?2")
            .bind(tournament_id)
            .bind(player_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn set_group(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
    player_id: u32,
    group_name: &str,
) -> sqlx::Result<()> {
    sqlx::query("update registrations set group_name = ?1 where tournament_id = ?2 and player_id = ?3")
        .bind(group_name)
        .bind(tournament_id)
        .bind(player_id)
        .execute(tx.as_mut())
        .await?;
    Ok(())
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbRegistration {
    pub id: u32,
    pub player_id: u32,
    pub name: String,
    pub rating: i32,
    pub level: u8,
    pub group_name: Option<String>,
    pub paid: bool,
}

/// Registrations in the order players signed up.
pub async fn select_registrations(
    executor: impl SqliteExecutor<'_>,
    tournament_id: u32,
) -> sqlx::Result<Vec<DbRegistration>> {
    sqlx::query_as(
        "select
            r.id,
            r.player_id,
            p.name,
            p.rating,
            p.level,
            r.group_name,
            r.paid
        from registrations r
        inner join players p on r.player_id = p.id
        where r.tournament_id = ?1
        order by r.id asc",
    )
    .bind(tournament_id)
    .fetch_all(executor)
    .await
}
