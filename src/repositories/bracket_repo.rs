use chrono::Utc;
use sqlx::{Sqlite, SqliteExecutor, Transaction};

use crate::engine::bracket::Bracket;

pub async fn save_bracket(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
    bracket: &Bracket,
) -> sqlx::Result<()> {
    for (slot, player_id) in bracket.slots().iter().enumerate() {
        sqlx::query("insert into bracket_slots (tournament_id, slot, player_id) values (?1, ?2, ?3)")
            .bind(tournament_id)
            .bind(slot as u32)
            .bind(*player_id)
            .execute(tx.as_mut())
            .await?;
    }
    Ok(())
}

/// `None` when the tournament has no knockout bracket yet.
pub async fn load_bracket(
    executor: impl SqliteExecutor<'_>,
    tournament_id: u32,
) -> sqlx::Result<Option<Bracket>> {
    let rows: Vec<(u32, Option<u32>)> = sqlx::query_as(
        "select slot, player_id from bracket_slots where tournament_id = ?1 order by slot asc",
    )
    .bind(tournament_id)
    .fetch_all(executor)
    .await?;
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(Bracket::from_slots(
        rows.into_iter().map(|(_, player)| player).collect(),
    )))
}

/// Records that `player_id` advanced out of the group stage. Returns `true`
/// only the first time, which is when the advancement bonus is due.
pub async fn record_advancement(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
    player_id: u32,
) -> sqlx::Result<bool> {
    sqlx::query(
        "insert or ignore into advancements (tournament_id, player_id, bonus_awarded, created_at)
            values (?1, ?2, 0, ?3)",
    )
    .bind(tournament_id)
    .bind(player_id)
    .bind(Utc::now().timestamp())
    .execute(tx.as_mut())
    .await?;
    let result = sqlx::query(
        "update advancements set bonus_awarded = 1
        where tournament_id = ?1 and player_id = ?2 and bonus_awarded = 0",
    )
    .bind(tournament_id)
    .bind(player_id)
    .execute(tx.as_mut())
    .await?;
    Ok(result.rows_affected() == 1)
}

/// `(tournament_id, player_id)` of every bonus paid so far.
pub async fn list_awarded_bonuses(
    executor: impl SqliteExecutor<'_>,
) -> sqlx::Result<Vec<(u32, u32)>> {
    sqlx::query_as(
        "select tournament_id, player_id from advancements
        where bonus_awarded = 1
        order by created_at asc, tournament_id asc, player_id asc",
    )
    .fetch_all(executor)
    .await
}
