use crate::{
    engine::{bracket::ADVANCEMENT_BONUS, rating::Ledger},
    errors::AppError,
    models::{player::Player, tournament::Match},
    notifier::{Event, Notifier},
    payloads::NewPlayer,
    repositories::{bracket_repo, match_repo, player_repo},
};

pub async fn create_player(pool: &sqlx::SqlitePool, payload: NewPlayer) -> Result<i64, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::EmptyPlayerName);
    }
    let id = player_repo::create_player(pool, name).await?;
    tracing::info!("player {} created: {}", id, name);
    Ok(id)
}

pub async fn list_players(pool: &sqlx::SqlitePool) -> Result<Vec<Player>, AppError> {
    Ok(player_repo::list_players(pool)
        .await?
        .into_iter()
        .map(Player::from)
        .collect())
}

pub async fn get_player(pool: &sqlx::SqlitePool, id: u32) -> Result<Player, AppError> {
    match player_repo::get_player(pool, id).await? {
        Some(player) => Ok(player.into()),
        None => Err(AppError::PlayerNotFound(id)),
    }
}

/// Rebuilds every player's rating, level and tallies from scratch: starting
/// values, then all completed matches in the order they were created, then
/// the advancement bonuses already paid. Writes each player once.
pub async fn recalculate_all(
    pool: &sqlx::SqlitePool,
    notifier: &Notifier,
) -> Result<Vec<Player>, AppError> {
    let mut tx = pool.begin().await?;
    let fresh: Vec<Player> = player_repo::list_players(tx.as_mut())
        .await?
        .into_iter()
        .map(|p| Player::new(p.id, p.name))
        .collect();
    let mut ledger = Ledger::new(fresh);
    ledger.reclassify();
    let matches = match_repo::list_completed_matches(tx.as_mut()).await?;
    let mut rated = 0;
    for m in matches {
        if ledger.apply_match(&Match::try_from(m)?).is_some() {
            rated += 1;
        }
    }
    for (tournament_id, player_id) in bracket_repo::list_awarded_bonuses(tx.as_mut()).await? {
        if !ledger.award(player_id, ADVANCEMENT_BONUS) {
            tracing::warn!(
                "advancement bonus of tournament {} references unknown player {}",
                tournament_id,
                player_id
            );
        }
    }
    ledger.reclassify();
    let players = ledger.into_players();
    for player in players.iter() {
        player_repo::update_player_stats(&mut tx, player).await?;
    }
    tx.commit().await?;
    tracing::info!(
        "recalculated {} players from {} rated matches",
        players.len(),
        rated
    );
    notifier.notify(Event::StatsRecalculated {
        players: players.len(),
    });
    Ok(players)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        engine::rating::DEFAULT_RATING,
        models::tournament::GameScore,
        payloads::{CloseRegistration, MatchResult},
        services::{match_service, tournament_service},
    };

    fn win_for_player1() -> MatchResult {
        MatchResult {
            player1_score: Some(3),
            player2_score: Some(1),
            games: Vec::new(),
        }
    }

    #[sqlx::test]
    async fn test_create_player_rejects_blank_name(pool: sqlx::SqlitePool) {
        let err = create_player(
            &pool,
            NewPlayer {
                name: "   ".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::EmptyPlayerName));
        let id = create_player(
            &pool,
            NewPlayer {
                name: " Mima Ito ".to_string(),
            },
        )
        .await
        .unwrap();
        let player = get_player(&pool, id as u32).await.unwrap();
        assert_eq!(player.name, "Mima Ito");
        assert_eq!(player.rating, DEFAULT_RATING);
        assert!(matches!(
            get_player(&pool, 77).await,
            Err(AppError::PlayerNotFound(77))
        ));
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("create_players")))]
    async fn test_recalculate_without_matches_resets(pool: sqlx::SqlitePool) {
        let players = recalculate_all(&pool, &Notifier::disabled()).await.unwrap();
        assert_eq!(players.len(), 10);
        assert!(players.iter().all(|p| p.rating == DEFAULT_RATING));
        // identical ratings all share the lowest percentile
        assert!(players.iter().all(|p| p.level == 1));
        assert!(players.iter().all(|p| p.wins == 0 && p.losses == 0));
    }

    #[sqlx::test(fixtures(
        path = "../../fixtures",
        scripts("create_players", "create_tournament", "register_players")
    ))]
    async fn test_recalculate_is_idempotent(pool: sqlx::SqlitePool) {
        tournament_service::close_registration(&pool, 2, CloseRegistration::default())
            .await
            .unwrap();
        let details = tournament_service::read_tournament(&pool, 2).await.unwrap();
        let notifier = Notifier::disabled();
        for m in details.matches.iter().take(4) {
            match_service::record_result(&pool, &notifier, m.id, win_for_player1())
                .await
                .unwrap();
        }
        let first = recalculate_all(&pool, &notifier).await.unwrap();
        let second = recalculate_all(&pool, &notifier).await.unwrap();
        assert_eq!(first, second);
        let wins: u32 = first.iter().map(|p| p.wins).sum();
        let losses: u32 = first.iter().map(|p| p.losses).sum();
        assert_eq!((wins, losses), (4, 4));
        // only players 1..4 took part, the rest stay at the starting rating
        assert!(first.iter().filter(|p| p.id > 4).all(|p| p.rating == DEFAULT_RATING));
        let stored = list_players(&pool).await.unwrap();
        assert_eq!(stored.len(), 10);
    }

    #[sqlx::test(fixtures(
        path = "../../fixtures",
        scripts("create_players", "create_tournament", "register_players")
    ))]
    async fn test_recalculate_pays_advancement_bonus_once(pool: sqlx::SqlitePool) {
        // odd ids in Group A, even ids in Group B
        let assignments: HashMap<u32, u32> = (1..=8).map(|p| (p, (p + 1) % 2)).collect();
        tournament_service::close_registration(
            &pool,
            3,
            CloseRegistration {
                group_assignments: Some(assignments),
            },
        )
        .await
        .unwrap();
        let details = tournament_service::read_tournament(&pool, 3).await.unwrap();
        let mut tx = pool.begin().await.unwrap();
        for m in details.matches.iter() {
            // lower id wins every group match
            let score = if m.player1_id < m.player2_id {
                GameScore::new(3, 1)
            } else {
                GameScore::new(1, 3)
            };
            match_repo::record_scores(&mut tx, m.id, Some(score), &[])
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();
        let notifier = Notifier::disabled();
        let created = tournament_service::advance_to_knockout(&pool, &notifier, 3)
            .await
            .unwrap();
        assert_eq!(created.bonuses, created.players);
        assert_eq!(created.players.len(), 4);

        let first = recalculate_all(&pool, &notifier).await.unwrap();
        let second = recalculate_all(&pool, &notifier).await.unwrap();
        assert_eq!(first, second);

        // the same replay without any bonus
        let mut baseline = Ledger::new(first.iter().map(|p| Player::new(p.id, p.name.clone())));
        for m in match_repo::list_completed_matches(&pool).await.unwrap() {
            baseline.apply_match(&Match::try_from(m).unwrap());
        }
        let baseline = baseline.into_players();
        assert_eq!(baseline.len(), first.len());
        for (player, base) in first.iter().zip(baseline.iter()) {
            let bonus = if created.players.contains(&player.id) {
                ADVANCEMENT_BONUS
            } else {
                0
            };
            assert_eq!(player.rating, base.rating + bonus, "player {}", player.id);
            assert_eq!((player.wins, player.losses), (base.wins, base.losses));
        }
        let stored = get_player(&pool, 1).await.unwrap();
        assert_eq!(stored.rating, first[0].rating);
        assert_eq!(bracket_repo::list_awarded_bonuses(&pool).await.unwrap().len(), 4);
    }
}
