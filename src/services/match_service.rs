use std::collections::HashMap;

use serde::Serialize;
use sqlx::{Sqlite, Transaction};

use crate::{
    engine::{
        bracket::Winners,
        rating::{Ledger, RatingUpdate},
    },
    errors::AppError,
    models::{
        player::Player,
        tournament::{Format, GameScore, Match, MatchStatus, Side, Stage},
    },
    notifier::{Event, Notifier},
    payloads::MatchResult,
    repositories::{
        bracket_repo, match_repo, player_repo,
        tournament_repo::{self, STATUS_COMPLETED},
    },
    services::tournament_service::load_tournament,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedResult {
    #[serde(rename = "match")]
    pub recorded: Match,
    pub rating: Option<RatingUpdate>,
    /// Knockout matches whose players changed because of this result.
    pub filled: Vec<u32>,
    pub tournament_completed: bool,
}

async fn load_match(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: u32,
) -> Result<Match, AppError> {
    match match_repo::get_match(executor, id).await? {
        Some(m) => Match::try_from(m),
        None => Err(AppError::MatchNotFound(id)),
    }
}

pub async fn get_match(pool: &sqlx::SqlitePool, id: u32) -> Result<Match, AppError> {
    load_match(pool, id).await
}

/// Real players of the match; a side still held by the placeholder means the
/// match cannot be played yet.
async fn ensure_ready(tx: &mut Transaction<'_, Sqlite>, m: &Match) -> Result<(), AppError> {
    for player_id in [m.player1_id, m.player2_id] {
        if player_repo::get_player(tx.as_mut(), player_id).await?.is_none() {
            return Err(AppError::MatchNotReady(m.id));
        }
    }
    Ok(())
}

pub async fn start_match(pool: &sqlx::SqlitePool, id: u32) -> Result<Match, AppError> {
    let mut tx = pool.begin().await?;
    let mut m = load_match(tx.as_mut(), id).await?;
    ensure_ready(&mut tx, &m).await?;
    m.status = m.status.transition(MatchStatus::InProgress)?;
    match_repo::update_status(&mut tx, id, m.status).await?;
    tournament_repo::mark_tournament_updated(m.tournament_id, &mut tx).await?;
    tx.commit().await?;
    Ok(m)
}

pub async fn cancel_match(
    pool: &sqlx::SqlitePool,
    notifier: &Notifier,
    id: u32,
) -> Result<Match, AppError> {
    let mut tx = pool.begin().await?;
    let mut m = load_match(tx.as_mut(), id).await?;
    m.status = m.status.transition(MatchStatus::Cancelled)?;
    match_repo::update_status(&mut tx, id, m.status).await?;
    let completed = complete_tournament_if_done(&mut tx, m.tournament_id).await?;
    tournament_repo::mark_tournament_updated(m.tournament_id, &mut tx).await?;
    tx.commit().await?;
    if completed {
        notifier.notify(Event::TournamentCompleted {
            tournament_id: m.tournament_id,
        });
    }
    Ok(m)
}

/// Checks a best-of-three game list: two or three decisive games, played
/// only until one side has two wins.
fn validate_games(games: &[GameScore]) -> Result<(), AppError> {
    if games.len() < 2 || games.len() > 3 {
        return Err(AppError::InvalidScore(format!(
            "a best-of-three match needs 2 or 3 games, got {}",
            games.len()
        )));
    }
    let (mut wins1, mut wins2) = (0, 0);
    for (index, game) in games.iter().enumerate() {
        if wins1 == 2 || wins2 == 2 {
            return Err(AppError::InvalidScore(format!(
                "game {} was played after the match was decided",
                index + 1
            )));
        }
        match game.winner() {
            Some(Side::Player1) => wins1 += 1,
            Some(Side::Player2) => wins2 += 1,
            None => {
                return Err(AppError::InvalidScore(format!(
                    "game {} ended in a tie",
                    index + 1
                )));
            }
        }
    }
    if wins1 < 2 && wins2 < 2 {
        return Err(AppError::InvalidScore(
            "neither player won two games".to_string(),
        ));
    }
    Ok(())
}

/// Score and games to store for `m`.
fn parse_result(
    m: &Match,
    payload: &MatchResult,
) -> Result<(Option<GameScore>, Vec<GameScore>), AppError> {
    let games: Vec<GameScore> = payload
        .games
        .iter()
        .map(|g| GameScore::new(g.player1, g.player2))
        .collect();
    let score = GameScore::from_columns(payload.player1_score, payload.player2_score);
    if !games.is_empty() {
        if !m.best_of_three {
            return Err(AppError::InvalidScore(
                "game scores are only recorded for best-of-three matches".to_string(),
            ));
        }
        validate_games(&games)?;
        return Ok((None, games));
    }
    let Some(score) = score else {
        return Err(AppError::InvalidScore(
            "both player scores or a list of games are required".to_string(),
        ));
    };
    if score.is_tie() && m.stage == Stage::Knockout {
        return Err(AppError::InvalidScore(
            "knockout matches need a winner".to_string(),
        ));
    }
    Ok((Some(score), games))
}

/// Records the result, updates ratings and levels of the whole population
/// and moves the winner into the next knockout match, all in one
/// transaction.
pub async fn record_result(
    pool: &sqlx::SqlitePool,
    notifier: &Notifier,
    id: u32,
    payload: MatchResult,
) -> Result<RecordedResult, AppError> {
    let mut tx = pool.begin().await?;
    let mut m = load_match(tx.as_mut(), id).await?;
    ensure_ready(&mut tx, &m).await?;
    let current = match m.status {
        MatchStatus::Scheduled | MatchStatus::Pending => {
            m.status.transition(MatchStatus::InProgress)?
        }
        other => other,
    };
    let (score, games) = parse_result(&m, &payload)?;
    m.status = current.transition(MatchStatus::Completed)?;
    m.score = score;
    m.games = games;
    match_repo::record_scores(&mut tx, id, m.score, &m.games).await?;

    let population: Vec<Player> = player_repo::list_players(tx.as_mut())
        .await?
        .into_iter()
        .map(Player::from)
        .collect();
    let before: HashMap<u32, Player> = population.iter().map(|p| (p.id, p.clone())).collect();
    let mut ledger = Ledger::new(population);
    let rating = ledger.apply_match(&m);
    for player in ledger.into_players() {
        if before.get(&player.id).is_none_or(|old| !old.same_stats(&player)) {
            player_repo::update_player_stats(&mut tx, &player).await?;
        }
    }
    if let Some(update) = rating.as_ref() {
        tracing::debug!(
            "match {}: player1 {:+}, player2 {:+}, bonus {}",
            id,
            update.player1_delta,
            update.player2_delta,
            update.bonus
        );
    }

    let filled = if m.stage == Stage::Knockout {
        advance_bracket(&mut tx, m.tournament_id).await?
    } else {
        Vec::new()
    };
    let tournament_completed = complete_tournament_if_done(&mut tx, m.tournament_id).await?;
    tournament_repo::mark_tournament_updated(m.tournament_id, &mut tx).await?;
    tx.commit().await?;

    if tournament_completed {
        tracing::info!("tournament {} completed", m.tournament_id);
        notifier.notify(Event::TournamentCompleted {
            tournament_id: m.tournament_id,
        });
    }
    Ok(RecordedResult {
        recorded: m,
        rating,
        filled,
        tournament_completed,
    })
}

/// Writes every knockout winner known so far into the placeholder sides of
/// the following round. Returns the ids of the matches that changed.
async fn advance_bracket(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
) -> Result<Vec<u32>, AppError> {
    let Some(bracket) = bracket_repo::load_bracket(tx.as_mut(), tournament_id).await? else {
        return Ok(Vec::new());
    };
    let matches: Vec<Match> = match_repo::list_stage_matches(tx.as_mut(), tournament_id, Stage::Knockout)
        .await?
        .into_iter()
        .map(Match::try_from)
        .collect::<Result<Vec<_>, AppError>>()?;
    let winners: Winners = matches
        .iter()
        .filter_map(|m| Some(((m.round, m.bracket_position?), m.winner_id()?)))
        .collect();
    let mut filled = Vec::new();
    for spec in bracket.resolve(&winners) {
        let Some(existing) = matches
            .iter()
            .find(|m| m.round == spec.round && m.bracket_position == spec.bracket_position)
        else {
            continue;
        };
        if existing.status.is_terminal() {
            continue;
        }
        let player1 = spec.player1.player().unwrap_or(existing.player1_id);
        let player2 = spec.player2.player().unwrap_or(existing.player2_id);
        if (player1, player2) != (existing.player1_id, existing.player2_id) {
            match_repo::set_players(tx, existing.id, player1, player2).await?;
            tracing::debug!(
                "knockout match {} (round {}) now {} vs {}",
                existing.id,
                existing.round,
                player1,
                player2
            );
            filled.push(existing.id);
        }
    }
    Ok(filled)
}

async fn complete_tournament_if_done(
    tx: &mut Transaction<'_, Sqlite>,
    tournament_id: u32,
) -> Result<bool, AppError> {
    if match_repo::count_open_matches(tx, tournament_id).await? > 0 {
        return Ok(false);
    }
    // a finished group stage still has its knockout ahead
    let tournament = load_tournament(tx.as_mut(), tournament_id).await?;
    if tournament.format == Format::GroupsKnockout
        && bracket_repo::load_bracket(tx.as_mut(), tournament_id).await?.is_none()
    {
        return Ok(false);
    }
    tournament_repo::set_status(tx, tournament_id, STATUS_COMPLETED).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        payloads::{CloseRegistration, GameResultPayload},
        repositories::tournament_repo::get_tournament,
        services::tournament_service::{close_registration, read_tournament},
    };

    fn score(player1: u32, player2: u32) -> MatchResult {
        MatchResult {
            player1_score: Some(player1),
            player2_score: Some(player2),
            games: Vec::new(),
        }
    }

    fn games(scores: &[(u32, u32)]) -> MatchResult {
        MatchResult {
            player1_score: None,
            player2_score: None,
            games: scores
                .iter()
                .map(|(p1, p2)| GameResultPayload {
                    player1: *p1,
                    player2: *p2,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_games() {
        assert!(validate_games(&[GameScore::new(11, 5), GameScore::new(11, 9)]).is_ok());
        assert!(
            validate_games(&[
                GameScore::new(11, 5),
                GameScore::new(8, 11),
                GameScore::new(11, 9)
            ])
            .is_ok()
        );
        assert!(validate_games(&[GameScore::new(11, 5)]).is_err());
        assert!(validate_games(&[GameScore::new(11, 5), GameScore::new(5, 11)]).is_err());
        assert!(validate_games(&[GameScore::new(11, 11), GameScore::new(11, 5)]).is_err());
        assert!(
            validate_games(&[
                GameScore::new(11, 5),
                GameScore::new(11, 9),
                GameScore::new(3, 11)
            ])
            .is_err()
        );
    }

    #[sqlx::test(fixtures(
        path = "../../fixtures",
        scripts("create_players", "create_tournament", "register_players")
    ))]
    async fn test_league_result_updates_ratings(pool: sqlx::SqlitePool) {
        close_registration(&pool, 2, CloseRegistration::default())
            .await
            .unwrap();
        let details = read_tournament(&pool, 2).await.unwrap();
        // lowest rated player beats the strongest one
        let upset = details
            .matches
            .iter()
            .find(|m| m.involves(1) && m.involves(4))
            .unwrap();
        let result = if upset.player1_id == 4 { score(3, 1) } else { score(1, 3) };
        let notifier = Notifier::disabled();
        let recorded = record_result(&pool, &notifier, upset.id, result).await.unwrap();
        assert_eq!(recorded.recorded.status, MatchStatus::Completed);
        assert_eq!(recorded.recorded.winner_id(), Some(4));
        let update = recorded.rating.unwrap();
        assert_eq!(update.player1_delta, -update.player2_delta);
        // level 5 loser pays a bonus to the level 4 winner
        assert_eq!(update.bonus, 10);

        let winner = player_repo::get_player(&pool, 4).await.unwrap().unwrap();
        let loser = player_repo::get_player(&pool, 1).await.unwrap().unwrap();
        assert!(winner.rating > 1150 + 10);
        assert!(loser.rating < 1400);
        assert_eq!((winner.wins, winner.losses), (1, 0));
        assert_eq!((loser.wins, loser.losses), (0, 1));

        assert!(matches!(
            record_result(&pool, &notifier, upset.id, score(3, 0)).await,
            Err(AppError::InvalidStatusTransition { .. })
        ));
        let unchanged = player_repo::get_player(&pool, 4).await.unwrap().unwrap();
        assert_eq!(unchanged.rating, winner.rating);
    }

    #[sqlx::test(fixtures(
        path = "../../fixtures",
        scripts("create_players", "create_tournament", "register_players")
    ))]
    async fn test_knockout_winner_fills_next_round(pool: sqlx::SqlitePool) {
        close_registration(&pool, 1, CloseRegistration::default())
            .await
            .unwrap();
        let details = read_tournament(&pool, 1).await.unwrap();
        let opening = details.matches.iter().find(|m| m.round == 1).unwrap();
        let waiting = details
            .matches
            .iter()
            .find(|m| m.round == 2 && m.status == MatchStatus::Pending && m.bracket_position == Some(0))
            .unwrap();
        let notifier = Notifier::disabled();
        assert!(matches!(
            record_result(&pool, &notifier, waiting.id, score(3, 1)).await,
            Err(AppError::MatchNotReady(_))
        ));
        assert!(matches!(
            record_result(&pool, &notifier, opening.id, score(2, 2)).await,
            Err(AppError::InvalidScore(_))
        ));

        let recorded = record_result(&pool, &notifier, opening.id, score(3, 2))
            .await
            .unwrap();
        assert_eq!(recorded.filled, vec![waiting.id]);
        let next = get_match(&pool, waiting.id).await.unwrap();
        assert!(next.involves(opening.player1_id));
        assert!(!recorded.tournament_completed);
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("create_players", "create_tournament")))]
    async fn test_final_completes_tournament(pool: sqlx::SqlitePool) {
        crate::services::tournament_service::register_player(&pool, 1, 1)
            .await
            .unwrap();
        crate::services::tournament_service::register_player(&pool, 1, 2)
            .await
            .unwrap();
        let schedule = close_registration(&pool, 1, CloseRegistration::default())
            .await
            .unwrap();
        assert_eq!(schedule.matches.len(), 1);
        let final_match = read_tournament(&pool, 1).await.unwrap().matches.remove(0);
        assert!(final_match.best_of_three);

        let notifier = Notifier::disabled();
        // a single score is accepted for best-of-three matches too
        let recorded = record_result(&pool, &notifier, final_match.id, score(3, 1))
            .await
            .unwrap();
        assert!(recorded.tournament_completed);
        assert!(recorded.filled.is_empty());
        let tournament = get_tournament(&pool, 1).await.unwrap();
        assert_eq!(tournament.status, STATUS_COMPLETED);
    }

    #[sqlx::test(fixtures(
        path = "../../fixtures",
        scripts("create_players", "create_tournament", "register_players")
    ))]
    async fn test_best_of_three_games(pool: sqlx::SqlitePool) {
        close_registration(&pool, 1, CloseRegistration::default())
            .await
            .unwrap();
        let details = read_tournament(&pool, 1).await.unwrap();
        let opening = details.matches.iter().find(|m| m.round == 1).unwrap();
        let notifier = Notifier::disabled();
        // five entrants: the opening match is not best of three
        assert!(matches!(
            record_result(&pool, &notifier, opening.id, games(&[(11, 4), (11, 6)])).await,
            Err(AppError::InvalidScore(_))
        ));
        start_match(&pool, opening.id).await.unwrap();
        record_result(&pool, &notifier, opening.id, score(3, 0))
            .await
            .unwrap();

        let semi = read_tournament(&pool, 1)
            .await
            .unwrap()
            .matches
            .into_iter()
            .find(|m| m.round == 2 && m.bracket_position == Some(0))
            .unwrap();
        assert!(semi.best_of_three);
        let recorded = record_result(&pool, &notifier, semi.id, games(&[(11, 4), (9, 11), (11, 7)]))
            .await
            .unwrap();
        assert_eq!(recorded.recorded.games.len(), 3);
        assert_eq!(recorded.recorded.winner_id(), Some(semi.player1_id));
    }

    #[sqlx::test(fixtures(
        path = "../../fixtures",
        scripts("create_players", "create_tournament", "register_players")
    ))]
    async fn test_cancel_rules(pool: sqlx::SqlitePool) {
        close_registration(&pool, 2, CloseRegistration::default())
            .await
            .unwrap();
        let first = read_tournament(&pool, 2).await.unwrap().matches.remove(0);
        let notifier = Notifier::disabled();
        let started = start_match(&pool, first.id).await.unwrap();
        assert_eq!(started.status, MatchStatus::InProgress);
        let cancelled = cancel_match(&pool, &notifier, first.id).await.unwrap();
        assert_eq!(cancelled.status, MatchStatus::Cancelled);
        assert!(matches!(
            start_match(&pool, first.id).await,
            Err(AppError::InvalidStatusTransition { .. })
        ));
        assert!(matches!(
            get_match(&pool, 999).await,
            Err(AppError::MatchNotFound(999))
        ));
    }
}
