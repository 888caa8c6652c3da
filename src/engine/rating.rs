use std::collections::HashMap;

use serde::Serialize;

use crate::{
    engine::levels,
    models::{
        player::Player,
        tournament::{Match, Side},
    },
};

pub const DEFAULT_RATING: i32 = 1000;
/// K-factor for a match decided by a single score.
pub const K_MATCH: f64 = 32.0;
/// K-factor for each game inside a best-of-three match.
pub const K_GAME: f64 = 16.0;

/// Probability that a player rated `rating` beats one rated `opponent`.
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) as f64 / 400.0))
}

/// Symmetric Elo deltas for both players; always sums to zero.
pub fn elo_deltas(rating1: i32, rating2: i32, player1_won: bool, k: f64) -> (i32, i32) {
    let actual = if player1_won { 1.0 } else { 0.0 };
    let delta = (k * (actual - expected_score(rating1, rating2))).round() as i32;
    (delta, -delta)
}

/// Flat bonus for beating an opponent on a higher level, keyed by the
/// opponent's level.
pub fn level_bonus(opponent_level: u8) -> i32 {
    match opponent_level {
        5 => 10,
        4 => 7,
        3 => 5,
        2 => 3,
        1 => 1,
        _ => 0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdate {
    pub match_id: u32,
    pub winner_id: u32,
    pub loser_id: u32,
    /// Elo change of player1, summed over every counted game.
    pub player1_delta: i32,
    /// Elo change of player2; always `-player1_delta`.
    pub player2_delta: i32,
    /// Level bonus paid to the winner on top of the Elo change.
    pub bonus: i32,
}

/// Computes the rating update for a completed match without applying it.
///
/// Best-of-three matches are rated game by game at [`K_GAME`], each game
/// starting from the ratings left by the previous one; single-score matches
/// are rated once at [`K_MATCH`]. Returns `None` when the match is not
/// completed or its score does not decide a winner.
pub fn rate_match(m: &Match, player1: &Player, player2: &Player) -> Option<RatingUpdate> {
    let winner = m.winner_side()?;
    let mut rating1 = player1.rating;
    let mut rating2 = player2.rating;
    if m.best_of_three && !m.games.is_empty() {
        for game in m.games.iter() {
            let Some(game_winner) = game.winner() else {
                continue;
            };
            let (d1, d2) = elo_deltas(rating1, rating2, game_winner == Side::Player1, K_GAME);
            rating1 += d1;
            rating2 += d2;
        }
    } else {
        let (d1, d2) = elo_deltas(rating1, rating2, winner == Side::Player1, K_MATCH);
        rating1 += d1;
        rating2 += d2;
    }
    let (winner_player, loser_player) = match winner {
        Side::Player1 => (player1, player2),
        Side::Player2 => (player2, player1),
    };
    let bonus = if loser_player.level > winner_player.level {
        level_bonus(loser_player.level)
    } else {
        0
    };
    Some(RatingUpdate {
        match_id: m.id,
        winner_id: winner_player.id,
        loser_id: loser_player.id,
        player1_delta: rating1 - player1.rating,
        player2_delta: rating2 - player2.rating,
        bonus,
    })
}

/// In-memory view of the whole player population while results are folded in.
#[derive(Debug, Default)]
pub struct Ledger {
    players: HashMap<u32, Player>,
}

impl Ledger {
    pub fn new(players: impl IntoIterator<Item = Player>) -> Self {
        Self {
            players: players.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    #[cfg(test)]
    pub fn get(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Applies one completed match: ratings, win/loss tallies and a full
    /// level reclassification. Undecided matches and matches with unknown
    /// players are skipped.
    pub fn apply_match(&mut self, m: &Match) -> Option<RatingUpdate> {
        let (Some(player1), Some(player2)) =
            (self.players.get(&m.player1_id), self.players.get(&m.player2_id))
        else {
            tracing::debug!("match {} references an unknown player, skipping", m.id);
            return None;
        };
        let update = rate_match(m, player1, player2)?;
        if let Some(p1) = self.players.get_mut(&m.player1_id) {
            p1.rating += update.player1_delta;
        }
        if let Some(p2) = self.players.get_mut(&m.player2_id) {
            p2.rating += update.player2_delta;
        }
        if let Some(winner) = self.players.get_mut(&update.winner_id) {
            winner.rating += update.bonus;
            winner.wins += 1;
        }
        if let Some(loser) = self.players.get_mut(&update.loser_id) {
            loser.losses += 1;
        }
        self.reclassify();
        Some(update)
    }

    /// Adds a flat amount outside of any match, e.g. the advancement bonus.
    pub fn award(&mut self, player_id: u32, amount: i32) -> bool {
        match self.players.get_mut(&player_id) {
            Some(player) => {
                player.rating += amount;
                true
            }
            None => false,
        }
    }

    pub fn reclassify(&mut self) {
        levels::reclassify(self.players.values_mut());
    }

    pub fn into_players(self) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.into_values().collect();
        players.sort_by_key(|p| p.id);
        players
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{best_of_three, completed};
    use crate::models::tournament::GameScore;

    #[test]
    fn test_equal_ratings_player1_wins() {
        assert_eq!(expected_score(1000, 1000), 0.5);
        assert_eq!(elo_deltas(1000, 1000, true, K_MATCH), (16, -16));
    }

    #[test]
    fn test_deltas_are_zero_sum() {
        for (r1, r2) in [(1000, 1400), (1750, 900), (1200, 1201), (800, 2400)] {
            for won in [true, false] {
                for k in [K_MATCH, K_GAME] {
                    let (d1, d2) = elo_deltas(r1, r2, won, k);
                    assert_eq!(d1 + d2, 0);
                }
            }
        }
    }

    #[test]
    fn test_upset_gains_more() {
        let (underdog, _) = elo_deltas(1000, 1400, true, K_MATCH);
        let (favourite, _) = elo_deltas(1400, 1000, true, K_MATCH);
        assert!(underdog > favourite);
        assert_eq!(underdog, 29);
        assert_eq!(favourite, 3);
    }

    #[test]
    fn test_level_bonus_table() {
        assert_eq!(level_bonus(5), 10);
        assert_eq!(level_bonus(4), 7);
        assert_eq!(level_bonus(3), 5);
        assert_eq!(level_bonus(2), 3);
        assert_eq!(level_bonus(1), 1);
        assert_eq!(level_bonus(0), 0);
        assert_eq!(level_bonus(6), 0);
    }

    #[test]
    fn test_bonus_only_against_higher_level() {
        let m = completed(1, 1, 2, 3, 1);
        let low = Player::new(1, "Low").with_level(2);
        let high = Player::new(2, "High").with_level(4);
        let update = rate_match(&m, &low, &high).unwrap();
        assert_eq!(update.winner_id, 1);
        assert_eq!(update.bonus, 7);
        assert_eq!(update.player1_delta, 16);
        assert_eq!(update.player2_delta, -16);

        let m = completed(2, 2, 1, 3, 0);
        let update = rate_match(&m, &high, &low).unwrap();
        assert_eq!(update.winner_id, 2);
        assert_eq!(update.bonus, 0);
    }

    #[test]
    fn test_best_of_three_rates_each_game() {
        let m = best_of_three(
            1,
            1,
            2,
            &[
                GameScore::new(11, 8),
                GameScore::new(6, 11),
                GameScore::new(11, 9),
            ],
        );
        let p1 = Player::new(1, "A");
        let p2 = Player::new(2, "B");
        let update = rate_match(&m, &p1, &p2).unwrap();
        // 1000/1000 wins +8, 1008/992 loses -8, 1000/1000 wins +8
        assert_eq!(update.player1_delta, 8);
        assert_eq!(update.player2_delta, -8);
        assert_eq!(update.winner_id, 1);
    }

    #[test]
    fn test_malformed_score_is_skipped() {
        let mut m = completed(1, 1, 2, 2, 2);
        let p1 = Player::new(1, "A");
        let p2 = Player::new(2, "B");
        assert!(rate_match(&m, &p1, &p2).is_none());
        m.score = None;
        assert!(rate_match(&m, &p1, &p2).is_none());
    }

    #[test]
    fn test_ledger_tallies_once_per_match() {
        let mut ledger = Ledger::new([Player::new(1, "A"), Player::new(2, "B")]);
        let m = best_of_three(
            1,
            1,
            2,
            &[GameScore::new(11, 3), GameScore::new(11, 5)],
        );
        let update = ledger.apply_match(&m).unwrap();
        assert_eq!(update.winner_id, 1);
        let a = ledger.get(1).unwrap();
        let b = ledger.get(2).unwrap();
        assert_eq!((a.wins, a.losses), (1, 0));
        assert_eq!((b.wins, b.losses), (0, 1));
        assert_eq!(a.rating + b.rating, 2 * DEFAULT_RATING + update.bonus);
        assert!(a.level >= b.level);
    }

    #[test]
    fn test_ledger_skips_unknown_players() {
        let mut ledger = Ledger::new([Player::new(1, "A")]);
        let m = completed(1, 1, 99, 3, 0);
        assert!(ledger.apply_match(&m).is_none());
        assert_eq!(ledger.get(1).unwrap().rating, DEFAULT_RATING);
    }
}
