//! Tournament computation: ratings, levels, match generation, standings and
//! brackets. Everything here works on in-memory records and never touches the
//! database.

pub mod bracket;
pub mod levels;
pub mod rating;
pub mod schedule;
pub mod standings;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::tournament::{GameScore, Match, MatchStatus, Stage};

    pub fn completed(id: u32, player1: u32, player2: u32, score1: u32, score2: u32) -> Match {
        Match {
            id,
            tournament_id: 1,
            player1_id: player1,
            player2_id: player2,
            status: MatchStatus::Completed,
            round: 1,
            stage: Stage::League,
            group_name: None,
            bracket_position: None,
            best_of_three: false,
            score: Some(GameScore::new(score1, score2)),
            games: Vec::new(),
        }
    }

    pub fn best_of_three(id: u32, player1: u32, player2: u32, games: &[GameScore]) -> Match {
        Match {
            best_of_three: true,
            score: None,
            games: games.to_vec(),
            ..completed(id, player1, player2, 0, 0)
        }
    }
}
