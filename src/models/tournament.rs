use std::fmt::Display;

use serde::Serialize;

use crate::{
    errors::AppError,
    repositories::{match_repo::DbMatch, tournament_repo::DbTournament},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Knockout,
    League,
    GroupsKnockout,
}

impl TryFrom<&str> for Format {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "knockout" => Ok(Self::Knockout),
            "league" => Ok(Self::League),
            "groups_knockout" => Ok(Self::GroupsKnockout),
            _ => Err(AppError::InvalidFormat(value.to_owned())),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Knockout => write!(f, "knockout"),
            Format::League => write!(f, "league"),
            Format::GroupsKnockout => write!(f, "groups_knockout"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Group,
    Knockout,
    League,
}

impl Stage {
    pub fn from_str<S: AsRef<str>>(str: S) -> Self {
        match str.as_ref().trim() {
            "group" => Self::Group,
            "league" => Self::League,
            _ => Self::Knockout,
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Group => write!(f, "group"),
            Stage::Knockout => write!(f, "knockout"),
            Stage::League => write!(f, "league"),
        }
    }
}

/// Lifecycle of a single match.
///
/// `scheduled`/`pending` -> `in_progress` -> `completed`, with `cancelled`
/// reachable from `scheduled` and `in_progress`. Both `completed` and
/// `cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
    Pending,
    Cancelled,
}

impl MatchStatus {
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Scheduled, MatchStatus::InProgress)
                | (MatchStatus::Pending, MatchStatus::InProgress)
                | (MatchStatus::InProgress, MatchStatus::Completed)
                | (MatchStatus::Scheduled, MatchStatus::Cancelled)
                | (MatchStatus::InProgress, MatchStatus::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }

    pub fn transition(self, next: MatchStatus) -> Result<MatchStatus, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidStatusTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl TryFrom<&str> for MatchStatus {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::InvalidMatchStatus(value.to_owned())),
        }
    }
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::InProgress => write!(f, "in_progress"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Player1,
    Player2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameScore {
    pub player1: u32,
    pub player2: u32,
}

impl GameScore {
    pub fn new(player1: u32, player2: u32) -> Self {
        Self { player1, player2 }
    }

    pub fn from_columns(player1: Option<u32>, player2: Option<u32>) -> Option<Self> {
        match (player1, player2) {
            (Some(p1), Some(p2)) => Some(Self::new(p1, p2)),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        if self.player1 > self.player2 {
            Some(Side::Player1)
        } else if self.player2 > self.player1 {
            Some(Side::Player2)
        } else {
            None
        }
    }

    pub fn is_tie(&self) -> bool {
        self.player1 == self.player2
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: u32,
    pub tournament_id: u32,
    pub player1_id: u32,
    pub player2_id: u32,
    pub status: MatchStatus,
    pub round: u32,
    pub stage: Stage,
    pub group_name: Option<String>,
    pub bracket_position: Option<u32>,
    pub best_of_three: bool,
    pub score: Option<GameScore>,
    pub games: Vec<GameScore>,
}

impl Match {
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn involves(&self, player_id: u32) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    /// Match-level score. Best-of-three matches without an explicit score
    /// fall back to the number of games each side won.
    pub fn match_score(&self) -> Option<GameScore> {
        if self.score.is_some() || self.games.is_empty() {
            return self.score;
        }
        let (p1, p2) = self
            .games
            .iter()
            .fold((0, 0), |(p1, p2), game| match game.winner() {
                Some(Side::Player1) => (p1 + 1, p2),
                Some(Side::Player2) => (p1, p2 + 1),
                None => (p1, p2),
            });
        Some(GameScore::new(p1, p2))
    }

    /// Winning side of a completed match; `None` while undecided or tied.
    pub fn winner_side(&self) -> Option<Side> {
        if !self.is_completed() {
            return None;
        }
        self.match_score().and_then(|score| score.winner())
    }

    pub fn winner_id(&self) -> Option<u32> {
        self.winner_side().map(|side| self.player_id(side))
    }

    #[cfg(test)]
    pub fn loser_id(&self) -> Option<u32> {
        self.winner_side().map(|side| match side {
            Side::Player1 => self.player2_id,
            Side::Player2 => self.player1_id,
        })
    }

    pub fn player_id(&self, side: Side) -> u32 {
        match side {
            Side::Player1 => self.player1_id,
            Side::Player2 => self.player2_id,
        }
    }

    /// Points scored by `player_id` and by the opponent, from that player's view.
    pub fn points_for(&self, player_id: u32) -> Option<(u32, u32)> {
        let score = self.match_score()?;
        if player_id == self.player1_id {
            Some((score.player1, score.player2))
        } else if player_id == self.player2_id {
            Some((score.player2, score.player1))
        } else {
            None
        }
    }
}

impl TryFrom<DbMatch> for Match {
    type Error = AppError;

    fn try_from(value: DbMatch) -> Result<Self, Self::Error> {
        let games = [
            (value.game1_player1, value.game1_player2),
            (value.game2_player1, value.game2_player2),
            (value.game3_player1, value.game3_player2),
        ]
        .into_iter()
        .filter_map(|(p1, p2)| GameScore::from_columns(p1, p2))
        .collect();
        Ok(Self {
            id: value.id,
            tournament_id: value.tournament_id,
            player1_id: value.player1_id,
            player2_id: value.player2_id,
            status: MatchStatus::try_from(value.status.as_str())?,
            round: value.round,
            stage: Stage::from_str(&value.stage),
            group_name: value.group_name,
            bracket_position: value.bracket_position,
            best_of_three: value.best_of_three,
            score: GameScore::from_columns(value.player1_score, value.player2_score),
            games,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: u32,
    pub name: String,
    pub format: Format,
    pub rounds: u32,
    pub group_count: Option<u32>,
    pub advance_count: Option<u32>,
    pub seeded: bool,
    pub registration_open: bool,
    pub completed: bool,
    pub start_date: Option<i64>,
    pub updated_at: i64,
}

impl TryFrom<DbTournament> for Tournament {
    type Error = AppError;

    fn try_from(value: DbTournament) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            name: value.name,
            format: Format::try_from(value.format.as_str())?,
            rounds: value.rounds,
            group_count: value.group_count,
            advance_count: value.advance_count,
            seeded: value.seeded,
            registration_open: value.status == "registration",
            completed: value.status == "completed",
            start_date: value.start_date,
            updated_at: value.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::completed as completed_match;

    #[test]
    fn test_status_transitions() {
        assert!(MatchStatus::Scheduled.can_transition_to(MatchStatus::InProgress));
        assert!(MatchStatus::Pending.can_transition_to(MatchStatus::InProgress));
        assert!(MatchStatus::InProgress.can_transition_to(MatchStatus::Completed));
        assert!(MatchStatus::InProgress.can_transition_to(MatchStatus::Cancelled));
        assert!(MatchStatus::Scheduled.can_transition_to(MatchStatus::Cancelled));
        assert!(!MatchStatus::Pending.can_transition_to(MatchStatus::Cancelled));
        assert!(!MatchStatus::Completed.can_transition_to(MatchStatus::InProgress));
        assert!(!MatchStatus::Cancelled.can_transition_to(MatchStatus::Scheduled));
        assert!(matches!(
            MatchStatus::Completed.transition(MatchStatus::Cancelled),
            Err(AppError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_best_of_three_score_from_games() {
        let mut m = completed_match(1, 10, 20, 0, 0);
        m.best_of_three = true;
        m.score = None;
        m.games = vec![
            GameScore::new(11, 7),
            GameScore::new(9, 11),
            GameScore::new(11, 4),
        ];
        assert_eq!(m.match_score(), Some(GameScore::new(2, 1)));
        assert_eq!(m.winner_id(), Some(10));
        assert_eq!(m.loser_id(), Some(20));
    }

    #[test]
    fn test_unfinished_match_has_no_winner() {
        let mut m = completed_match(1, 10, 20, 3, 1);
        m.status = MatchStatus::InProgress;
        assert_eq!(m.winner_id(), None);
        m.status = MatchStatus::Completed;
        m.score = None;
        assert_eq!(m.winner_id(), None);
    }

    #[test]
    fn test_points_for_is_player_relative() {
        let m = completed_match(1, 10, 20, 3, 1);
        assert_eq!(m.points_for(10), Some((3, 1)));
        assert_eq!(m.points_for(20), Some((1, 3)));
        assert_eq!(m.points_for(30), None);
    }

    fn db_match(status: &str) -> DbMatch {
        DbMatch {
            id: 7,
            tournament_id: 1,
            player1_id: 10,
            player2_id: 20,
            status: status.to_string(),
            round: 1,
            stage: "league".to_string(),
            group_name: None,
            bracket_position: None,
            best_of_three: true,
            player1_score: None,
            player2_score: None,
            game1_player1: Some(11),
            game1_player2: Some(6),
            game2_player1: Some(11),
            game2_player2: Some(8),
            game3_player1: None,
            game3_player2: None,
        }
    }

    #[test]
    fn test_match_row_conversion() {
        let m = Match::try_from(db_match("completed")).unwrap();
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!(m.stage, Stage::League);
        assert_eq!(m.games.len(), 2);
        assert_eq!(m.winner_id(), Some(10));
        assert!(matches!(
            Match::try_from(db_match("postponed")),
            Err(AppError::InvalidMatchStatus(s)) if s == "postponed"
        ));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(Format::try_from("groups_knockout").unwrap(), Format::GroupsKnockout);
        assert_eq!(Format::try_from(" League ").unwrap(), Format::League);
        assert!(matches!(Format::try_from("swiss"), Err(AppError::InvalidFormat(_))));
    }
}
