use serde::Serialize;

use crate::{
    engine::{levels::MIN_LEVEL, rating::DEFAULT_RATING},
    repositories::player_repo::DbPlayer,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub rating: i32,
    pub level: u8,
    pub wins: u32,
    pub losses: u32,
}

impl Player {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rating: DEFAULT_RATING,
            level: MIN_LEVEL,
            wins: 0,
            losses: 0,
        }
    }

    #[cfg(test)]
    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = rating;
        self
    }

    #[cfg(test)]
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    /// Rating, level and tallies all match.
    pub fn same_stats(&self, other: &Player) -> bool {
        self.rating == other.rating
            && self.level == other.level
            && self.wins == other.wins
            && self.losses == other.losses
    }
}

impl From<DbPlayer> for Player {
    fn from(value: DbPlayer) -> Self {
        Self {
            id: value.id,
            name: value.name,
            rating: value.rating,
            level: value.level,
            wins: value.wins,
            losses: value.losses,
        }
    }
}
