pub mod player;
pub mod tournament;
