pub mod bracket_repo;
pub mod match_repo;
pub mod player_repo;
pub mod registration_repo;
pub mod tournament_repo;
