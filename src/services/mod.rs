pub mod match_service;
pub mod player_service;
pub mod tournament_service;
