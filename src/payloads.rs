use std::collections::HashMap;

use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTournament {
    pub name: String,
    pub format: String,
    pub rounds: Option<u32>,
    pub group_count: Option<u32>,
    pub advance_count: Option<u32>,
    pub seeded: Option<bool>,
    pub start_date: Option<i64>,
    /// Registers these players and generates matches immediately.
    pub players: Option<Vec<u32>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    pub player_id: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub player_id: u32,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRegistration {
    /// Explicit player -> group index mapping for groups_knockout.
    pub group_assignments: Option<HashMap<u32, u32>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResultPayload {
    pub player1: u32,
    pub player2: u32,
}

/// Either a single score or up to three game scores for best-of-three matches.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub player1_score: Option<u32>,
    pub player2_score: Option<u32>,
    #[serde(default)]
    pub games: Vec<GameResultPayload>,
}
