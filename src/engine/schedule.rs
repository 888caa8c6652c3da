use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    errors::AppError,
    models::tournament::{MatchStatus, Stage},
};

/// One side of a generated match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "playerId")]
pub enum Slot {
    Player(u32),
    /// Filled in once the feeding match has a winner.
    Tbd,
}

impl Slot {
    pub fn player(&self) -> Option<u32> {
        match self {
            Slot::Player(id) => Some(*id),
            Slot::Tbd => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSpec {
    pub round: u32,
    pub stage: Stage,
    pub group_name: Option<String>,
    pub bracket_position: Option<u32>,
    pub player1: Slot,
    pub player2: Slot,
    pub best_of_three: bool,
    pub status: MatchStatus,
}

impl MatchSpec {
    pub fn scheduled(round: u32, stage: Stage, player1: u32, player2: u32) -> Self {
        Self {
            round,
            stage,
            group_name: None,
            bracket_position: None,
            player1: Slot::Player(player1),
            player2: Slot::Player(player2),
            best_of_three: false,
            status: MatchStatus::Scheduled,
        }
    }

    pub fn pair(&self) -> (Option<u32>, Option<u32>) {
        (self.player1.player(), self.player2.player())
    }
}

/// Matches to create plus the players that sit out the first round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub matches: Vec<MatchSpec>,
    pub byes: Vec<u32>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,
    pub players: Vec<u32>,
}

/// `Group A`, `Group B`, ... continuing with `Group AA` past `Z`.
pub fn group_name(index: usize) -> String {
    let mut label = String::new();
    let mut n = index;
    loop {
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    format!("Group {label}")
}

/// Adjacent pairing in list order: (0, 1), (2, 3), ... An odd last player is
/// reported as a bye rather than dropped.
pub fn knockout(players: &[u32]) -> Schedule {
    if players.len() < 2 {
        return Schedule::default();
    }
    let pairs = players.chunks_exact(2);
    let byes = pairs.remainder().to_vec();
    Schedule {
        matches: pairs
            .map(|pair| MatchSpec::scheduled(1, Stage::Knockout, pair[0], pair[1]))
            .collect(),
        byes,
    }
}

/// Every unique pair once per round; even rounds swap who is player1.
pub fn league(players: &[u32], rounds: u32) -> Schedule {
    if players.len() < 2 {
        return Schedule::default();
    }
    let mut schedule = Schedule::default();
    for round in 1..=rounds {
        for (a, b) in players.iter().tuple_combinations() {
            let (p1, p2) = if round % 2 == 0 { (*b, *a) } else { (*a, *b) };
            schedule
                .matches
                .push(MatchSpec::scheduled(round, Stage::League, p1, p2));
        }
    }
    schedule
}

/// Splits players into `group_count` groups. Without explicit assignments the
/// player at index `i` goes to group `i % group_count`, so callers shuffle
/// beforehand when they want a random draw.
pub fn partition_groups(
    players: &[u32],
    group_count: u32,
    assignments: Option<&HashMap<u32, u32>>,
) -> Result<Vec<Group>, AppError> {
    if group_count == 0 {
        return Err(AppError::InvalidGroupCount(group_count));
    }
    let mut groups: Vec<Group> = (0..group_count as usize)
        .map(|i| Group {
            name: group_name(i),
            players: Vec::new(),
        })
        .collect();
    for (index, player) in players.iter().enumerate() {
        let group = match assignments {
            Some(assigned) => match assigned.get(player) {
                Some(g) if *g < group_count => *g as usize,
                _ => return Err(AppError::InvalidGroupAssignment(*player)),
            },
            None => index % group_count as usize,
        };
        groups[group].players.push(*player);
    }
    Ok(groups)
}

/// Round-robin inside each group, tagged with the group's name.
pub fn group_stage(groups: &[Group]) -> Schedule {
    let mut schedule = Schedule::default();
    for group in groups.iter() {
        if group.players.len() < 2 {
            tracing::debug!("{} has fewer than 2 players, no matches", group.name);
            continue;
        }
        for (a, b) in group.players.iter().tuple_combinations() {
            let mut spec = MatchSpec::scheduled(1, Stage::Group, *a, *b);
            spec.group_name = Some(group.name.clone());
            schedule.matches.push(spec);
        }
    }
    schedule
}
