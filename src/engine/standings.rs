use std::cmp::Ordering;

use serde::Serialize;

use crate::{engine::schedule::Group, models::tournament::Match};

pub const POINTS_WIN: u32 = 3;
pub const POINTS_TIE: u32 = 1;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub player_id: u32,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points: u32,
    pub points_for: u32,
    pub points_against: u32,
    pub points_diff: i64,
}

impl Standing {
    pub fn new(player_id: u32) -> Self {
        Self {
            player_id,
            ..Default::default()
        }
    }

    fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.points_for += scored;
        self.points_against += conceded;
        self.points_diff = self.points_for as i64 - self.points_against as i64;
        match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.wins += 1;
                self.points += POINTS_WIN;
            }
            Ordering::Less => self.losses += 1,
            Ordering::Equal => {
                self.ties += 1;
                self.points += POINTS_TIE;
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTable {
    pub group_name: String,
    pub standings: Vec<Standing>,
}

/// Table for `players` built from the completed matches among them.
///
/// Matches that are not completed, lack a score, or involve someone outside
/// `players` are ignored. Ordering: points, point difference, then for
/// exactly two tied players their head-to-head result, then points scored.
/// Ties of three or more skip head-to-head. Remaining ties keep the order of
/// `players`.
pub fn standings(players: &[u32], matches: &[Match]) -> Vec<Standing> {
    let mut table: Vec<Standing> = players.iter().map(|p| Standing::new(*p)).collect();
    let counted: Vec<&Match> = matches
        .iter()
        .filter(|m| {
            m.is_completed()
                && m.match_score().is_some()
                && players.contains(&m.player1_id)
                && players.contains(&m.player2_id)
        })
        .collect();
    for m in counted.iter() {
        for standing in table.iter_mut() {
            if let Some((scored, conceded)) = m.points_for(standing.player_id) {
                standing.record(scored, conceded);
            }
        }
    }
    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.points_diff.cmp(&a.points_diff))
    });
    let mut start = 0;
    while start < table.len() {
        let mut end = start + 1;
        while end < table.len()
            && table[end].points == table[start].points
            && table[end].points_diff == table[start].points_diff
        {
            end += 1;
        }
        let block = &mut table[start..end];
        if block.len() == 2 {
            let first = head_to_head(block[0].player_id, block[1].player_id, &counted)
                .then_with(|| block[1].points_for.cmp(&block[0].points_for));
            if first == Ordering::Greater {
                tracing::debug!(
                    "tie between {} and {} resolved in favour of {}",
                    block[0].player_id,
                    block[1].player_id,
                    block[1].player_id
                );
                block.swap(0, 1);
            }
        } else if block.len() > 2 {
            block.sort_by(|a, b| b.points_for.cmp(&a.points_for));
        }
        start = end;
    }
    table
}

/// `Less` when `a` won more of their completed meetings, `Greater` when `b` did.
fn head_to_head(a: u32, b: u32, matches: &[&Match]) -> Ordering {
    let (a_wins, b_wins) = matches
        .iter()
        .filter(|m| m.involves(a) && m.involves(b))
        .fold((0, 0), |(a_wins, b_wins), m| match m.winner_id() {
            Some(w) if w == a => (a_wins + 1, b_wins),
            Some(w) if w == b => (a_wins, b_wins + 1),
            _ => (a_wins, b_wins),
        });
    b_wins.cmp(&a_wins)
}

/// One table per group, using only matches tagged with that group's name.
pub fn group_tables(groups: &[Group], matches: &[Match]) -> Vec<GroupTable> {
    groups
        .iter()
        .map(|group| {
            let group_matches: Vec<Match> = matches
                .iter()
                .filter(|m| m.group_name.as_deref() == Some(group.name.as_str()))
                .cloned()
                .collect();
            GroupTable {
                group_name: group.name.clone(),
                standings: standings(&group.players, &group_matches),
            }
        })
        .collect()
}
