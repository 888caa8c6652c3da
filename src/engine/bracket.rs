use std::{cmp::Reverse, collections::HashMap};

use crate::{
    engine::{
        schedule::{self, MatchSpec, Schedule, Slot},
        standings::GroupTable,
    },
    errors::AppError,
    models::tournament::{MatchStatus, Stage},
};

/// Rating bonus granted once to every player advancing out of a group.
pub const ADVANCEMENT_BONUS: i32 = 15;

/// Smallest power of two that holds `players` entrants.
pub fn bracket_size(players: usize) -> usize {
    players.max(1).next_power_of_two()
}

pub fn total_rounds(size: usize) -> u32 {
    size.max(1).trailing_zeros()
}

/// Preferred slot for the seed at index `seed` (0 is the top seed).
pub fn seed_slot(seed: usize, size: usize) -> usize {
    match seed {
        0 => 0,
        1 => size.saturating_sub(1),
        _ => 2 * (seed - (1 << seed.ilog2())) + 1,
    }
}

/// Winners of decided knockout matches, keyed by `(round, bracket_position)`.
pub type Winners = HashMap<(u32, u32), u32>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Node {
    Empty,
    Known(u32),
    Undecided,
}

impl Node {
    fn slot(self) -> Slot {
        match self {
            Node::Known(id) => Slot::Player(id),
            _ => Slot::Tbd,
        }
    }
}

/// A single-elimination bracket described by its first-round slots.
///
/// Slot `2k` meets slot `2k + 1` in round 1, and the match at
/// `(round, position)` feeds side `position % 2` of `(round + 1, position / 2)`.
/// Empty slots are byes: a node with a single live feeder passes that player
/// (or that feeder's winner) straight through, so no match is created for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bracket {
    slots: Vec<Option<u32>>,
}

impl Bracket {
    pub fn from_slots(slots: Vec<Option<u32>>) -> Self {
        let size = bracket_size(slots.len());
        let mut slots = slots;
        slots.resize(size, None);
        Self { slots }
    }

    /// Seeds players ordered by rating (strongest first). A seed whose
    /// preferred slot is taken or out of range goes to the first free slot of
    /// an untouched pair, or failing that the first free slot.
    pub fn seeded(players_by_rating: &[u32]) -> Self {
        let size = bracket_size(players_by_rating.len());
        let mut slots: Vec<Option<u32>> = vec![None; size];
        for (seed, player) in players_by_rating.iter().enumerate() {
            let preferred = seed_slot(seed, size);
            let slot = if preferred < size && slots[preferred].is_none() {
                preferred
            } else {
                let untouched = (0..size)
                    .step_by(2)
                    .find(|s| slots[*s].is_none() && slots.get(s + 1).is_none_or(|o| o.is_none()));
                match untouched.or_else(|| slots.iter().position(|s| s.is_none())) {
                    Some(free) => free,
                    None => continue,
                }
            };
            tracing::debug!("seed {} (player {}) -> slot {}", seed, player, slot);
            slots[slot] = Some(*player);
        }
        Self { slots }
    }

    /// Lays out first-round entries: each bye is a player alone in a pair of
    /// slots, each pair meets in round 1. Byes are spread evenly between the
    /// pairs so that no part of the bracket is left without a first-round
    /// match and every round-2 match is fed by round 1 or by a bye.
    pub fn from_entries(byes: &[u32], pairs: &[(u32, u32)]) -> Self {
        let entries = byes.len() + pairs.len();
        let mut slots = Vec::with_capacity(entries * 2);
        let mut byes_left = byes.iter();
        let mut pairs_left = pairs.iter();
        for position in 0..entries {
            let wants_bye = (position + 1) * byes.len() / entries > position * byes.len() / entries;
            if wants_bye {
                if let Some(player) = byes_left.next() {
                    slots.extend([Some(*player), None]);
                    continue;
                }
            }
            if let Some((a, b)) = pairs_left.next() {
                slots.extend([Some(*a), Some(*b)]);
            } else if let Some(player) = byes_left.next() {
                slots.extend([Some(*player), None]);
            }
        }
        Self::from_slots(slots)
    }

    /// Unseeded bracket in list order. The first players get the byes the
    /// bracket size requires; the rest are paired adjacently.
    pub fn sequential(players: &[u32]) -> Self {
        if players.len() < 2 {
            return Self::from_slots(players.iter().map(|p| Some(*p)).collect());
        }
        let bye_count = bracket_size(players.len()) - players.len();
        let (byes, paired) = players.split_at(bye_count);
        let pairs: Vec<(u32, u32)> = schedule::knockout(paired)
            .matches
            .iter()
            .filter_map(|m| match m.pair() {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            })
            .collect();
        Self::from_entries(byes, &pairs)
    }

    pub fn slots(&self) -> &[Option<u32>] {
        &self.slots
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn total_rounds(&self) -> u32 {
        total_rounds(self.size())
    }

    /// The last two rounds are best of three; a one-round bracket is just a final.
    pub fn is_best_of_three(&self, round: u32) -> bool {
        let total = self.total_rounds();
        total > 0 && round + 1 >= total
    }

    fn node(&self, round: u32, position: usize, winners: &Winners) -> Node {
        if round == 0 {
            return match self.slots.get(position).copied().flatten() {
                Some(id) => Node::Known(id),
                None => Node::Empty,
            };
        }
        let left = self.node(round - 1, 2 * position, winners);
        let right = self.node(round - 1, 2 * position + 1, winners);
        match (left, right) {
            (Node::Empty, Node::Empty) => Node::Empty,
            (Node::Empty, other) | (other, Node::Empty) => other,
            _ => match winners.get(&(round, position as u32)) {
                Some(winner) => Node::Known(*winner),
                None => Node::Undecided,
            },
        }
    }

    /// Every match of the bracket with whatever players are known given the
    /// decided results. Round 1 is concrete; later rounds are placeholders.
    pub fn resolve(&self, winners: &Winners) -> Vec<MatchSpec> {
        let mut matches = Vec::new();
        for round in 1..=self.total_rounds() {
            for position in 0..(self.size() >> round) {
                let left = self.node(round - 1, 2 * position, winners);
                let right = self.node(round - 1, 2 * position + 1, winners);
                if left == Node::Empty || right == Node::Empty {
                    continue;
                }
                matches.push(MatchSpec {
                    round,
                    stage: Stage::Knockout,
                    group_name: None,
                    bracket_position: Some(position as u32),
                    player1: left.slot(),
                    player2: right.slot(),
                    best_of_three: self.is_best_of_three(round),
                    status: if round == 1 {
                        MatchStatus::Scheduled
                    } else {
                        MatchStatus::Pending
                    },
                });
            }
        }
        matches
    }

    /// Players whose first-round opponent slot is empty.
    pub fn byes(&self) -> Vec<u32> {
        self.slots
            .chunks(2)
            .filter_map(|pair| match pair {
                [Some(id), None] | [None, Some(id)] => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[cfg(test)]
    pub fn opening_round(&self) -> Schedule {
        Schedule {
            matches: self
                .resolve(&Winners::new())
                .into_iter()
                .filter(|m| m.round == 1)
                .collect(),
            byes: self.byes(),
        }
    }

    /// Full bracket: concrete first round plus placeholders for every later round.
    pub fn schedule(&self) -> Schedule {
        Schedule {
            matches: self.resolve(&Winners::new()),
            byes: self.byes(),
        }
    }
}

/// Builds the knockout bracket for the top `advance_count` of every group.
///
/// When the qualifiers do not fill a power of two, the byes go to the best
/// finishers: every group winner first, then runners-up, in group order. The
/// remaining qualifiers are paired best against worst, preferring an opponent
/// from another group and, among those, from the next group in rotation, so a
/// group winner meets another group's runner-up in round 1.
pub fn advancement_bracket(tables: &[GroupTable], advance_count: u32) -> Result<Bracket, AppError> {
    if advance_count == 0 {
        return Err(AppError::InvalidAdvanceCount(advance_count));
    }
    let groups = tables.len();
    // (rank, group, player), best finishers first
    let mut qualifiers: Vec<(usize, usize, u32)> = tables
        .iter()
        .enumerate()
        .flat_map(|(group, table)| {
            table
                .standings
                .iter()
                .take(advance_count as usize)
                .enumerate()
                .map(move |(rank, s)| (rank, group, s.player_id))
        })
        .collect();
    if qualifiers.len() < 2 {
        return Err(AppError::NotEnoughAdvancingPlayers(qualifiers.len()));
    }
    qualifiers.sort();
    let bye_count = bracket_size(qualifiers.len()) - qualifiers.len();
    let byes: Vec<u32> = qualifiers.drain(..bye_count).map(|(_, _, p)| p).collect();

    let mut pairs = Vec::with_capacity(qualifiers.len() / 2);
    while !qualifiers.is_empty() {
        let (_, group, player) = qualifiers.remove(0);
        let Some(opponent) = qualifiers
            .iter()
            .enumerate()
            .max_by_key(|(i, (rank, other, _))| {
                let distance = (other + groups - group) % groups;
                (*other != group, *rank, Reverse(distance), Reverse(*i))
            })
            .map(|(i, _)| i)
        else {
            break;
        };
        let (_, _, opponent) = qualifiers.remove(opponent);
        pairs.push((player, opponent));
    }
    tracing::debug!("advancement byes {:?}, pairs {:?}", byes, pairs);
    Ok(Bracket::from_entries(&byes, &pairs))
}
