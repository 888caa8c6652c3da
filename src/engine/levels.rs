use crate::models::player::Player;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;

/// Percentile of `rating` within an ascending population: the index of the
/// first rating that is not lower, as a share of the population.
pub fn percentile(rating: i32, sorted_ratings: &[i32]) -> f64 {
    if sorted_ratings.is_empty() {
        return 0.0;
    }
    let position = sorted_ratings.partition_point(|r| *r < rating);
    position as f64 / sorted_ratings.len() as f64 * 100.0
}

pub fn level_for_percentile(percentile: f64) -> u8 {
    if percentile >= 80.0 {
        MAX_LEVEL
    } else if percentile >= 60.0 {
        4
    } else if percentile >= 40.0 {
        3
    } else if percentile >= 20.0 {
        2
    } else {
        MIN_LEVEL
    }
}

pub fn level_for(rating: i32, sorted_ratings: &[i32]) -> u8 {
    level_for_percentile(percentile(rating, sorted_ratings))
}

/// Recomputes every player's level against the population they form.
pub fn reclassify<'a>(players: impl IntoIterator<Item = &'a mut Player>) {
    let mut players: Vec<&mut Player> = players.into_iter().collect();
    let mut ratings: Vec<i32> = players.iter().map(|p| p.rating).collect();
    ratings.sort_unstable();
    for player in players.iter_mut() {
        player.level = level_for(player.rating, &ratings);
    }
}
