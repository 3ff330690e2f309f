//! Summary metrics over a game collection.

use serde::Serialize;

use crate::models::{Game, Platform, Status};

/// Number of games on one platform and their share of the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformShare {
    /// Platform being counted.
    pub platform: Platform,
    /// Games logged on it.
    pub count: usize,
    /// `count / total`, in `0.0..=1.0`.
    pub proportion: f64,
}

/// Dashboard figures, recomputed from scratch on every collection change.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CollectionStats {
    /// Collection size.
    pub total: usize,
    /// Games with status `completed`.
    pub completed: usize,
    /// Games with status `playing`.
    pub playing: usize,
    /// Games with status `backlog`.
    pub backlog: usize,
    /// Games with status `dropped`.
    pub dropped: usize,
    /// Games flagged as fully completed.
    pub platinados: usize,
    /// Mean rating rounded to one decimal; zero for an empty collection.
    pub avg_rating: f64,
    /// Sum of known hours.
    pub total_hours: u64,
    /// Non-empty platforms in [`Platform::ALL`] order.
    pub platforms: Vec<PlatformShare>,
}

impl CollectionStats {
    /// Aggregate the whole collection.
    pub fn compute(games: &[Game]) -> Self {
        let total = games.len();
        let count_status = |status: Status| games.iter().filter(|game| game.status == status).count();

        let platforms = Platform::ALL
            .iter()
            .filter_map(|platform| {
                let count = games.iter().filter(|game| game.platform == *platform).count();
                (count > 0).then(|| PlatformShare {
                    platform: *platform,
                    count,
                    proportion: count as f64 / total as f64,
                })
            })
            .collect();

        Self {
            total,
            completed: count_status(Status::Completed),
            playing: count_status(Status::Playing),
            backlog: count_status(Status::Backlog),
            dropped: count_status(Status::Dropped),
            platinados: games.iter().filter(|game| game.platinado).count(),
            avg_rating: average_rating(games),
            total_hours: total_hours(games),
            platforms,
        }
    }

    /// Count for an arbitrary status.
    pub fn status_count(&self, status: Status) -> usize {
        match status {
            Status::Completed => self.completed,
            Status::Playing => self.playing,
            Status::Backlog => self.backlog,
            Status::Dropped => self.dropped,
        }
    }
}

/// Mean rating rounded to one decimal place, `0.0` when `games` is empty.
pub fn average_rating(games: &[Game]) -> f64 {
    if games.is_empty() {
        return 0.0;
    }
    let sum: u64 = games.iter().map(|game| u64::from(game.rating)).sum();
    round_one_decimal(sum as f64 / games.len() as f64)
}

/// Sum of hours played, unknown counted as zero.
pub fn total_hours(games: &[Game]) -> u64 {
    games.iter().map(|game| u64::from(game.hours())).sum()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
