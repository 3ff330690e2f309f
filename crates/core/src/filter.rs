//! Collection filtering by name, status and platform.

use crate::models::{Game, Platform, Status};

/// Predicates applied to the collection; every one must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Case-insensitive substring of the game name. Empty matches everything.
    pub search: String,
    /// `None` matches every status.
    pub status: Option<Status>,
    /// `None` matches every platform.
    pub platform: Option<Platform>,
}

impl GameFilter {
    /// Whether a single record satisfies all three predicates.
    pub fn matches(&self, game: &Game) -> bool {
        let needle = self.search.to_lowercase();
        matches_with_needle(self, game, &needle)
    }

    /// Records satisfying the filter, in collection order.
    pub fn apply(&self, games: &[Game]) -> Vec<Game> {
        let needle = self.search.to_lowercase();
        games
            .iter()
            .filter(|game| matches_with_needle(self, game, &needle))
            .cloned()
            .collect()
    }

    /// True when no predicate narrows the collection.
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.status.is_none() && self.platform.is_none()
    }

    /// Short description of the active predicates for status lines.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.search.is_empty() {
            parts.push(format!("\"{}\"", self.search));
        }
        parts.push(
            self.status
                .map(|status| status.label().to_string())
                .unwrap_or_else(|| "todos os status".to_string()),
        );
        parts.push(
            self.platform
                .map(|platform| platform.label().to_string())
                .unwrap_or_else(|| "todas as plataformas".to_string()),
        );
        parts.join(" · ")
    }
}

fn matches_with_needle(filter: &GameFilter, game: &Game, needle: &str) -> bool {
    let matches_search = game.name.to_lowercase().contains(needle);
    let matches_status = filter.status.map_or(true, |status| game.status == status);
    let matches_platform = filter
        .platform
        .map_or(true, |platform| game.platform == platform);
    matches_search && matches_status && matches_platform
}

/// Step a wildcard-or-value selector forward, wrapping back to the wildcard.
pub fn cycle_option<T: Copy + PartialEq>(current: Option<T>, values: &[T]) -> Option<T> {
    match current {
        None => values.first().copied(),
        Some(value) => {
            let pos = values.iter().position(|candidate| *candidate == value);
            pos.and_then(|idx| values.get(idx + 1).copied())
        }
    }
}
