//! Top-N selections of the collection used for rankings and exports.
//!
//! Every selection filters the whole collection first, sorts with a stable
//! sort (so equal keys keep collection order) and only then truncates.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Game, Status};

/// Entries in a ranking unless configured otherwise.
pub const DEFAULT_LIMIT: usize = 10;

/// How games with the same rating are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Most recently finished first, using the creation time when the
    /// finish date is unknown.
    #[default]
    MostRecent,
    /// Most hours played first, unknown counted as zero.
    HoursPlayed,
}

/// Ordering applied inside a single year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearOrder {
    /// Best rated first.
    #[default]
    Rating,
    /// Most played first.
    Hours,
}

/// Criterion a ranking is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMode {
    /// Most hours played.
    Hours,
    /// Best rated.
    Rating,
    /// Games finished in one calendar year.
    Year {
        /// Calendar year to keep.
        year: i32,
        /// Ordering inside the year.
        order: YearOrder,
    },
    /// Most recently added.
    Recent,
    /// Best rated games with one status.
    Status(Status),
    /// Best rated fully completed games.
    Platinum,
}

impl RankingMode {
    /// Identifier used in export file names.
    pub fn slug(&self) -> &'static str {
        match self {
            RankingMode::Hours => "hours",
            RankingMode::Rating => "rating",
            RankingMode::Year { .. } => "year",
            RankingMode::Recent => "recent",
            RankingMode::Status(_) => "status",
            RankingMode::Platinum => "platinados",
        }
    }

    /// Year or status the mode is narrowed to, if any.
    pub fn qualifier(&self) -> Option<String> {
        match self {
            RankingMode::Year { year, .. } => Some(year.to_string()),
            RankingMode::Status(status) => Some(status.as_str().to_string()),
            _ => None,
        }
    }

    /// Whether the ranking is about time spent rather than rating.
    pub fn is_hours_based(&self) -> bool {
        matches!(
            self,
            RankingMode::Hours
                | RankingMode::Year {
                    order: YearOrder::Hours,
                    ..
                }
        )
    }

    /// Headline printed on exported rankings.
    pub fn title(&self, limit: usize) -> String {
        let subject = match self {
            RankingMode::Hours => "MAIS JOGADOS".to_string(),
            RankingMode::Rating => "MELHOR AVALIADOS".to_string(),
            RankingMode::Year { year, .. } => year.to_string(),
            RankingMode::Recent => "MAIS RECENTES".to_string(),
            RankingMode::Status(status) => status.label().to_uppercase(),
            RankingMode::Platinum => "PLATINADOS".to_string(),
        };
        format!("MEU TOP {limit} - {subject}")
    }
}

/// Builds rankings with a fixed tie-break strategy and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingSelector {
    tie_break: TieBreak,
    limit: usize,
}

impl Default for RankingSelector {
    fn default() -> Self {
        Self::new(TieBreak::default(), DEFAULT_LIMIT)
    }
}

impl RankingSelector {
    /// Create a selector returning at most `limit` games.
    pub fn new(tie_break: TieBreak, limit: usize) -> Self {
        Self { tie_break, limit }
    }

    /// Tie-break strategy for equal ratings.
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Maximum number of games returned.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Select and order games for `mode`.
    pub fn select(&self, games: &[Game], mode: RankingMode) -> Vec<Game> {
        match mode {
            RankingMode::Hours => top_by_hours(games, self.limit),
            RankingMode::Rating => top_by_rating(games, self.tie_break, self.limit),
            RankingMode::Year { year, order } => match order {
                YearOrder::Rating => top_by_year(games, year, self.tie_break, self.limit),
                YearOrder::Hours => top_by_hours(&games_in_year(games, year), self.limit),
            },
            RankingMode::Recent => most_recent(games, self.limit),
            RankingMode::Status(status) => top_by_status(games, status, self.tie_break, self.limit),
            RankingMode::Platinum => top_platinum(games, self.tie_break, self.limit),
        }
    }
}

/// Games with at least one hour played, most played first.
pub fn top_by_hours(games: &[Game], limit: usize) -> Vec<Game> {
    let mut selected: Vec<Game> = games.iter().filter(|game| game.hours() > 0).cloned().collect();
    selected.sort_by(|a, b| b.hours().cmp(&a.hours()));
    selected.truncate(limit);
    selected
}

/// Best rated games, ties resolved by `tie_break`.
pub fn top_by_rating(games: &[Game], tie_break: TieBreak, limit: usize) -> Vec<Game> {
    sorted_by_rating(games.to_vec(), tie_break, limit)
}

/// Games finished during `year`, in collection order.
pub fn games_in_year(games: &[Game], year: i32) -> Vec<Game> {
    games
        .iter()
        .filter(|game| game.finished_year() == Some(year))
        .cloned()
        .collect()
}

/// Best rated games finished during `year`.
pub fn top_by_year(games: &[Game], year: i32, tie_break: TieBreak, limit: usize) -> Vec<Game> {
    sorted_by_rating(games_in_year(games, year), tie_break, limit)
}

/// Most recently added games first.
pub fn most_recent(games: &[Game], limit: usize) -> Vec<Game> {
    let mut selected = games.to_vec();
    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    selected.truncate(limit);
    selected
}

/// Best rated games with the given status.
pub fn top_by_status(games: &[Game], status: Status, tie_break: TieBreak, limit: usize) -> Vec<Game> {
    let selected = games
        .iter()
        .filter(|game| game.status == status)
        .cloned()
        .collect();
    sorted_by_rating(selected, tie_break, limit)
}

/// Best rated fully completed games.
pub fn top_platinum(games: &[Game], tie_break: TieBreak, limit: usize) -> Vec<Game> {
    let selected = games.iter().filter(|game| game.platinado).cloned().collect();
    sorted_by_rating(selected, tie_break, limit)
}

/// Distinct finish years, newest first.
pub fn available_years(games: &[Game]) -> Vec<i32> {
    let mut years: Vec<i32> = games.iter().filter_map(Game::finished_year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

fn sorted_by_rating(mut games: Vec<Game>, tie_break: TieBreak, limit: usize) -> Vec<Game> {
    games.sort_by(|a, b| compare_by_rating(a, b, tie_break));
    games.truncate(limit);
    games
}

fn compare_by_rating(a: &Game, b: &Game, tie_break: TieBreak) -> Ordering {
    b.rating.cmp(&a.rating).then_with(|| match tie_break {
        TieBreak::MostRecent => b.completion_instant().cmp(&a.completion_instant()),
        TieBreak::HoursPlayed => b.hours().cmp(&a.hours()),
    })
}
