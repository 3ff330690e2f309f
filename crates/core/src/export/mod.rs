//! Shareable ranking documents.

/// HTML rendering of an [`ExportDocument`].
pub mod html;
/// Cover embedding and file output.
pub mod writer;

use chrono::{Datelike, Local};
use serde::Serialize;

use crate::{
    models::Game,
    ranking::RankingMode,
    stats::{average_rating, total_hours},
};

pub use html::render_html;
pub use writer::{CoverFetcher, ExportOutcome, ExportWriter, HttpCoverFetcher};

/// Prefix of every exported file name.
pub const FILE_PREFIX: &str = "ja-joguei";

/// Position mark: medals for the podium, `n.` for everyone else.
pub fn badge(position: usize) -> String {
    match position {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("{n}."),
    }
}

/// One ranked game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportEntry {
    /// 1-based rank.
    pub position: usize,
    /// The ranked game.
    pub game: Game,
    /// Mark printed next to the entry.
    pub badge: String,
}

impl ExportEntry {
    /// Whether the entry is on the podium.
    pub fn is_podium(&self) -> bool {
        self.position <= 3
    }
}

/// Figures printed below the ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    /// Mean rating of the ranked games, one decimal.
    pub avg_rating: f64,
    /// Number of ranked games.
    pub count: usize,
    /// Ranked games marked as platinum.
    pub platinados: usize,
    /// Hours across the ranked games, only for hours-based rankings.
    pub total_hours: Option<u64>,
}

impl ExportSummary {
    /// Summarize a ranked subset.
    pub fn compute(games: &[Game], hours_based: bool) -> Self {
        Self {
            avg_rating: average_rating(games),
            count: games.len(),
            platinados: games.iter().filter(|game| game.platinado).count(),
            total_hours: hours_based.then(|| total_hours(games)),
        }
    }
}

/// A ranking ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    /// Headline.
    pub title: String,
    /// Year printed under the headline.
    pub year: i32,
    /// Ranked games, best first.
    pub entries: Vec<ExportEntry>,
    /// Figures over the entries.
    pub summary: ExportSummary,
    #[serde(skip)]
    mode: RankingMode,
    #[serde(skip)]
    limit: usize,
}

impl ExportDocument {
    /// Rank `games` in their given order and compute the summary.
    pub fn prepare(games: Vec<Game>, mode: RankingMode, limit: usize) -> Self {
        let summary = ExportSummary::compute(&games, mode.is_hours_based());
        let entries = games
            .into_iter()
            .enumerate()
            .map(|(index, game)| ExportEntry {
                position: index + 1,
                badge: badge(index + 1),
                game,
            })
            .collect();
        Self {
            title: mode.title(limit),
            year: Local::now().year(),
            entries,
            summary,
            mode,
            limit,
        }
    }

    /// Ranking the document was built from.
    pub fn mode(&self) -> RankingMode {
        self.mode
    }

    /// Whether there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File name encoding the mode and its qualifier.
    pub fn file_name(&self) -> String {
        file_name(&self.mode, self.limit)
    }
}

/// `ja-joguei-top{limit}-{mode}[-{qualifier}].html`
pub fn file_name(mode: &RankingMode, limit: usize) -> String {
    match mode.qualifier() {
        Some(qualifier) => format!(
            "{FILE_PREFIX}-top{limit}-{}-{}.html",
            mode.slug(),
            qualifier
        ),
        None => format!("{FILE_PREFIX}-top{limit}-{}.html", mode.slug()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{GameDraft, Status};
    use crate::ranking::YearOrder;
    use chrono::{TimeZone, Utc};

    pub(crate) fn game(name: &str, rating: u8, hours: Option<u32>, platinado: bool) -> Game {
        let draft = GameDraft {
            name: name.to_string(),
            rating,
            hours_played: hours,
            platinado,
            ..GameDraft::default()
        };
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Game::from_draft(name.to_lowercase(), draft, created)
    }

    #[test]
    fn podium_gets_medals() {
        assert_eq!(badge(1), "🥇");
        assert_eq!(badge(2), "🥈");
        assert_eq!(badge(3), "🥉");
        assert_eq!(badge(4), "4.");
        assert_eq!(badge(10), "10.");
    }

    #[test]
    fn document_numbers_entries_and_summarizes() {
        let games = vec![
            game("Hades", 5, Some(80), true),
            game("Celeste", 3, None, false),
            game("Inside", 4, Some(4), false),
            game("Limbo", 4, Some(3), true),
        ];
        let doc = ExportDocument::prepare(games, RankingMode::Rating, 10);
        assert_eq!(doc.title, "MEU TOP 10 - MELHOR AVALIADOS");
        let badges: Vec<&str> = doc.entries.iter().map(|entry| entry.badge.as_str()).collect();
        assert_eq!(badges, vec!["🥇", "🥈", "🥉", "4."]);
        assert_eq!(doc.entries[3].position, 4);
        assert!(!doc.entries[3].is_podium());
        assert_eq!(doc.summary.avg_rating, 4.0);
        assert_eq!(doc.summary.count, 4);
        assert_eq!(doc.summary.platinados, 2);
        assert_eq!(doc.summary.total_hours, None);
    }

    #[test]
    fn hours_rankings_report_total_hours() {
        let games = vec![game("Hades", 5, Some(80), false), game("Celeste", 3, None, false)];
        let doc = ExportDocument::prepare(games, RankingMode::Hours, 10);
        assert_eq!(doc.summary.total_hours, Some(80));

        let year = RankingMode::Year {
            year: 2023,
            order: YearOrder::Hours,
        };
        let doc = ExportDocument::prepare(Vec::new(), year, 10);
        assert!(doc.is_empty());
        assert_eq!(doc.summary.total_hours, Some(0));
        assert_eq!(doc.summary.avg_rating, 0.0);
    }

    #[test]
    fn file_names_encode_mode_and_qualifier() {
        assert_eq!(file_name(&RankingMode::Hours, 10), "ja-joguei-top10-hours.html");
        assert_eq!(
            file_name(
                &RankingMode::Year {
                    year: 2024,
                    order: YearOrder::Rating
                },
                10
            ),
            "ja-joguei-top10-year-2024.html"
        );
        assert_eq!(
            file_name(&RankingMode::Status(Status::Dropped), 5),
            "ja-joguei-top5-status-dropped.html"
        );
        assert_eq!(
            ExportDocument::prepare(Vec::new(), RankingMode::Platinum, 10).file_name(),
            "ja-joguei-top10-platinados.html"
        );
    }
}
