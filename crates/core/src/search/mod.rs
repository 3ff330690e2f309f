//! External game metadata search and relevance ranking.

/// Debounced search that drops superseded results.
pub mod controller;
/// Turning a chosen candidate into a pre-filled draft.
pub mod mapping;
/// RAWG HTTP provider.
pub mod rawg;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

pub use controller::{SearchController, SearchEvent};
pub use mapping::{apply_candidate, detect_platform, genres_to_tags};
pub use rawg::RawgProvider;

/// Queries shorter than this (in characters, after trimming) never hit the network.
pub const MIN_QUERY_LEN: usize = 2;

/// Candidates kept after ranking.
pub const MAX_RESULTS: usize = 10;

const EXACT_MATCH_BONUS: f64 = 1000.0;
const CONTAINS_BONUS: f64 = 500.0;
const PREFIX_BONUS: f64 = 300.0;
const ALL_WORDS_BONUS: f64 = 200.0;
const POPULARITY_WEIGHT: f64 = 10.0;

/// Source of raw search candidates.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch candidates for `query` in the provider's own order.
    async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchCandidate>>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Reference to a named entity (platform, genre) in search metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    /// Provider identifier.
    #[serde(default)]
    pub id: Option<u64>,
    /// Display name used for lookups.
    #[serde(default)]
    pub name: String,
}

/// Platform entry wrapping the actual platform reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformEntry {
    /// Platform the game was released on.
    #[serde(default)]
    pub platform: Option<NamedRef>,
}

/// Screenshot thumbnail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    /// Image URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// Game returned by the metadata provider. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Provider identifier.
    #[serde(default)]
    pub id: Option<u64>,
    /// Game title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Release date as sent by the provider (`YYYY-MM-DD`).
    #[serde(default)]
    pub released: Option<String>,
    /// Popularity rating from 0 to 5.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Main artwork.
    #[serde(default)]
    pub background_image: Option<String>,
    /// Platforms the game shipped on, in provider order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: Vec<PlatformEntry>,
    /// Genres, in provider order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<NamedRef>,
    /// Screenshot thumbnails.
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_screenshots: Vec<Screenshot>,
}

impl SearchCandidate {
    /// Candidate with only a name, used by tests and manual entries.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Platform names in provider order, skipping incomplete entries.
    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .filter_map(|entry| entry.platform.as_ref())
            .map(|platform| platform.name.as_str())
            .collect()
    }

    /// Genre names in provider order.
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|genre| genre.name.as_str()).collect()
    }

    /// Background image, falling back to the first screenshot.
    pub fn cover_image(&self) -> Option<&str> {
        self.background_image
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| {
                self.short_screenshots
                    .first()
                    .and_then(|shot| shot.image.as_deref())
                    .filter(|url| !url.trim().is_empty())
            })
    }

    /// Release year parsed from the leading `YYYY` of the release date.
    pub fn release_year(&self) -> Option<i32> {
        self.released
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok())
    }

    /// Display label used in result lists.
    pub fn display_name(&self) -> String {
        match self.release_year() {
            Some(year) => format!("{} ({})", self.name, year),
            None => self.name.clone(),
        }
    }
}

/// Candidate paired with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// The ranked candidate.
    pub candidate: SearchCandidate,
    /// Sum of the applicable bonuses.
    pub score: f64,
}

/// Whether `query` is long enough to be sent to a provider.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_LEN
}

/// Relevance of a single candidate against a user query.
pub fn relevance_score(query: &str, candidate: &SearchCandidate) -> f64 {
    let query = query.trim().to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();
    score_normalized(&query, &words, candidate)
}

fn score_normalized(query: &str, words: &[&str], candidate: &SearchCandidate) -> f64 {
    let name = candidate.name.trim().to_lowercase();
    let mut score = 0.0;

    if name == query {
        score += EXACT_MATCH_BONUS;
    }
    if name.contains(query) {
        score += CONTAINS_BONUS;
    }
    if name.starts_with(query) {
        score += PREFIX_BONUS;
    }
    let all_words_match = !words.is_empty()
        && words
            .iter()
            .all(|word| word.chars().count() > 2 && name.contains(*word));
    if all_words_match {
        score += ALL_WORDS_BONUS;
    }
    score += candidate.rating.unwrap_or(0.0) * POPULARITY_WEIGHT;
    score
}

/// Score, filter and order candidates, best first, keeping at most [`MAX_RESULTS`].
///
/// Candidates with equal scores keep the provider's order.
pub fn rank_candidates(query: &str, candidates: Vec<SearchCandidate>) -> Vec<ScoredCandidate> {
    let query = query.trim().to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let score = score_normalized(&query, &words, &candidate);
            ScoredCandidate { candidate, score }
        })
        .filter(|scored| scored.score > 0.0)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(MAX_RESULTS);
    scored
}

/// Query the provider and rank its answer.
///
/// Short queries return nothing without calling the provider, and provider
/// failures are logged and reported as an empty result.
pub async fn search_games(provider: &dyn SearchProvider, query: &str) -> Vec<ScoredCandidate> {
    if !is_searchable(query) {
        return Vec::new();
    }

    match provider.search(query).await {
        Ok(candidates) => {
            let total = candidates.len();
            let ranked = rank_candidates(query, candidates);
            debug!(
                provider = provider.name(),
                query,
                total,
                kept = ranked.len(),
                "Search ranked"
            );
            ranked
        }
        Err(err) => {
            warn!(provider = provider.name(), query, "Search failed: {err:#}");
            Vec::new()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provider returning canned candidates and counting calls.
    pub(crate) struct FakeProvider {
        pub results: Result<Vec<SearchCandidate>, String>,
        pub calls: AtomicUsize,
        pub delay: Duration,
    }

    impl FakeProvider {
        pub(crate) fn ok(results: Vec<SearchCandidate>) -> Self {
            Self {
                results: Ok(results),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        /// Provider that answers only after `delay`.
        pub(crate) fn slow(results: Vec<SearchCandidate>, delay: Duration) -> Self {
            Self {
                delay,
                ..Self::ok(results)
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                results: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchProvider for FakeProvider {
        async fn search(&self, _query: &str) -> anyhow::Result<Vec<SearchCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.results {
                Ok(results) => Ok(results.clone()),
                Err(message) => Err(anyhow::anyhow!(message.clone())),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn rated(name: &str, rating: f64) -> SearchCandidate {
        SearchCandidate {
            rating: Some(rating),
            ..SearchCandidate::named(name)
        }
    }

    fn names(ranked: &[ScoredCandidate]) -> Vec<&str> {
        ranked.iter().map(|scored| scored.candidate.name.as_str()).collect()
    }

    #[test]
    fn substring_match_beats_popularity() {
        let ranked = rank_candidates(
            "zelda",
            vec![rated("Unrelated Game", 5.0), rated("The Legend of Zelda", 4.8)],
        );
        assert_eq!(names(&ranked)[0], "The Legend of Zelda");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn bonuses_add_up() {
        let exact = relevance_score("Hades", &SearchCandidate::named("hades"));
        assert_eq!(exact, 1000.0 + 500.0 + 300.0 + 200.0);

        let prefix = relevance_score("hades", &SearchCandidate::named("Hades II"));
        assert_eq!(prefix, 500.0 + 300.0 + 200.0);

        let words = relevance_score("ring elden", &rated("Elden Ring", 4.5));
        assert_eq!(words, 200.0 + 45.0);
    }

    #[test]
    fn short_words_block_the_all_words_bonus() {
        let score = relevance_score("go of war", &SearchCandidate::named("God of War"));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn unmatched_candidates_without_rating_are_dropped() {
        let ranked = rank_candidates(
            "celeste",
            vec![SearchCandidate::named("Hollow Knight"), rated("Stardew Valley", 4.4)],
        );
        assert_eq!(names(&ranked), vec!["Stardew Valley"]);
    }

    #[test]
    fn ties_keep_provider_order_and_results_are_capped() {
        let candidates: Vec<SearchCandidate> =
            (0..15).map(|i| SearchCandidate::named(format!("Doom {i}"))).collect();
        let ranked = rank_candidates("doom", candidates);
        assert_eq!(ranked.len(), MAX_RESULTS);
        assert_eq!(ranked[0].candidate.name, "Doom 0");
        assert_eq!(ranked[9].candidate.name, "Doom 9");
    }

    #[tokio::test]
    async fn short_query_skips_provider() {
        let provider = FakeProvider::ok(vec![SearchCandidate::named("Z")]);
        assert!(search_games(&provider, "z").await.is_empty());
        assert!(search_games(&provider, "  z  ").await.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn provider_failure_becomes_empty_result() {
        let provider = FakeProvider::failing("HTTP 500");
        assert!(search_games(&provider, "zelda").await.is_empty());
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn candidate_tolerates_missing_and_null_fields() {
        let raw = r#"{"name":"Celeste","platforms":null,"genres":[{"name":"Indie"}],"short_screenshots":[{"image":"https://img/1.jpg"}]}"#;
        let candidate: SearchCandidate = serde_json::from_str(raw).unwrap();
        assert!(candidate.platforms.is_empty());
        assert_eq!(candidate.genre_names(), vec!["Indie"]);
        assert_eq!(candidate.cover_image(), Some("https://img/1.jpg"));
        assert_eq!(candidate.release_year(), None);
    }
}
