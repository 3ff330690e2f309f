use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::AppConfig;

use super::{SearchCandidate, SearchProvider};

/// Results requested per search; ranking keeps the best few.
const PAGE_SIZE: u32 = 30;

static STOP_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(of|the|a|an|and|in|on|at|to)\b").expect("valid stop-word regex")
});

#[derive(Debug, Deserialize)]
struct RawgPage {
    #[serde(default)]
    results: Option<Vec<SearchCandidate>>,
}

/// Client for the RAWG games database.
pub struct RawgProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RawgProvider {
    /// Create a provider talking to `base_url` with the given key and request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build RAWG HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Provider configured from the application settings.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.rawg_api_base.clone(),
            config.rawg_api_key.clone(),
            Duration::from_secs(config.search_timeout_secs),
        )
    }
}

#[async_trait]
impl SearchProvider for RawgProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>> {
        if self.api_key.is_empty() {
            bail!("no RAWG API key configured (set rawg_api_key)");
        }
        let cleaned = clean_query(query);
        let url = format!("{}/games", self.base_url);
        debug!(query, cleaned = %cleaned, "Querying RAWG");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("search", cleaned.as_str()),
                ("page_size", &PAGE_SIZE.to_string()),
                ("ordering", "-relevance"),
            ])
            .send()
            .await
            .context("RAWG request failed")?
            .error_for_status()
            .context("RAWG returned an error status")?;

        let page: RawgPage = response
            .json()
            .await
            .context("RAWG returned invalid JSON")?;
        Ok(page.results.unwrap_or_default())
    }

    fn name(&self) -> &str {
        "rawg"
    }
}

/// Lowercase the query and strip words RAWG ignores, keeping the original
/// when nothing else is left.
pub fn clean_query(query: &str) -> String {
    let lowered = query.to_lowercase();
    let stripped = STOP_WORDS.replace_all(&lowered, "");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        query.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_words_are_removed() {
        assert_eq!(clean_query("The Legend of Zelda"), "legend zelda");
        assert_eq!(clean_query("  Ori and the   Blind Forest "), "ori blind forest");
    }

    #[test]
    fn words_containing_stop_words_survive() {
        assert_eq!(clean_query("Theme Hospital"), "theme hospital");
        assert_eq!(clean_query("Anthem"), "anthem");
    }

    #[test]
    fn query_made_only_of_stop_words_is_kept() {
        assert_eq!(clean_query("The A"), "The A");
    }

    #[test]
    fn page_parses_null_results() {
        let page: RawgPage = serde_json::from_str(r#"{"count":0,"results":null}"#).unwrap();
        assert!(page.results.is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() -> Result<()> {
        let provider = RawgProvider::new("https://api.rawg.io/api/", "key", Duration::from_secs(5))?;
        assert_eq!(provider.base_url, "https://api.rawg.io/api");
        Ok(())
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() -> Result<()> {
        let provider = RawgProvider::new("http://127.0.0.1:9", "", Duration::from_secs(1))?;
        let err = provider.search("hades").await.unwrap_err();
        assert!(err.to_string().contains("rawg_api_key"));
        Ok(())
    }
}
