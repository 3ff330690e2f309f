//! Application configuration loaded from `~/.config/jajoguei/config.toml`.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ranking::{TieBreak, DEFAULT_LIMIT};

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "jajoguei";
/// Prefix for environment overrides, e.g. `JAJOGUEI_USER_ID`.
pub const ENV_PREFIX: &str = "JAJOGUEI";

const DEFAULT_RAWG_API: &str = "https://api.rawg.io/api";

/// Runtime settings shared by the core and the frontends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Collection owner; selects the data file.
    pub user_id: String,
    /// Directory holding one JSON collection per user.
    pub data_root: PathBuf,
    /// Directory receiving exported rankings.
    pub export_root: PathBuf,
    /// Base URL of the RAWG API.
    pub rawg_api_base: String,
    /// RAWG API key. Search degrades to no results while empty.
    pub rawg_api_key: String,
    /// Quiet period before a typed query is sent.
    pub search_debounce_ms: u64,
    /// Timeout of a single search request.
    pub search_timeout_secs: u64,
    /// Timeout of a single cover download during export.
    pub image_timeout_secs: u64,
    /// Entries per ranking.
    pub ranking_limit: usize,
    /// Tie-break between equally rated games.
    pub rating_tie_break: TieBreak,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR);
        let export_root = dirs::download_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            user_id: "local".to_string(),
            data_root,
            export_root,
            rawg_api_base: DEFAULT_RAWG_API.to_string(),
            rawg_api_key: String::new(),
            search_debounce_ms: 600,
            search_timeout_secs: 10,
            image_timeout_secs: 5,
            ranking_limit: DEFAULT_LIMIT,
            rating_tie_break: TieBreak::default(),
        }
    }
}

impl AppConfig {
    /// Load the user config file merged with environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load from an explicit file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Debounce as a duration.
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Cover download timeout as a duration.
    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }
}

/// Location of the user config file.
pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("unable to resolve config directory")?;
    Ok(base.join(CONFIG_DIR).join("config.toml"))
}

/// Write a default config file on first run.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(&config_path()?)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, default_config_toml(&AppConfig::default()))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

fn default_config_toml(config: &AppConfig) -> String {
    format!(
        r#"# Já Joguei configuration. Every key can be overridden with JAJOGUEI_<KEY>.
user_id = "{user_id}"
data_root = "{data_root}"
export_root = "{export_root}"

rawg_api_base = "{rawg_api_base}"
# Get a free key at https://rawg.io/apidocs
rawg_api_key = ""

search_debounce_ms = {debounce}
search_timeout_secs = {search_timeout}
image_timeout_secs = {image_timeout}

ranking_limit = {limit}
# "most_recent" or "hours_played"
rating_tie_break = "most_recent"
"#,
        user_id = config.user_id,
        data_root = toml_path(&config.data_root),
        export_root = toml_path(&config.export_root),
        rawg_api_base = config.rawg_api_base,
        debounce = config.search_debounce_ms,
        search_timeout = config.search_timeout_secs,
        image_timeout = config.image_timeout_secs,
        limit = config.ranking_limit,
    )
}

fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "\\\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("absent.toml"))?;
        assert_eq!(config.search_debounce_ms, 600);
        assert_eq!(config.ranking_limit, DEFAULT_LIMIT);
        assert_eq!(config.rating_tie_break, TieBreak::MostRecent);
        Ok(())
    }

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("jajoguei").join("config.toml");
        write_default_config(&path)?;
        assert!(path.exists());

        let loaded = AppConfig::load_from(&path)?;
        let defaults = AppConfig::default();
        assert_eq!(loaded.data_root, defaults.data_root);
        assert_eq!(loaded.export_root, defaults.export_root);
        assert_eq!(loaded.rawg_api_base, DEFAULT_RAWG_API);
        Ok(())
    }

    #[test]
    fn existing_file_is_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "user_id = \"ana\"\nsearch_debounce_ms = 750\nrating_tie_break = \"hours_played\"\n",
        )?;
        write_default_config(&path)?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.user_id, "ana");
        assert_eq!(config.search_debounce(), Duration::from_millis(750));
        assert_eq!(config.rating_tie_break, TieBreak::HoursPlayed);
        assert_eq!(config.image_timeout(), Duration::from_secs(5));
        Ok(())
    }
}
