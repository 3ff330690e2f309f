//! Persistence of game collections.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Game, GameDraft};

/// Storage backend for game collections keyed by user.
///
/// Every call either fully succeeds or leaves the stored collection as it was.
pub trait GameStore: Send + Sync {
    /// All games of `user_id`, newest first.
    fn list(&self, user_id: &str) -> Result<Vec<Game>>;

    /// Persist a new game built from `draft` and return it with its id.
    fn create(&self, user_id: &str, draft: GameDraft) -> Result<Game>;

    /// Replace the editable fields of an existing game.
    fn update(&self, user_id: &str, game_id: &str, draft: GameDraft) -> Result<Game>;

    /// Remove a game.
    fn delete(&self, user_id: &str, game_id: &str) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionFile {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    games: Vec<Game>,
}

const MAX_CLOCK_SKEW_MS: i64 = 24 * 60 * 60 * 1000;

/// On-disk layouts accepted when reading: the web app's bare game array or
/// the wrapped file this store writes.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCollection {
    Bare(Vec<Game>),
    Wrapped(CollectionFile),
}

/// Store keeping one pretty-printed JSON file per user.
pub struct JsonFileStore {
    root: PathBuf,
    last_id: Mutex<i64>,
}

impl JsonFileStore {
    /// Create a store writing under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last_id: Mutex::new(0),
        }
    }

    /// Directory holding the collection files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the collection of `user_id`.
    pub fn collection_path(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_component(user_id)))
    }

    fn read_collection(&self, user_id: &str) -> Result<CollectionFile> {
        let path = self.collection_path(user_id);
        if !path.exists() {
            return Ok(CollectionFile {
                user_id: user_id.to_string(),
                ..CollectionFile::default()
            });
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let stored: StoredCollection = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(match stored {
            StoredCollection::Wrapped(collection) => collection,
            StoredCollection::Bare(games) => CollectionFile {
                user_id: user_id.to_string(),
                saved_at: None,
                games,
            },
        })
    }

    fn write_collection(&self, user_id: &str, collection: &mut CollectionFile) -> Result<()> {
        let path = self.collection_path(user_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        collection.user_id = user_id.to_string();
        collection.saved_at = Some(Utc::now());
        let serialised = serde_json::to_vec_pretty(collection)?;

        // Staged write: a failure leaves the previous file in place.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serialised)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        debug!(path = %path.display(), games = collection.games.len(), "Collection saved");
        Ok(())
    }

    fn next_id(&self, now: DateTime<Utc>, existing: &[Game]) -> String {
        let mut last = self.last_id.lock();
        let now_ms = now.timestamp_millis();
        // Ids far outside the millisecond clock come from elsewhere and must
        // not drag new ids along with them.
        let horizon = now_ms.saturating_add(MAX_CLOCK_SKEW_MS);
        let highest_existing = existing
            .iter()
            .filter_map(|game| game.id.parse::<i64>().ok())
            .filter(|id| (0..=horizon).contains(id))
            .max()
            .unwrap_or(0);
        let mut candidate = now_ms
            .max(last.saturating_add(1))
            .max(highest_existing.saturating_add(1));
        while candidate < i64::MAX && existing.iter().any(|game| game.id == candidate.to_string()) {
            candidate += 1;
        }
        *last = candidate;
        candidate.to_string()
    }
}

impl GameStore for JsonFileStore {
    fn list(&self, user_id: &str) -> Result<Vec<Game>> {
        let mut games = self.read_collection(user_id)?.games;
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(games)
    }

    fn create(&self, user_id: &str, draft: GameDraft) -> Result<Game> {
        let mut collection = self.read_collection(user_id)?;
        let now = Utc::now();
        let id = self.next_id(now, &collection.games);
        let game = Game::from_draft(id, draft, now);
        collection.games.push(game.clone());
        self.write_collection(user_id, &mut collection)?;
        Ok(game)
    }

    fn update(&self, user_id: &str, game_id: &str, draft: GameDraft) -> Result<Game> {
        let mut collection = self.read_collection(user_id)?;
        let game = collection
            .games
            .iter_mut()
            .find(|game| game.id == game_id)
            .ok_or_else(|| anyhow!("game {game_id} not found"))?;
        game.apply_draft(draft);
        let updated = game.clone();
        self.write_collection(user_id, &mut collection)?;
        Ok(updated)
    }

    fn delete(&self, user_id: &str, game_id: &str) -> Result<()> {
        let mut collection = self.read_collection(user_id)?;
        let before = collection.games.len();
        collection.games.retain(|game| game.id != game_id);
        if collection.games.len() == before {
            warn!(user_id, game_id, "Delete requested for unknown game");
            return Err(anyhow!("game {game_id} not found"));
        }
        self.write_collection(user_id, &mut collection)
    }
}

pub(crate) fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "default".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Platform, Status};
    use tempfile::tempdir;

    fn draft(name: &str) -> GameDraft {
        GameDraft {
            name: name.to_string(),
            ..GameDraft::default()
        }
    }

    #[test]
    fn create_list_update_delete() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());

        let hades = store.create("ana", draft("  Hades "))?;
        assert_eq!(hades.name, "Hades");
        let celeste = store.create("ana", draft("Celeste"))?;
        assert_ne!(hades.id, celeste.id);
        assert!(store.collection_path("ana").exists());

        let listed = store.list("ana")?;
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);

        let mut edit = hades.to_draft();
        edit.status = Status::Playing;
        edit.platform = Platform::NintendoSwitch;
        let updated = store.update("ana", &hades.id, edit)?;
        assert_eq!(updated.id, hades.id);
        assert_eq!(updated.created_at, hades.created_at);
        assert_eq!(updated.status, Status::Playing);

        store.delete("ana", &celeste.id)?;
        let remaining = store.list("ana")?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].platform, Platform::NintendoSwitch);
        Ok(())
    }

    #[test]
    fn users_are_isolated() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        store.create("ana", draft("Hades"))?;
        assert!(store.list("bruno")?.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_ids_are_errors() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        store.create("ana", draft("Hades"))?;
        assert!(store.update("ana", "missing", draft("X")).is_err());
        assert!(store.delete("ana", "missing").is_err());
        assert_eq!(store.list("ana")?.len(), 1);
        Ok(())
    }

    #[test]
    fn ids_stay_unique_within_the_same_millisecond() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        let ids: Vec<String> = (0..20)
            .map(|i| store.create("ana", draft(&format!("Game {i}"))).map(|game| game.id))
            .collect::<Result<_>>()?;
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
        Ok(())
    }

    #[test]
    fn reads_collections_written_by_other_clients() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        fs::write(
            store.collection_path("ana"),
            r#"{"games":[{"id":"abc","name":"Celeste","platform":"PC","status":"completed","rating":4,"hoursPlayed":"","createdAt":"2024-01-02T10:00:00Z"}]}"#,
        )?;
        let games = store.list("ana")?;
        assert_eq!(games[0].rating, 4);
        assert_eq!(games[0].hours_played, None);

        let added = store.create("ana", draft("Hades"))?;
        assert!(added.id.parse::<i64>().is_ok());
        assert_eq!(store.list("ana")?.len(), 2);
        Ok(())
    }

    #[test]
    fn reads_bare_game_arrays() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        fs::write(
            store.collection_path("ana"),
            r#"[{"id":"1700000000000","name":"Celeste","tags":null,"createdAt":"2024-01-02T10:00:00Z"}]"#,
        )?;
        let games = store.list("ana")?;
        assert_eq!(games.len(), 1);
        assert!(games[0].tags.is_empty());

        store.create("ana", draft("Hades"))?;
        let content = fs::read_to_string(store.collection_path("ana"))?;
        assert!(content.contains("\"userId\": \"ana\""));
        assert_eq!(store.list("ana")?.len(), 2);
        Ok(())
    }

    #[test]
    fn foreign_ids_at_the_integer_limit_do_not_break_creation() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        fs::write(
            store.collection_path("ana"),
            r#"{"games":[
                {"id":"9223372036854775807","name":"A","createdAt":"2024-01-02T10:00:00Z"},
                {"id":"9223372036854775806","name":"B","createdAt":"2024-01-02T10:00:00Z"}
            ]}"#,
        )?;
        let first = store.create("ana", draft("Hades"))?;
        let second = store.create("ana", draft("Celeste"))?;
        let first_id: i64 = first.id.parse()?;
        let second_id: i64 = second.id.parse()?;
        assert!(first_id < i64::MAX - 1);
        assert!(second_id > first_id);
        assert_eq!(store.list("ana")?.len(), 4);
        Ok(())
    }

    #[test]
    fn sanitize_creates_safe_filenames() {
        assert_eq!(sanitize_component("ana@example.com"), "anaexamplecom");
        assert_eq!(sanitize_component("../.."), "default");
    }
}
