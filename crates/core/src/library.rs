//! In-memory view of a user's collection backed by a [`GameStore`].

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use crate::{
    error::{LibraryError, LibraryResult},
    filter::GameFilter,
    models::{Game, GameDraft},
    ranking::{available_years, RankingMode, RankingSelector},
    stats::CollectionStats,
    store::GameStore,
};

/// Message shown when a draft has no name.
pub const NAME_REQUIRED: &str = "Por favor, preencha o nome do jogo";

/// A user's collection plus the store it is persisted to.
///
/// Mutations go to the store first; the snapshot is only replaced once the
/// store confirms, so a failed operation leaves it untouched.
pub struct Library {
    store: Arc<dyn GameStore>,
    user_id: String,
    games: Vec<Game>,
}

impl Library {
    /// Load the collection of `user_id`.
    pub fn load(store: Arc<dyn GameStore>, user_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into();
        let games = store.list(&user_id)?;
        info!(user_id = %user_id, games = games.len(), "Collection loaded");
        Ok(Self {
            store,
            user_id,
            games,
        })
    }

    /// Re-read the collection from the store.
    pub fn reload(&mut self) -> Result<()> {
        self.games = self.store.list(&self.user_id)?;
        Ok(())
    }

    /// Owner of the collection.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Current snapshot.
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    /// Number of games in the collection.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Game with the given id.
    pub fn get(&self, id: &str) -> Option<&Game> {
        self.games.iter().find(|game| game.id == id)
    }

    /// Validate and persist a new game.
    pub fn add(&mut self, draft: GameDraft) -> LibraryResult<Game> {
        validate(&draft)?;
        let game = self.store.create(&self.user_id, draft).map_err(|err| {
            error!(user_id = %self.user_id, "Add failed: {err:#}");
            LibraryError::AddFailed(err)
        })?;
        info!(id = %game.id, name = %game.name, "Game added");

        let mut games = Vec::with_capacity(self.games.len() + 1);
        games.push(game.clone());
        games.extend(self.games.iter().cloned());
        self.games = games;
        Ok(game)
    }

    /// Validate and persist an edit, keeping the id and creation time.
    pub fn update(&mut self, id: &str, draft: GameDraft) -> LibraryResult<Game> {
        validate(&draft)?;
        if self.get(id).is_none() {
            return Err(LibraryError::NotFound(id.to_string()));
        }
        let game = self.store.update(&self.user_id, id, draft).map_err(|err| {
            error!(user_id = %self.user_id, id, "Update failed: {err:#}");
            LibraryError::UpdateFailed(err)
        })?;
        info!(id = %game.id, name = %game.name, "Game updated");

        self.games = self
            .games
            .iter()
            .map(|existing| {
                if existing.id == game.id {
                    game.clone()
                } else {
                    existing.clone()
                }
            })
            .collect();
        Ok(game)
    }

    /// Remove a game from the store and the snapshot.
    pub fn delete(&mut self, id: &str) -> LibraryResult<Game> {
        let removed = self
            .get(id)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        self.store.delete(&self.user_id, id).map_err(|err| {
            error!(user_id = %self.user_id, id, "Delete failed: {err:#}");
            LibraryError::DeleteFailed(err)
        })?;
        info!(id, name = %removed.name, "Game deleted");

        self.games = self.games.iter().filter(|game| game.id != id).cloned().collect();
        Ok(removed)
    }

    /// Games matching `filter`, in collection order.
    pub fn filtered(&self, filter: &GameFilter) -> Vec<Game> {
        filter.apply(&self.games)
    }

    /// Summary statistics over the whole collection.
    pub fn stats(&self) -> CollectionStats {
        CollectionStats::compute(&self.games)
    }

    /// Ranking of the whole collection.
    pub fn ranking(&self, selector: &RankingSelector, mode: RankingMode) -> Vec<Game> {
        selector.select(&self.games, mode)
    }

    /// Finish years present in the collection, newest first.
    pub fn years(&self) -> Vec<i32> {
        available_years(&self.games)
    }
}

fn validate(draft: &GameDraft) -> LibraryResult<()> {
    if draft.is_name_blank() {
        return Err(LibraryError::Validation(NAME_REQUIRED.to_string()));
    }
    Ok(())
}
