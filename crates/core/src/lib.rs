#![warn(clippy::all, missing_docs)]

//! Core domain logic for Já Joguei, a personal video game log.
//!
//! This crate hosts the game models, collection persistence, search against
//! external metadata, statistics, rankings and ranking exports used by the
//! terminal UI and any future frontends.

pub mod config;
/// Error types callers branch on.
pub mod error;
pub mod export;
pub mod filter;
pub mod library;
pub mod models;
pub mod ranking;
pub mod search;
pub mod stats;
pub mod store;

pub use config::AppConfig;
pub use error::{ExportError, LibraryError};
pub use export::{ExportDocument, ExportWriter};
pub use filter::GameFilter;
pub use library::Library;
pub use models::{Game, GameDraft, Platform, Status};
pub use ranking::{RankingMode, RankingSelector, TieBreak};
pub use search::{SearchCandidate, SearchController, SearchEvent, SearchProvider};
pub use stats::CollectionStats;
pub use store::{GameStore, JsonFileStore};
