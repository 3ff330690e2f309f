mod app;
mod form;
mod ranking_view;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::{Arc, Mutex},
};

use jajoguei_core::{
    config::{self, AppConfig},
    export::ExportWriter,
    ranking::RankingSelector,
    search::{RawgProvider, SearchController},
    store::JsonFileStore,
    Library,
};
use tokio::sync::mpsc;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config.data_root)?;

    let store = Arc::new(JsonFileStore::new(config.data_root.clone()));
    let library = Library::load(store, config.user_id.clone())?;

    let provider = Arc::new(RawgProvider::from_config(&config)?);
    let (search_tx, search_rx) = mpsc::unbounded_channel();
    let search = SearchController::new(provider, config.search_debounce(), search_tx);

    let writer = ExportWriter::from_config(&config)?;
    let selector = RankingSelector::new(config.rating_tie_break, config.ranking_limit);

    let mut app = app::JajogueiApp::new(library, search, search_rx, writer, selector);
    app.run().await
}

fn init_logging(data_root: &Path) -> Result<()> {
    let log_dir = data_root.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("jajoguei.log"))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout belongs to the terminal UI, so only the file gets events.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
