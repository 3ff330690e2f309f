use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use data_encoding::BASE64;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{config::AppConfig, error::ExportError};

use super::{render_html, ExportDocument};

const FALLBACK_MIME: &str = "image/jpeg";

/// Downloaded cover art.
#[derive(Debug, Clone, PartialEq)]
pub struct Cover {
    /// Media type reported by the server.
    pub mime: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl Cover {
    /// Inline `data:` URI for the image.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

/// Source of cover images.
#[async_trait]
pub trait CoverFetcher: Send + Sync {
    /// Download the image at `url`.
    async fn fetch(&self, url: &str) -> Result<Cover>;
}

/// Fetches covers over HTTP with a per-request timeout.
pub struct HttpCoverFetcher {
    client: Client,
}

impl HttpCoverFetcher {
    /// Create a fetcher giving up on a single image after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build cover HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CoverFetcher for HttpCoverFetcher {
    async fn fetch(&self, url: &str) -> Result<Cover> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to download {url}"))?
            .error_for_status()
            .with_context(|| format!("cover request rejected for {url}"))?;
        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read {url}"))?;
        Ok(Cover {
            mime,
            bytes: bytes.to_vec(),
        })
    }
}

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    /// Written file.
    pub path: PathBuf,
    /// Covers embedded in the document.
    pub embedded_covers: usize,
    /// Hosts whose covers failed, forcing an image-free document.
    pub blocked_hosts: Vec<String>,
}

impl ExportOutcome {
    /// Whether covers had to be left out.
    pub fn images_omitted(&self) -> bool {
        !self.blocked_hosts.is_empty()
    }
}

/// Writes ranking documents, embedding covers when they can be downloaded.
pub struct ExportWriter {
    fetcher: Arc<dyn CoverFetcher>,
    out_dir: PathBuf,
}

impl ExportWriter {
    /// Create a writer saving into `out_dir`.
    pub fn new(fetcher: Arc<dyn CoverFetcher>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            out_dir: out_dir.into(),
        }
    }

    /// Writer using HTTP covers and the configured export directory.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = HttpCoverFetcher::new(config.image_timeout())?;
        Ok(Self::new(Arc::new(fetcher), config.export_root.clone()))
    }

    /// Directory exports are written to.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Render and write `doc`.
    ///
    /// When any cover cannot be downloaded the document is written once more
    /// without images; if that also fails the error lists the failing hosts.
    pub async fn export(&self, doc: &ExportDocument) -> Result<ExportOutcome, ExportError> {
        if doc.is_empty() {
            return Err(ExportError::Empty);
        }
        let path = self.out_dir.join(doc.file_name());
        let (covers, failures) = self.fetch_covers(doc).await;

        if failures.is_empty() {
            write_document(&path, &render_html(doc, &covers)).await?;
            info!(path = %path.display(), covers = covers.len(), "Ranking exported");
            return Ok(ExportOutcome {
                path,
                embedded_covers: covers.len(),
                blocked_hosts: Vec::new(),
            });
        }

        let blocked_hosts = failing_hosts(&failures);
        warn!(
            hosts = %blocked_hosts.join(", "),
            failed = failures.len(),
            "Cover download failed, exporting without images"
        );
        match write_document(&path, &render_html(doc, &HashMap::new())).await {
            Ok(()) => {
                info!(path = %path.display(), "Ranking exported without images");
                Ok(ExportOutcome {
                    path,
                    embedded_covers: 0,
                    blocked_hosts,
                })
            }
            Err(err) => Err(ExportError::ImagesUnavailable {
                hosts: blocked_hosts.join(", "),
                cause: anyhow!(err),
            }),
        }
    }

    async fn fetch_covers(&self, doc: &ExportDocument) -> (HashMap<String, String>, Vec<String>) {
        let mut tasks = JoinSet::new();
        for entry in &doc.entries {
            let Some(url) = entry.game.cover_image.clone() else {
                continue;
            };
            let fetcher = Arc::clone(&self.fetcher);
            let id = entry.game.id.clone();
            tasks.spawn(async move {
                let result = fetcher.fetch(&url).await;
                (id, url, result)
            });
        }

        let mut covers = HashMap::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, _, Ok(cover))) => {
                    covers.insert(id, cover.data_uri());
                }
                Ok((id, url, Err(err))) => {
                    debug!(id = %id, url = %url, "Cover unavailable: {err:#}");
                    failures.push(url);
                }
                Err(err) => warn!("Cover task failed: {err}"),
            }
        }
        (covers, failures)
    }
}

async fn write_document(path: &Path, html: &str) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ExportError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, html)
        .await
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn failing_hosts(urls: &[String]) -> Vec<String> {
    urls.iter()
        .map(|url| {
            Url::parse(url)
                .ok()
                .and_then(|parsed| parsed.host_str().map(str::to_string))
                .unwrap_or_else(|| url.clone())
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
