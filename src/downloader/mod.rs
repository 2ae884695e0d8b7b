//! Item download pipeline split into focused submodules.
//!
//! The `ArtworkDownloader` struct and its methods are organized by stage:
//! - [`destination`] - Where an item's files go
//! - [`transfer`] - Streaming one asset to disk
//! - [`pages`] - Still-image items through the bounded worker pool
//! - [`sequence`] - Frame archives handed to the frame assembler
//! - [`batch`] - URL lists and the dedup ledger

mod batch;
mod destination;
mod pages;
mod sequence;
mod transfer;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use batch::{clear_url_list, read_url_list};
pub use destination::resolve_destination;

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::{error, info, warn};

use crate::assembly::FrameAssembler;
use crate::classify::{AssetPlan, classify};
use crate::config::Config;
use crate::error::Result;
use crate::metadata::MetadataFetcher;
use crate::progress::ProgressAggregator;
use crate::types::{DownloadTask, Event, ItemReference, ItemReport, ItemStatus};

use transfer::TransferContext;

/// Main downloader instance (cloneable - all shared state is Arc-wrapped)
#[derive(Clone)]
pub struct ArtworkDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// HTTP client carrying the configured timeout
    pub(crate) client: reqwest::Client,
    /// Headers sent with every asset request
    pub(crate) asset_headers: HeaderMap,
    /// Item page fetcher
    pub(crate) metadata: MetadataFetcher,
    /// Frame sequence assembler
    pub(crate) assembler: FrameAssembler,
    /// Shared progress sink and event channel
    pub(crate) progress: ProgressAggregator,
}

impl ArtworkDownloader {
    /// Create a new ArtworkDownloader instance
    ///
    /// Validates the configuration and builds the HTTP client. No directory
    /// is created until an item is downloaded.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        // Transfers are bounded per read, not as a whole
        let client = reqwest::Client::builder()
            .connect_timeout(config.http.timeout)
            .build()?;
        let page_headers = config.http.page_header_map()?;
        let asset_headers = config.http.asset_header_map()?;

        info!(
            download_dir = ?config.download_dir(),
            max_workers = config.download.max_workers,
            timeout_secs = config.http.timeout.as_secs(),
            "artwork downloader initialized"
        );

        Ok(Self {
            metadata: MetadataFetcher::new(client.clone(), page_headers)
                .with_timeout(config.http.timeout),
            assembler: FrameAssembler::new(config.download.frame_delay_ms),
            progress: ProgressAggregator::new(),
            config: Arc::new(config),
            client,
            asset_headers,
        })
    }

    /// Subscribe to download events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// If a subscriber falls behind by more than 1000 events it receives `RecvError::Lagged`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use artwork_dl::{ArtworkDownloader, Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = ArtworkDownloader::new(Config::default())?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             println!("{:?}", event);
    ///         }
    ///     });
    ///
    ///     downloader
    ///         .download_url("https://www.pixiv.net/en/artworks/123456")
    ///         .await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.progress.subscribe()
    }

    /// Progress aggregator, for polling snapshots
    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Parse `url` and download the item it names
    pub async fn download_url(&self, url: &str) -> Result<ItemReport> {
        let reference = ItemReference::parse(url)?;
        self.download_item(&reference).await
    }

    /// Download every asset of one item
    ///
    /// Individual page failures do not abort the item: they are collected in
    /// the report, whose [`status`](ItemReport::status) is `Partial` or
    /// `Failed` accordingly.
    ///
    /// # Errors
    ///
    /// Metadata lookup, classification, destination and assembly errors end
    /// the item and are returned as `Err`.
    pub async fn download_item(&self, reference: &ItemReference) -> Result<ItemReport> {
        let id = reference.id();
        info!(item_id = %id, url = reference.url(), "downloading item");

        let result = self.process_item(reference).await;
        match &result {
            Ok(report) => self.finish_item(report),
            Err(e) => {
                error!(item_id = %id, error = %e, "item download failed");
                self.progress.end_item(
                    id,
                    Event::ItemFailed {
                        id,
                        error: e.to_string(),
                    },
                );
            }
        }
        result
    }

    async fn process_item(&self, reference: &ItemReference) -> Result<ItemReport> {
        let metadata = self.metadata.fetch(reference).await?;
        let (kind, plan) = classify(&metadata)?;

        let destination = resolve_destination(&self.config, metadata.id, metadata.page_count);
        destination::prepare_destination(&destination).await?;

        self.progress
            .begin_item(metadata.id, kind, plan.task_count());

        match plan {
            AssetPlan::StaticPages { pages } => {
                pages::download_pages(self, &metadata, kind, pages, &destination).await
            }
            AssetPlan::FrameSequence => {
                sequence::download_sequence(self, &metadata, &destination).await
            }
        }
    }

    fn finish_item(&self, report: &ItemReport) {
        let id = report.id;
        match report.status() {
            ItemStatus::Complete => {
                info!(item_id = %id, files = report.files.len(), "item complete");
                self.progress.end_item(
                    id,
                    Event::ItemComplete {
                        id,
                        files: report.files.clone(),
                    },
                );
            }
            ItemStatus::Partial => {
                warn!(
                    item_id = %id,
                    files = report.files.len(),
                    failed = report.failures.len(),
                    "item partially downloaded"
                );
                self.progress.end_item(
                    id,
                    Event::ItemPartial {
                        id,
                        failed: report.failures.len() as u32,
                    },
                );
            }
            ItemStatus::Failed => {
                let error = report
                    .failures
                    .first()
                    .map(|f| f.error.clone())
                    .unwrap_or_default();
                error!(item_id = %id, error = %error, "every task of the item failed");
                self.progress.end_item(id, Event::ItemFailed { id, error });
            }
        }
    }

    fn transfer_context(&self) -> TransferContext<'_> {
        TransferContext {
            client: &self.client,
            headers: &self.asset_headers,
            chunk_size: self.config.download.chunk_size,
            idle_timeout: self.config.http.timeout,
            progress: &self.progress,
        }
    }

    /// Run one transfer and publish its terminal task event
    pub(crate) async fn run_task(&self, task: &DownloadTask) -> Result<PathBuf> {
        match transfer::fetch_to_file(&self.transfer_context(), task).await {
            Ok(path) => {
                self.progress.finish_task(&task.task);
                Ok(path)
            }
            Err(e) => {
                warn!(task = %task.task, url = %task.url, error = %e, "task failed");
                self.progress.fail_task(&task.task, e.to_string());
                Err(e)
            }
        }
    }
}
