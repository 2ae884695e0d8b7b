//! # artwork-dl
//!
//! Library for downloading gallery artworks: still images page by page, and
//! zipped frame sequences reassembled into a single looping GIF.
//!
//! ## Pipeline
//!
//! For every item URL:
//! 1. the item page is fetched and its embedded metadata decoded,
//! 2. the asset type decides between still pages and a frame sequence,
//! 3. pages are downloaded through a bounded worker pool,
//! 4. frame archives are extracted, ordered, and encoded as `<id>.gif`,
//! 5. progress and lifecycle events are broadcast to subscribers throughout.
//!
//! A newline-delimited ledger of processed URLs keeps batch runs from
//! downloading an item twice.
//!
//! ## Quick Start
//!
//! ```no_run
//! use artwork_dl::{ArtworkDownloader, Config, FileLedger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let ledger = FileLedger::open(&config.ledger.path).await?;
//!     let downloader = ArtworkDownloader::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let urls = vec!["https://www.pixiv.net/en/artworks/123456".to_string()];
//!     let summary = downloader.run_batch(&urls, &ledger).await?;
//!     println!("{} completed, {} skipped", summary.completed.len(), summary.skipped.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Frame sequence assembly
pub mod assembly;
/// Asset classification
pub mod classify;
/// Configuration types
pub mod config;
/// Item download pipeline (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Processed-URL ledger
pub mod ledger;
/// Item metadata retrieval
pub mod metadata;
/// Progress aggregation
pub mod progress;
/// Core types and events
pub mod types;
/// Thumbnail URL rewriting
pub mod url_rewrite;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use assembly::FrameAssembler;
pub use classify::{AssetPlan, classify};
pub use config::{Config, DownloadConfig, HttpConfig, LedgerConfig};
pub use downloader::{ArtworkDownloader, clear_url_list, read_url_list, resolve_destination};
pub use error::{AssemblyError, Error, Result, TransferError};
pub use ledger::{FileLedger, Ledger};
pub use metadata::MetadataFetcher;
pub use progress::{ProgressAggregator, ProgressSnapshot};
pub use types::{
    AssetKind, BatchSummary, DownloadTask, Event, ItemId, ItemMetadata, ItemReference, ItemReport,
    ItemStatus, TaskFailure, TaskId,
};
