//! Batch processing of URL lists against the dedup ledger

use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::ledger::{FileLedger, Ledger, parse_lines};
use crate::types::{BatchSummary, Event, ItemStatus};

use super::ArtworkDownloader;

/// Read a newline-delimited URL list; blank lines are ignored, a missing file is empty
pub async fn read_url_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(parse_lines(&contents).collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read URL list '{}': {}", path.display(), e),
        ))),
    }
}

/// Truncate the URL list once its entries have been processed
pub async fn clear_url_list(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, b"").await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to clear URL list '{}': {}", path.display(), e),
        ))
    })
}

impl ArtworkDownloader {
    /// Download `urls` one item at a time, skipping ledger members
    ///
    /// Only fully completed items are appended to the ledger, so partial and
    /// failed items are retried by the next run. A failing item never stops
    /// the batch; a failing ledger does.
    pub async fn run_batch(&self, urls: &[String], ledger: &dyn Ledger) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        for url in urls {
            if ledger.contains(url).await? {
                info!(url = %url, "already downloaded, skipping");
                self.progress.emit(Event::ItemSkipped { url: url.clone() });
                summary.skipped.push(url.clone());
                continue;
            }

            match self.download_url(url).await {
                Ok(report) => match report.status() {
                    ItemStatus::Complete => {
                        ledger.append(url).await?;
                        summary.completed.push(url.clone());
                    }
                    ItemStatus::Partial => summary.partial.push(url.clone()),
                    ItemStatus::Failed => {
                        let error = report
                            .failures
                            .first()
                            .map(|f| f.error.clone())
                            .unwrap_or_default();
                        summary.failed.push((url.clone(), error));
                    }
                },
                Err(e) => {
                    warn!(url = %url, error = %e, "item failed, continuing with next URL");
                    summary.failed.push((url.clone(), e.to_string()));
                }
            }
        }

        info!(
            completed = summary.completed.len(),
            skipped = summary.skipped.len(),
            partial = summary.partial.len(),
            failed = summary.failed.len(),
            "batch finished"
        );
        Ok(summary)
    }

    /// Process the configured URL list, then clear it
    pub async fn run_url_file(&self, ledger: &FileLedger) -> Result<BatchSummary> {
        let url_list = &self.config.ledger.url_list;
        let urls = read_url_list(url_list).await?;
        info!(path = ?url_list, count = urls.len(), "processing URL list");

        let summary = self.run_batch(&urls, ledger).await?;
        clear_url_list(url_list).await?;
        Ok(summary)
    }
}
