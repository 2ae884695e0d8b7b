//! Processed-URL ledger
//!
//! The ledger only ever grows. A URL listed in it is never handed to the
//! downloader again.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Record of URLs that have been fully processed
///
/// # Examples
///
/// ```no_run
/// use artwork_dl::ledger::{FileLedger, Ledger};
///
/// # #[tokio::main]
/// # async fn main() -> artwork_dl::Result<()> {
/// let ledger = FileLedger::open("already_downloaded.txt").await?;
/// let url = "https://www.pixiv.net/en/artworks/123456";
/// if !ledger.contains(url).await? {
///     // ... download ...
///     ledger.append(url).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Whether `url` has already been processed
    async fn contains(&self, url: &str) -> Result<bool>;

    /// Record `url` as processed
    async fn append(&self, url: &str) -> Result<()>;
}

/// Newline-delimited ledger file, loaded into memory on open
pub struct FileLedger {
    path: PathBuf,
    urls: Mutex<HashSet<String>>,
}

impl FileLedger {
    /// Open the ledger at `path`; a missing file is an empty ledger
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let urls = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => parse_lines(&contents).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                return Err(Error::Ledger(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        debug!(?path, entries = urls.len(), "ledger loaded");
        Ok(Self {
            path,
            urls: Mutex::new(urls),
        })
    }

    /// Ledger file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of recorded URLs
    pub async fn len(&self) -> usize {
        self.urls.lock().await.len()
    }

    /// Whether no URL has been recorded
    pub async fn is_empty(&self) -> bool {
        self.urls.lock().await.is_empty()
    }
}

#[async_trait]
impl Ledger for FileLedger {
    async fn contains(&self, url: &str) -> Result<bool> {
        Ok(self.urls.lock().await.contains(url.trim()))
    }

    async fn append(&self, url: &str) -> Result<()> {
        let url = url.trim();
        // Held across the write so concurrent appends land one line each
        let mut urls = self.urls.lock().await;
        if urls.contains(url) {
            return Ok(());
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| Error::Ledger(format!("failed to open {}: {}", self.path.display(), e)))?;
        file.write_all(format!("{}\n", url).as_bytes())
            .await
            .map_err(|e| {
                Error::Ledger(format!("failed to append to {}: {}", self.path.display(), e))
            })?;
        file.flush()
            .await
            .map_err(|e| Error::Ledger(format!("failed to flush {}: {}", self.path.display(), e)))?;

        urls.insert(url.to_string());
        debug!(path = ?self.path, url, "ledger entry appended");
        Ok(())
    }
}

/// Non-blank, trimmed lines of a newline-delimited URL file
pub(crate) fn parse_lines(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}
