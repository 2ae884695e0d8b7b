//! Destination directory selection

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::ItemId;

/// Directory that receives an item's files
///
/// Items with more than one page get `<download_dir>/<id>/`; everything else
/// lands directly in the single-page directory.
pub fn resolve_destination(config: &Config, id: ItemId, page_count: u32) -> PathBuf {
    if page_count > 1 {
        config.download_dir().join(id.to_string())
    } else {
        config.single_page_dir().clone()
    }
}

/// Create the destination (and parents) if missing
pub(crate) async fn prepare_destination(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to create destination directory '{}': {}",
                path.display(),
                e
            ),
        ))
    })
}
