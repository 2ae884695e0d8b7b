//! Downloader configuration for tests

use artwork_dl::Config;
use tempfile::TempDir;

/// Config rooted in `temp_dir`: `Downloads/` for multi-page items, the
/// tempdir itself for single-page items, ledger files alongside.
pub fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("Downloads");
    config.download.single_page_dir = Some(temp_dir.path().to_path_buf());
    config.ledger.path = temp_dir.path().join("already_downloaded.txt");
    config.ledger.url_list = temp_dir.path().join("URLs.txt");
    config
}
