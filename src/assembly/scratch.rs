use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Removes the downloaded archive and its extraction directory when dropped
///
/// Removal is blocking file-system work: the guard is moved into the
/// blocking assembly task, which drops it on success, on error, or while
/// unwinding from a panic.
pub(crate) struct ScratchGuard {
    archive: PathBuf,
    extract_dir: PathBuf,
}

impl ScratchGuard {
    pub(crate) fn new(archive: PathBuf, extract_dir: PathBuf) -> Self {
        Self {
            archive,
            extract_dir,
        }
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.archive) {
            Ok(()) => debug!(archive = ?self.archive, "removed frame archive"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(archive = ?self.archive, error = %e, "failed to remove frame archive"),
        }
        match std::fs::remove_dir_all(&self.extract_dir) {
            Ok(()) => debug!(dir = ?self.extract_dir, "removed extraction directory"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(dir = ?self.extract_dir, error = %e, "failed to remove extraction directory")
            }
        }
    }
}
