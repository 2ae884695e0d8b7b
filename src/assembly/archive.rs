use crate::error::{AssemblyError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn extraction_error(archive_path: &Path, reason: String) -> AssemblyError {
    AssemblyError::Extraction {
        archive: archive_path.to_path_buf(),
        reason,
    }
}

/// Extract a single entry to disk, creating directories as needed
///
/// Entries whose names escape `dest_path` are skipped.
fn extract_entry(
    mut entry: zip::read::ZipFile,
    dest_path: &Path,
    archive_path: &Path,
) -> Result<Option<PathBuf>> {
    let file_path = match entry.enclosed_name() {
        Some(path) => dest_path.join(path),
        None => {
            warn!(?archive_path, entry = entry.name(), "skipping entry with unsafe path");
            return Ok(None);
        }
    };

    if entry.is_dir() {
        std::fs::create_dir_all(&file_path).map_err(|e| {
            extraction_error(archive_path, format!("failed to create directory: {}", e))
        })?;
        return Ok(None);
    }

    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            extraction_error(
                archive_path,
                format!("failed to create parent directories: {}", e),
            )
        })?;
    }

    let mut outfile = std::fs::File::create(&file_path).map_err(|e| {
        extraction_error(archive_path, format!("failed to create output file: {}", e))
    })?;
    std::io::copy(&mut entry, &mut outfile).map_err(|e| {
        extraction_error(
            archive_path,
            format!("failed to extract {}: {}", file_path.display(), e),
        )
    })?;

    Ok(Some(file_path))
}

/// Extract every file of the archive at `archive_path` into `dest_path`
///
/// Returns the paths of the extracted files in archive order. Blocking; call
/// from the blocking pool.
pub(crate) fn extract_archive(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
    debug!(?archive_path, ?dest_path, "extracting frame archive");

    std::fs::create_dir_all(dest_path).map_err(|e| {
        extraction_error(archive_path, format!("failed to create destination: {}", e))
    })?;

    let file = std::fs::File::open(archive_path)
        .map_err(|e| extraction_error(archive_path, format!("failed to open archive: {}", e)))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| extraction_error(archive_path, format!("failed to read archive: {}", e)))?;

    let mut extracted = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| {
            extraction_error(archive_path, format!("failed to read entry {}: {}", i, e))
        })?;
        if let Some(path) = extract_entry(entry, dest_path, archive_path)? {
            extracted.push(path);
        }
    }

    debug!(
        ?archive_path,
        extracted_count = extracted.len(),
        "frame archive extracted"
    );
    Ok(extracted)
}
