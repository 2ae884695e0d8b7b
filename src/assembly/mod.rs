//! Frame sequence assembly
//!
//! Turns a downloaded frame archive into a single looping GIF:
//! extract → order frames → decode → encode → publish `<id>.gif`.
//! The archive and the `<id>_extracted/` directory are removed on every exit
//! path, successful or not.

mod archive;
mod frames;
mod gif;
mod scratch;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use crate::error::{AssemblyError, Result};
use crate::types::ItemId;
use crate::utils::{animation_filename, extraction_dir_name};

use scratch::ScratchGuard;

/// Builds animated artifacts from frame archives
#[derive(Clone, Copy, Debug)]
pub struct FrameAssembler {
    frame_delay_ms: u32,
}

impl FrameAssembler {
    /// Create an assembler showing each frame for `frame_delay_ms`
    pub fn new(frame_delay_ms: u32) -> Self {
        Self { frame_delay_ms }
    }

    /// Per-frame delay in milliseconds
    pub fn frame_delay_ms(&self) -> u32 {
        self.frame_delay_ms
    }

    /// Assemble the frames in `archive` into `<dest_dir>/<id>.gif`
    ///
    /// The archive is consumed: it and the extraction directory are deleted
    /// whether or not assembly succeeds.
    ///
    /// # Errors
    ///
    /// Any [`AssemblyError`]: unreadable archive, no frames, frame names that
    /// do not sort in sequence, undecodable frames, or a failed encode/write.
    pub async fn assemble(&self, archive: &Path, dest_dir: &Path, id: ItemId) -> Result<PathBuf> {
        let extract_dir = dest_dir.join(extraction_dir_name(id));
        let output = dest_dir.join(animation_filename(id));
        let scratch = ScratchGuard::new(archive.to_path_buf(), extract_dir.clone());

        info!(item_id = %id, ?archive, "assembling frame sequence");

        let delay_ms = self.frame_delay_ms;
        let archive_owned = archive.to_path_buf();
        let output_owned = output.clone();
        let result = spawn_blocking(move || {
            // Cleanup runs here, off the async workers, once this closure ends
            let _scratch = scratch;
            assemble_blocking(&archive_owned, &extract_dir, &output_owned, delay_ms)
        })
        .await
        .map_err(|e| AssemblyError::Encode {
            output: output.clone(),
            reason: format!("assembly task panicked: {}", e),
        })?;

        match result {
            Ok(frame_count) => {
                info!(item_id = %id, frame_count, ?output, "animation written");
                Ok(output)
            }
            Err(e) => {
                warn!(item_id = %id, error = %e, "frame assembly failed");
                Err(e)
            }
        }
    }
}

fn assemble_blocking(
    archive: &Path,
    extract_dir: &Path,
    output: &Path,
    delay_ms: u32,
) -> Result<usize> {
    let extracted = archive::extract_archive(archive, extract_dir)?;
    let frames = frames::order_frames(extract_dir, extracted)?;
    debug!(frame_count = frames.len(), ?extract_dir, "frames ordered");
    gif::encode_animation(&frames, output, delay_ms)?;
    Ok(frames.len())
}
