use crate::error::{AssemblyError, Result};
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Whether `path` names a still image usable as a frame
pub(crate) fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Numeric value of the trailing digit run of the file stem (`frame_010` -> 10)
fn sequence_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    stem[digits_start..].parse().ok()
}

fn frame_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Select the frames among `files` and return them in playback order
///
/// Playback order is the lexical order of the file names. That order is only
/// accepted when every name ends in a sequence number and the numbers strictly
/// increase along it, which holds for zero-padded names.
pub(crate) fn order_frames(dir: &Path, files: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = files.into_iter().filter(|path| is_frame(path)).collect();
    if frames.is_empty() {
        return Err(AssemblyError::NoFrames {
            dir: dir.to_path_buf(),
        }
        .into());
    }
    frames.sort_by_key(|path| frame_name(path));

    let mut previous: Option<(u64, String)> = None;
    for frame in &frames {
        let name = frame_name(frame);
        let number = sequence_number(frame).ok_or_else(|| AssemblyError::UnsortableFrames {
            dir: dir.to_path_buf(),
            reason: format!("'{}' carries no sequence number", name),
        })?;
        if let Some((prev_number, prev_name)) = &previous {
            if number <= *prev_number {
                return Err(AssemblyError::UnsortableFrames {
                    dir: dir.to_path_buf(),
                    reason: format!(
                        "'{}' sorts after '{}' but its sequence number {} is not greater than {}",
                        name, prev_name, number, prev_number
                    ),
                }
                .into());
            }
        }
        previous = Some((number, name));
    }

    Ok(frames)
}
