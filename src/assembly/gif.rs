use crate::error::{AssemblyError, Result};
use crate::utils::partial_path;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use std::path::{Path, PathBuf};

fn encode_error(output: &Path, reason: impl std::fmt::Display) -> AssemblyError {
    AssemblyError::Encode {
        output: output.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Encode `frames` (already in playback order) as an endlessly looping GIF at `output`
///
/// Each frame is shown for `delay_ms`. The animation is built in memory and
/// only written under `output` once complete.
pub(crate) fn encode_animation(frames: &[PathBuf], output: &Path, delay_ms: u32) -> Result<()> {
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| encode_error(output, e))?;

        for frame_path in frames {
            let rgba = image::open(frame_path)
                .map_err(|e| AssemblyError::Decode {
                    frame: frame_path.clone(),
                    reason: e.to_string(),
                })?
                .to_rgba8();
            let frame = Frame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
            encoder
                .encode_frame(frame)
                .map_err(|e| encode_error(output, e))?;
        }
    }

    let part = partial_path(output);
    if let Err(e) = std::fs::write(&part, &buffer).and_then(|()| std::fs::rename(&part, output)) {
        std::fs::remove_file(&part).ok();
        return Err(encode_error(output, e).into());
    }
    Ok(())
}
