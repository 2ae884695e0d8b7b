//! Asset classification

use crate::error::{Error, Result};
use crate::types::{AssetKind, ItemMetadata};

/// What has to be retrieved for an item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetPlan {
    /// `pages` still images, indices `0..pages`
    StaticPages {
        /// Number of pages to retrieve
        pages: u32,
    },
    /// One frame archive to be assembled into an animation
    FrameSequence,
}

impl AssetPlan {
    /// Number of download tasks the plan schedules
    pub fn task_count(&self) -> u32 {
        match self {
            AssetPlan::StaticPages { pages } => *pages,
            AssetPlan::FrameSequence => 1,
        }
    }
}

/// Map the raw type tag to an [`AssetKind`]
pub fn asset_kind(type_tag: i64) -> Result<AssetKind> {
    match type_tag {
        0 => Ok(AssetKind::StaticSingle),
        1 => Ok(AssetKind::StaticMulti),
        2 => Ok(AssetKind::FrameSequence),
        other => Err(Error::UnsupportedType(other)),
    }
}

/// Decide how an item is retrieved
///
/// # Errors
///
/// [`Error::UnsupportedType`] for tags outside 0..=2, [`Error::MalformedData`]
/// when a still-image item declares zero pages.
pub fn classify(metadata: &ItemMetadata) -> Result<(AssetKind, AssetPlan)> {
    let kind = asset_kind(metadata.type_tag)?;
    let plan = match kind {
        AssetKind::StaticSingle | AssetKind::StaticMulti => {
            if metadata.page_count == 0 {
                return Err(Error::MalformedData(format!(
                    "item {} declares zero pages",
                    metadata.id
                )));
            }
            AssetPlan::StaticPages {
                pages: metadata.page_count,
            }
        }
        AssetKind::FrameSequence => AssetPlan::FrameSequence,
    };
    Ok((kind, plan))
}
