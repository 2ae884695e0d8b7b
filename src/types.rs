//! Core types for artwork-dl

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Unique identifier for a gallery item
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

fn item_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| Regex::new(r"artworks/(\d+)").expect("valid item id pattern"))
}

/// A source URL together with the item ID parsed out of it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemReference {
    url: String,
    id: ItemId,
}

impl ItemReference {
    /// Parse an item page URL such as `https://www.pixiv.net/en/artworks/123456`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the URL carries no numeric item ID.
    pub fn parse(url: &str) -> Result<Self> {
        let id = item_id_pattern()
            .captures(url)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<ItemId>().ok())
            .ok_or_else(|| Error::NotFound(format!("no item ID found in URL '{}'", url)))?;

        Ok(Self {
            url: url.to_string(),
            id,
        })
    }

    /// Source URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parsed item ID
    pub fn id(&self) -> ItemId {
        self.id
    }
}

/// Item record decoded from the page's embedded payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    /// Item ID (the payload carries it as a string)
    #[serde(deserialize_with = "deserialize_item_id")]
    pub id: ItemId,
    /// Thumbnail-style base asset URL
    pub url: String,
    /// Number of pages (at least 1 for valid items)
    #[serde(default = "default_page_count")]
    pub page_count: u32,
    /// Raw asset type tag
    #[serde(rename = "illustType")]
    pub type_tag: i64,
}

fn default_page_count() -> u32 {
    1
}

fn deserialize_item_id<'de, D>(deserializer: D) -> std::result::Result<ItemId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(ItemId(n)),
        RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Asset type of an item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// One still image (tag 0)
    StaticSingle,
    /// One or more still images (tag 1)
    StaticMulti,
    /// Zipped frame sequence played as a loop (tag 2)
    FrameSequence,
}

/// Identifies one download task within an item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId {
    /// Owning item
    pub item: ItemId,
    /// 0-based page index, `None` for a frame archive
    pub page: Option<u32>,
}

impl TaskId {
    /// Task for static page `page`
    pub fn page(item: ItemId, page: u32) -> Self {
        Self {
            item,
            page: Some(page),
        }
    }

    /// Task for the item's frame archive
    pub fn archive(item: ItemId) -> Self {
        Self { item, page: None }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.page {
            Some(page) => write!(f, "{}_p{}", self.item, page),
            None => write!(f, "{}_archive", self.item),
        }
    }
}

/// A single unit of transfer work
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTask {
    /// Task identity (index bound at creation time)
    pub task: TaskId,
    /// Resolved asset URL
    pub url: String,
    /// Final destination path
    pub destination: PathBuf,
}

/// A task that did not complete
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// The failed task
    pub task: TaskId,
    /// Error message
    pub error: String,
}

/// Overall outcome of an item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Every task succeeded
    Complete,
    /// Some tasks succeeded, some failed
    Partial,
    /// No task succeeded
    Failed,
}

/// Result of downloading one item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    /// Item ID
    pub id: ItemId,
    /// Asset type that was processed
    pub kind: AssetKind,
    /// Files published under their final names
    pub files: Vec<PathBuf>,
    /// Tasks that failed
    pub failures: Vec<TaskFailure>,
}

impl ItemReport {
    /// Derive the item status from files and failures
    pub fn status(&self) -> ItemStatus {
        match (self.files.is_empty(), self.failures.is_empty()) {
            (_, true) => ItemStatus::Complete,
            (false, false) => ItemStatus::Partial,
            (true, false) => ItemStatus::Failed,
        }
    }
}

/// Summary of a batch run over many URLs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// URLs fully downloaded and appended to the ledger
    pub completed: Vec<String>,
    /// URLs already present in the ledger
    pub skipped: Vec<String>,
    /// URLs with some failed tasks (not appended to the ledger)
    pub partial: Vec<String>,
    /// URLs that failed with their error message
    pub failed: Vec<(String, String)>,
}

/// Event emitted during the item lifecycle
///
/// Workers only ever send events; nothing reads them back into the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Item metadata resolved and tasks about to be scheduled
    ItemStarted {
        /// Item ID
        id: ItemId,
        /// Asset type
        kind: AssetKind,
        /// Number of tasks the item needs to complete
        total_tasks: u32,
    },

    /// Bytes received for a task
    TaskProgress {
        /// Task
        task: TaskId,
        /// Bytes written so far
        bytes_done: u64,
        /// Declared content length, if the server sent one
        #[serde(skip_serializing_if = "Option::is_none")]
        total_bytes: Option<u64>,
        /// Completion percentage (0.0 to 100.0) when the length is known
        #[serde(skip_serializing_if = "Option::is_none")]
        percent: Option<f32>,
    },

    /// Task finished writing its file (terminal)
    TaskFinished {
        /// Task
        task: TaskId,
    },

    /// Task failed (terminal)
    TaskFailed {
        /// Task
        task: TaskId,
        /// Error message
        error: String,
    },

    /// Item-level counter advanced
    ItemAdvanced {
        /// Item ID
        id: ItemId,
        /// Tasks completed so far
        completed: u32,
        /// Tasks in the item
        total: u32,
    },

    /// Frame assembly started
    Assembling {
        /// Item ID
        id: ItemId,
    },

    /// Every task of the item succeeded
    ItemComplete {
        /// Item ID
        id: ItemId,
        /// Published files
        files: Vec<PathBuf>,
    },

    /// Item finished with some failed tasks
    ItemPartial {
        /// Item ID
        id: ItemId,
        /// Number of failed tasks
        failed: u32,
    },

    /// Item aborted
    ItemFailed {
        /// Item ID
        id: ItemId,
        /// Error message
        error: String,
    },

    /// URL skipped because the ledger already lists it
    ItemSkipped {
        /// Source URL
        url: String,
    },
}
