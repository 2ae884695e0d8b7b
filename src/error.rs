//! Error types for artwork-dl
//!
//! This module provides the error taxonomy used across the pipeline:
//! - Item-level errors (lookup, page parsing, unsupported asset types)
//! - Transfer errors raised by individual download tasks
//! - Assembly errors raised while building an animated artifact from frames

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for artwork-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for artwork-dl
///
/// Each variant carries enough context to produce a useful log line without
/// the caller having to re-attach the item or path involved.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_workers")
        key: Option<String>,
    },

    /// Item could not be located (no ID in the URL, non-200 item page, or the
    /// ID is absent from the embedded payload)
    #[error("not found: {0}")]
    NotFound(String),

    /// The item page did not contain the embedded metadata marker
    #[error("parse error: {0}")]
    Parse(String),

    /// The embedded metadata was present but not usable
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// The item's asset type tag is outside the supported set
    #[error("unsupported asset type tag: {0}")]
    UnsupportedType(i64),

    /// A download task failed
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Frame sequence assembly failed
    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// Ledger could not be read or appended
    #[error("ledger error: {0}")]
    Ledger(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is scoped to a single download task.
    ///
    /// Transfer and network errors are isolated to the task that raised them;
    /// everything else (metadata, classification, assembly, local I/O) ends the item.
    pub fn is_task_scoped(&self) -> bool {
        matches!(self, Error::Transfer(_) | Error::Network(_))
    }
}

/// Errors raised while retrieving a single page or archive
#[derive(Debug, Error)]
pub enum TransferError {
    /// The asset host answered with a status other than 200 or 403
    #[error("unable to download {url}: server responded with status code {status}")]
    UnexpectedStatus {
        /// Requested asset URL
        url: String,
        /// HTTP status code returned by the asset host
        status: u16,
    },

    /// The body ended before the declared content length was received
    #[error("incomplete body for {url}: expected {expected} bytes, received {received}")]
    Incomplete {
        /// Requested asset URL
        url: String,
        /// Declared content length
        expected: u64,
        /// Bytes actually received
        received: u64,
    },

    /// No response or body data arrived within the read timeout
    #[error("{url} stalled: no data received for {idle:?}")]
    Stalled {
        /// Requested asset URL
        url: String,
        /// Read timeout that elapsed
        idle: Duration,
    },
}

/// Errors raised while turning a frame archive into an animated artifact
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The archive could not be opened or an entry could not be extracted
    #[error("extraction failed for {archive}: {reason}")]
    Extraction {
        /// The archive being extracted
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// No decodable frame files were found in the extracted archive
    #[error("no frames found in {dir}")]
    NoFrames {
        /// Extraction directory that was scanned
        dir: PathBuf,
    },

    /// Frame filenames do not sort lexically in sequence order
    #[error("frame names in {dir} are not zero-padded sequential: {reason}")]
    UnsortableFrames {
        /// Extraction directory that was scanned
        dir: PathBuf,
        /// Which names broke the ordering precondition
        reason: String,
    },

    /// A frame could not be decoded as an image
    #[error("failed to decode frame {frame}: {reason}")]
    Decode {
        /// Frame file that failed to decode
        frame: PathBuf,
        /// Decoder error message
        reason: String,
    },

    /// The composite animation could not be encoded or written
    #[error("failed to encode animation {output}: {reason}")]
    Encode {
        /// Output path of the animated artifact
        output: PathBuf,
        /// Encoder error message
        reason: String,
    },
}
