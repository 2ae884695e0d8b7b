//! Configuration types for artwork-dl

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf, time::Duration};

/// Referrer the origin expects on every request
pub const ORIGIN_REFERER: &str = "http://www.pixiv.net/";

/// Download behavior configuration (directories, concurrency, assembly)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Root directory for downloads (default: "Downloads")
    ///
    /// Items with more than one page get their own `<root>/<item-id>/` folder.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Directory for single-page items (default: same as `download_dir`)
    #[serde(default)]
    pub single_page_dir: Option<PathBuf>,

    /// Maximum concurrent transfers per item (default: 4)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Write buffer and progress granularity in bytes (default: 8 KiB)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Delay between frames of an assembled animation in milliseconds (default: 100)
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            single_page_dir: None,
            max_workers: default_max_workers(),
            chunk_size: default_chunk_size(),
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

/// HTTP behavior: request timeout and the two header profiles the origin expects
///
/// Item pages are fetched with `page_headers`; image and archive assets with
/// `asset_headers`, whose browser-like profile the asset hosts require.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connect timeout and longest wait for any single read (default: 20 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Headers sent when fetching an item page
    #[serde(default = "default_page_headers")]
    pub page_headers: BTreeMap<String, String>,

    /// Headers sent when fetching image or archive assets
    #[serde(default = "default_asset_headers")]
    pub asset_headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            page_headers: default_page_headers(),
            asset_headers: default_asset_headers(),
        }
    }
}

impl HttpConfig {
    /// Header map for item page requests
    pub fn page_header_map(&self) -> Result<HeaderMap> {
        header_map(&self.page_headers, "page_headers")
    }

    /// Header map for asset requests
    pub fn asset_header_map(&self) -> Result<HeaderMap> {
        header_map(&self.asset_headers, "asset_headers")
    }
}

/// Locations of the processed-URL ledger and the pending URL list
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Newline-delimited list of already processed URLs (default: "already_downloaded.txt")
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,

    /// Newline-delimited list of URLs to process (default: "URLs.txt")
    #[serde(default = "default_url_list")]
    pub url_list: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            url_list: default_url_list(),
        }
    }
}

/// Main configuration for ArtworkDownloader
///
/// Passed by value into [`ArtworkDownloader::new`](crate::ArtworkDownloader::new);
/// components receive the pieces they need instead of reading process-wide constants.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// HTTP timeout and header profiles
    #[serde(default)]
    pub http: HttpConfig,

    /// Ledger and URL list locations
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl Config {
    /// Download root directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Directory that receives single-page items
    pub fn single_page_dir(&self) -> &PathBuf {
        self.download
            .single_page_dir
            .as_ref()
            .unwrap_or(&self.download.download_dir)
    }

    /// Check settings that would otherwise fail late (zero worker cap, bad headers)
    pub fn validate(&self) -> Result<()> {
        if self.download.max_workers == 0 {
            return Err(config_error("max_workers must be greater than zero", "max_workers"));
        }
        if self.download.chunk_size == 0 {
            return Err(config_error("chunk_size must be greater than zero", "chunk_size"));
        }
        if self.download.frame_delay_ms == 0 {
            return Err(config_error(
                "frame_delay_ms must be greater than zero",
                "frame_delay_ms",
            ));
        }
        self.http.page_header_map()?;
        self.http.asset_header_map()?;
        Ok(())
    }
}

fn config_error(message: impl Into<String>, key: &str) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn header_map(headers: &BTreeMap<String, String>, key: &str) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| config_error(format!("invalid header name '{}': {}", name, e), key))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| config_error(format!("invalid value for header '{}': {}", name, e), key))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("Downloads")
}

fn default_max_workers() -> usize {
    4
}

fn default_chunk_size() -> usize {
    8 * 1024
}

fn default_frame_delay_ms() -> u32 {
    100
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_page_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Referer".to_string(), ORIGIN_REFERER.to_string())])
}

fn default_asset_headers() -> BTreeMap<String, String> {
    [
        (
            "User-Agent",
            "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:136.0) Gecko/20100101 Firefox/136.0",
        ),
        ("Accept", "application/json"),
        ("Accept-Language", "en-US,en;q=0.5"),
        ("Referer", ORIGIN_REFERER),
        ("Sec-Fetch-Dest", "empty"),
        ("Sec-Fetch-Mode", "cors"),
        ("Sec-Fetch-Site", "same-origin"),
        ("Connection", "keep-alive"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("already_downloaded.txt")
}

fn default_url_list() -> PathBuf {
    PathBuf::from("URLs.txt")
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
