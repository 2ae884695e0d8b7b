//! Filename and path helpers shared by the downloader and the frame assembler

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::types::ItemId;

/// Extension used when the asset URL path carries none
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Suffix of in-flight files, renamed away once complete
const PARTIAL_SUFFIX: &str = ".part";

/// File extension (with leading dot) of the URL's path, or [`DEFAULT_EXTENSION`]
///
/// Query strings and fragments are ignored.
///
/// # Examples
///
/// ```
/// use artwork_dl::utils::extension_from_url;
///
/// assert_eq!(extension_from_url("https://i.example.net/a/1_p0_master1200.png?x=1"), ".png");
/// assert_eq!(extension_from_url("https://i.example.net/a/noext"), ".jpg");
/// ```
pub fn extension_from_url(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// `<id>_p<page>_master1200<ext>`
pub fn page_filename(id: ItemId, page: u32, extension: &str) -> String {
    format!("{}_p{}_master1200{}", id, page, extension)
}

/// `<id>.zip`
pub fn archive_filename(id: ItemId) -> String {
    format!("{}.zip", id)
}

/// `<id>.gif`
pub fn animation_filename(id: ItemId) -> String {
    format!("{}.gif", id)
}

/// `<id>_extracted`
pub fn extraction_dir_name(id: ItemId) -> String {
    format!("{}_extracted", id)
}

/// Sibling path that receives bytes until the file is complete
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}
