//! Thumbnail URL rewriting
//!
//! The item payload only carries a thumbnail-style URL such as
//! `https://i.pximg.net/c/250x250_80_a2/img-master/img/2024/01/02/03/04/05/123456_p0_square1200.jpg`.
//! These pure transforms map it to the full-resolution still image for a
//! given page, or to the frame archive of an animated item. Unmatched
//! patterns pass through unchanged; a wrong URL surfaces later as an HTTP
//! status from the asset host.

use regex::Regex;
use std::sync::OnceLock;

const MASTER_PATH: &str = "/img-master";
const ARCHIVE_PATH: &str = "/img-zip-ugoira";
const MASTER_SUFFIX: &str = "_master1200.jpg";
const ARCHIVE_SUFFIX: &str = "_ugoira600x600.zip";

struct Patterns {
    thumb_path: Regex,
    thumb_suffix: Regex,
    page_token: Regex,
}

#[allow(clippy::expect_used)]
fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        thumb_path: Regex::new(r"/c/250x250_80_a2/(?:custom-thumb|img-master)")
            .expect("valid thumbnail path pattern"),
        thumb_suffix: Regex::new(r"_(?:square1200|custom1200)\.jpg$")
            .expect("valid thumbnail suffix pattern"),
        page_token: Regex::new(r"p\d+").expect("valid page token pattern"),
    })
}

/// Full-resolution still image URL for 0-based page `page`
pub fn image_url(base_url: &str, page: u32) -> String {
    let p = patterns();
    let url = p.thumb_path.replace_all(base_url, MASTER_PATH);
    let url = p.thumb_suffix.replace(&url, MASTER_SUFFIX);
    p.page_token
        .replace_all(&url, format!("p{}", page).as_str())
        .into_owned()
}

/// Frame archive URL of an animated item
pub fn archive_url(base_url: &str) -> String {
    let p = patterns();
    let url = p.thumb_path.replace_all(base_url, ARCHIVE_PATH);
    p.thumb_suffix.replace(&url, ARCHIVE_SUFFIX).into_owned()
}
