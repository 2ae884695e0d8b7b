//! Shared test helpers: downloader instances backed by temp dirs and a mock origin.

use crate::config::{Config, ORIGIN_REFERER};
use crate::downloader::ArtworkDownloader;
use crate::types::{Event, ItemId};
use image::{Rgba, RgbaImage};
use std::io::Write;
use tempfile::{TempDir, tempdir};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Date path shared by every mocked asset
pub(crate) const ASSET_DATE_PATH: &str = "/img/2024/01/01/00/00/00";

/// Create a downloader whose directories and ledger files live in a tempdir.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader() -> (ArtworkDownloader, TempDir) {
    create_test_downloader_with(|_| {})
}

/// Like [`create_test_downloader`], with a hook to adjust the config first
pub(crate) fn create_test_downloader_with(
    adjust: impl FnOnce(&mut Config),
) -> (ArtworkDownloader, TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("Downloads");
    config.download.single_page_dir = Some(temp_dir.path().join("singles"));
    config.ledger.path = temp_dir.path().join("already_downloaded.txt");
    config.ledger.url_list = temp_dir.path().join("URLs.txt");
    adjust(&mut config);

    let downloader = ArtworkDownloader::new(config).unwrap();
    (downloader, temp_dir)
}

/// Item page URL on the mock origin
pub(crate) fn item_url(server: &MockServer, id: u64) -> String {
    format!("{}/en/artworks/{}", server.uri(), id)
}

/// Square thumbnail URL as it appears in the embedded payload
pub(crate) fn thumbnail_url(server: &MockServer, id: u64) -> String {
    format!(
        "{}/c/250x250_80_a2/img-master{}/{}_p0_square1200.jpg",
        server.uri(),
        ASSET_DATE_PATH,
        id
    )
}

/// Item page HTML carrying the embedded metadata marker
pub(crate) fn item_page_html(id: u64, thumbnail: &str, page_count: u32, type_tag: i64) -> String {
    let payload = serde_json::json!({
        "illust": {
            id.to_string(): {
                "userIllusts": {
                    id.to_string(): {
                        "id": id.to_string(),
                        "url": thumbnail,
                        "pageCount": page_count,
                        "illustType": type_tag
                    }
                }
            }
        }
    });
    format!(
        "<!DOCTYPE html><html><head><meta id=\"meta-preload-data\" content=\"{}\"></head><body></body></html>",
        payload.to_string().replace('"', "&quot;")
    )
}

/// Serve the item page for `id`
pub(crate) async fn mount_item_page(server: &MockServer, id: u64, page_count: u32, type_tag: i64) {
    let html = item_page_html(id, &thumbnail_url(server, id), page_count, type_tag);
    Mock::given(method("GET"))
        .and(path(format!("/en/artworks/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

/// Path of page `page`'s full-resolution image
pub(crate) fn page_image_path(id: u64, page: u32) -> String {
    format!("/img-master{}/{}_p{}_master1200.jpg", ASSET_DATE_PATH, id, page)
}

/// Serve page `page` of `id` with `status` and `body`; the asset header profile is required
pub(crate) async fn mount_page_image(
    server: &MockServer,
    id: u64,
    page: u32,
    status: u16,
    body: Vec<u8>,
) {
    Mock::given(method("GET"))
        .and(path(page_image_path(id, page)))
        .and(header("Referer", ORIGIN_REFERER))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Serve the frame archive of `id`
pub(crate) async fn mount_archive(server: &MockServer, id: u64, status: u16, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/img-zip-ugoira{}/{}_p0_ugoira600x600.zip",
            ASSET_DATE_PATH, id
        )))
        .and(header("Referer", ORIGIN_REFERER))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Deterministic fake image bytes for page `page`
pub(crate) fn page_bytes(page: u32, len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u32 + page * 31) as u8).collect()
}

/// In-memory zip of `count` zero-padded PNG frames
pub(crate) fn frame_archive(count: usize) -> Vec<u8> {
    let mut writer = ::zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for i in 0..count {
        let shade = (i * 40 % 256) as u8;
        let pixels = RgbaImage::from_pixel(4, 4, Rgba([shade, 0, 255 - shade, 255]));
        let mut png = std::io::Cursor::new(Vec::new());
        pixels.write_to(&mut png, image::ImageFormat::Png).unwrap();

        writer
            .start_file(format!("{:06}.png", i), options)
            .unwrap();
        writer.write_all(&png.into_inner()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Collect every event currently buffered on `rx`
pub(crate) fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Number of `ItemAdvanced` events for `id`
pub(crate) fn advanced_count(events: &[Event], id: ItemId) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::ItemAdvanced { id: event_id, .. } if *event_id == id))
        .count()
}
