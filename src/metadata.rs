//! Item metadata retrieval
//!
//! The item page embeds its data as JSON inside
//! `<meta id="meta-preload-data" content="...">`. The record for an item lives
//! under `illust.<any>.userIllusts.<item-id>`.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{ItemId, ItemMetadata, ItemReference};

const PRELOAD_SELECTOR: &str = "meta#meta-preload-data";

/// Fetches item pages and decodes their embedded metadata
#[derive(Clone)]
pub struct MetadataFetcher {
    client: reqwest::Client,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl MetadataFetcher {
    /// Create a fetcher using `headers` for every page request
    pub fn new(client: reqwest::Client, headers: HeaderMap) -> Self {
        Self {
            client,
            headers,
            timeout: None,
        }
    }

    /// Bound each item page request, body included, by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fetch the item page and return the record for `reference`'s ID
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the page status is not 200 or the payload has no record for the ID
    /// - [`Error::Parse`] if the embedded-data marker is missing
    /// - [`Error::MalformedData`] if the marker content is not valid JSON or the record is unusable
    /// - [`Error::Network`] if the request itself fails
    pub async fn fetch(&self, reference: &ItemReference) -> Result<ItemMetadata> {
        debug!(item_id = %reference.id(), url = reference.url(), "fetching item page");

        let mut request = self
            .client
            .get(reference.url())
            .headers(self.headers.clone());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        if response.status() != StatusCode::OK {
            return Err(Error::NotFound(format!(
                "item page {} responded with status {}",
                reference.url(),
                response.status().as_u16()
            )));
        }

        let body = response.text().await?;
        let payload = extract_preload_data(&body)?;
        let metadata = locate_item(&payload, reference.id())?;

        debug!(
            item_id = %metadata.id,
            page_count = metadata.page_count,
            type_tag = metadata.type_tag,
            "resolved item metadata"
        );
        Ok(metadata)
    }
}

/// Extract and decode the embedded preload payload from an item page
pub fn extract_preload_data(html: &str) -> Result<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(PRELOAD_SELECTOR)
        .map_err(|e| Error::Parse(format!("invalid selector '{}': {:?}", PRELOAD_SELECTOR, e)))?;

    let content = document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .ok_or_else(|| Error::Parse("embedded metadata marker not found in item page".into()))?;

    serde_json::from_str(content)
        .map_err(|e| Error::MalformedData(format!("embedded metadata is not valid JSON: {}", e)))
}

/// Locate and decode the record for `id` within a preload payload
pub fn locate_item(payload: &Value, id: ItemId) -> Result<ItemMetadata> {
    let key = id.to_string();

    let record = payload
        .get("illust")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|illusts| illusts.values())
        .filter_map(|illust| illust.get("userIllusts"))
        .filter_map(|user_illusts| user_illusts.get(&key))
        .find(|record| !record.is_null())
        .ok_or_else(|| Error::NotFound(format!("item {} is not present in page metadata", id)))?;

    let metadata: ItemMetadata = serde_json::from_value(record.clone())
        .map_err(|e| Error::MalformedData(format!("item {} record is malformed: {}", id, e)))?;

    if metadata.id != id {
        return Err(Error::MalformedData(format!(
            "record under key {} describes item {}",
            id, metadata.id
        )));
    }
    Ok(metadata)
}
