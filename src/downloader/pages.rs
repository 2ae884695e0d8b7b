//! Still-image items: one task per page through a bounded worker pool

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::error::Result;
use crate::types::{AssetKind, DownloadTask, ItemMetadata, ItemReport, TaskFailure, TaskId};
use crate::url_rewrite::image_url;
use crate::utils::{extension_from_url, page_filename};

use super::ArtworkDownloader;

/// Build the `pages` tasks of an item, page indices bound here
pub(crate) fn page_tasks(metadata: &ItemMetadata, pages: u32, destination: &Path) -> Vec<DownloadTask> {
    (0..pages)
        .map(|page| {
            let url = image_url(&metadata.url, page);
            let extension = extension_from_url(&url);
            DownloadTask {
                task: TaskId::page(metadata.id, page),
                destination: destination.join(page_filename(metadata.id, page, &extension)),
                url,
            }
        })
        .collect()
}

/// Download every page, at most `max_workers` at a time
///
/// Each task yields its own result; a failed page never stops its siblings.
pub(super) async fn download_pages(
    downloader: &ArtworkDownloader,
    metadata: &ItemMetadata,
    kind: AssetKind,
    pages: u32,
    destination: &Path,
) -> Result<ItemReport> {
    let tasks = page_tasks(metadata, pages, destination);
    let concurrency = downloader.config.download.max_workers;
    debug!(item_id = %metadata.id, pages, concurrency, "scheduling page downloads");

    let mut results: Vec<(DownloadTask, Result<PathBuf>)> = stream::iter(tasks)
        .map(|task| async move {
            let result = downloader.run_task(&task).await;
            if result.is_ok() {
                downloader.progress.report_done(task.task.item);
            }
            (task, result)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    // Report in page order regardless of completion order
    results.sort_by_key(|(task, _)| task.task.page);

    let mut report = ItemReport {
        id: metadata.id,
        kind,
        files: Vec::with_capacity(results.len()),
        failures: Vec::new(),
    };
    for (task, result) in results {
        match result {
            Ok(path) => report.files.push(path),
            Err(e) if e.is_task_scoped() => report.failures.push(TaskFailure {
                task: task.task,
                error: e.to_string(),
            }),
            // Local write failures (disk full, permissions) are not page-specific
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}
