//! Frame-sequence items: download the archive, then assemble it

use std::path::Path;

use crate::error::Result;
use crate::types::{
    AssetKind, DownloadTask, Event, ItemMetadata, ItemReport, TaskFailure, TaskId,
};
use crate::url_rewrite::archive_url;
use crate::utils::archive_filename;

use super::ArtworkDownloader;

/// The single archive task of a frame-sequence item
pub(crate) fn archive_task(metadata: &ItemMetadata, destination: &Path) -> DownloadTask {
    DownloadTask {
        task: TaskId::archive(metadata.id),
        url: archive_url(&metadata.url),
        destination: destination.join(archive_filename(metadata.id)),
    }
}

/// Download and assemble a frame sequence
///
/// The item counter advances only once the animation is written. A failed
/// archive transfer is reported like a failed page; assembly errors end the
/// item.
pub(super) async fn download_sequence(
    downloader: &ArtworkDownloader,
    metadata: &ItemMetadata,
    destination: &Path,
) -> Result<ItemReport> {
    let id = metadata.id;
    let task = archive_task(metadata, destination);

    let mut report = ItemReport {
        id,
        kind: AssetKind::FrameSequence,
        files: Vec::new(),
        failures: Vec::new(),
    };

    let archive = match downloader.run_task(&task).await {
        Ok(archive) => archive,
        Err(e) if e.is_task_scoped() => {
            report.failures.push(TaskFailure {
                task: task.task,
                error: e.to_string(),
            });
            return Ok(report);
        }
        Err(e) => return Err(e),
    };

    downloader.progress.emit(Event::Assembling { id });
    let animation = downloader
        .assembler
        .assemble(&archive, destination, id)
        .await?;
    downloader.progress.report_done(id);

    report.files.push(animation);
    Ok(report)
}
