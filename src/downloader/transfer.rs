//! Single-asset transfer: stream one URL to disk with progress reporting

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::error::{Result, TransferError};
use crate::progress::ProgressAggregator;
use crate::types::DownloadTask;
use crate::utils::partial_path;

/// Everything a worker needs besides the task itself
pub(crate) struct TransferContext<'a> {
    pub(crate) client: &'a reqwest::Client,
    pub(crate) headers: &'a HeaderMap,
    pub(crate) chunk_size: usize,
    /// Longest wait for the response head or for any single body chunk
    pub(crate) idle_timeout: Duration,
    pub(crate) progress: &'a ProgressAggregator,
}

/// Download `task.url` to `task.destination`
///
/// Bytes go to `<destination>.part`, which is renamed into place only after
/// the whole body has been written. A failed transfer leaves nothing behind
/// under either name.
///
/// The asset host answers 403 for some assets it still serves, so both 200
/// and 403 are accepted.
///
/// There is no deadline for the transfer as a whole: it fails with
/// [`TransferError::Stalled`] only when the response head or a body chunk
/// takes longer than `idle_timeout` to arrive.
pub(crate) async fn fetch_to_file(ctx: &TransferContext<'_>, task: &DownloadTask) -> Result<PathBuf> {
    debug!(task = %task.task, url = %task.url, "starting transfer");

    let request = ctx.client.get(&task.url).headers(ctx.headers.clone()).send();
    let mut response = within_idle(ctx, task, request).await??;

    let status = response.status();
    if status != StatusCode::OK && status != StatusCode::FORBIDDEN {
        return Err(TransferError::UnexpectedStatus {
            url: task.url.clone(),
            status: status.as_u16(),
        }
        .into());
    }
    if status == StatusCode::FORBIDDEN {
        warn!(task = %task.task, url = %task.url, "asset host answered 403, saving body anyway");
    }

    let total_bytes = response.content_length();
    let part = partial_path(&task.destination);

    let written = match write_body(ctx, task, &mut response, &part, total_bytes).await {
        Ok(written) => written,
        Err(e) => {
            discard_partial(&part).await;
            return Err(e);
        }
    };
    if let Err(e) = tokio::fs::rename(&part, &task.destination).await {
        discard_partial(&part).await;
        return Err(e.into());
    }

    debug!(
        task = %task.task,
        bytes = written,
        path = ?task.destination,
        "transfer complete"
    );
    Ok(task.destination.clone())
}

async fn write_body(
    ctx: &TransferContext<'_>,
    task: &DownloadTask,
    response: &mut reqwest::Response,
    part: &Path,
    total_bytes: Option<u64>,
) -> Result<u64> {
    let file = tokio::fs::File::create(part).await?;
    let mut writer = BufWriter::with_capacity(ctx.chunk_size, file);

    let mut written: u64 = 0;
    let mut unflushed: usize = 0;
    while let Some(chunk) = within_idle(ctx, task, response.chunk()).await?? {
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
        unflushed += chunk.len();
        if unflushed >= ctx.chunk_size {
            writer.flush().await?;
            unflushed = 0;
            ctx.progress.report(&task.task, written, total_bytes);
        }
    }
    writer.flush().await?;
    if unflushed > 0 || written == 0 {
        ctx.progress.report(&task.task, written, total_bytes);
    }

    if let Some(expected) = total_bytes {
        if written < expected {
            return Err(TransferError::Incomplete {
                url: task.url.clone(),
                expected,
                received: written,
            }
            .into());
        }
    }
    Ok(written)
}

/// Await `future`, failing the task if it stays silent past the read timeout
async fn within_idle<F: Future>(
    ctx: &TransferContext<'_>,
    task: &DownloadTask,
    future: F,
) -> Result<F::Output> {
    tokio::time::timeout(ctx.idle_timeout, future)
        .await
        .map_err(|_| {
            TransferError::Stalled {
                url: task.url.clone(),
                idle: ctx.idle_timeout,
            }
            .into()
        })
}

async fn discard_partial(part: &Path) {
    match tokio::fs::remove_file(part).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = ?part, error = %e, "failed to remove partial file"),
    }
}
