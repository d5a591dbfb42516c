use crate::batch::{BatchProcessor, BatchSummary, TracingReporter};
use crate::cli::DownloadParams;
use crate::config::Config;
use crate::download::DownloadRequest;
use crate::error::TubeHumError;
use crate::extractor::{Accelerator, UserAgentPool, YtDlpExtractor, YtDlpSettings, locate_tool};
use crate::fetcher::{FetcherSettings, ItemFetcher};
use crate::resolver::{SourceKind, resolve_source};
use crate::workspace::{cleanup_temp_files, create_destination};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What `--summary` writes: the batch summary plus where the files went.
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub source_url: &'a str,
    pub destination: &'a Path,
    #[serde(flatten)]
    pub summary: &'a BatchSummary,
}

pub(crate) fn build_extractor(app_config: &Config) -> Result<YtDlpExtractor, TubeHumError> {
    let yt_dlp = locate_tool(app_config.tools.yt_dlp.as_deref(), "yt-dlp").ok_or_else(|| {
        TubeHumError::ToolNotFound {
            tool: "yt-dlp".to_string(),
            reason: match &app_config.tools.yt_dlp {
                Some(path) => format!("{} does not exist", path.display()),
                None => "not found on PATH; install it or set tools.yt_dlp".to_string(),
            },
        }
    })?;
    tracing::debug!(path = %yt_dlp.display(), "Using yt-dlp");

    if locate_tool(app_config.tools.ffmpeg_location.as_deref(), "ffmpeg").is_none() {
        tracing::warn!("ffmpeg was not found; audio extraction and merging will likely fail");
    }

    let download = &app_config.download;
    Ok(YtDlpExtractor::new(
        yt_dlp,
        YtDlpSettings {
            ffmpeg_location: app_config.tools.ffmpeg_location.clone(),
            retries: download.retries,
            fragment_retries: download.fragment_retries,
            socket_timeout: Duration::from_secs(download.socket_timeout_secs),
            probe_timeout: Duration::from_secs(download.probe_timeout_secs),
        },
    ))
}

fn resolve_accelerator(app_config: &Config) -> Option<Accelerator> {
    let accelerator = &app_config.accelerator;
    if !accelerator.enabled {
        return None;
    }

    match locate_tool(app_config.tools.aria2c.as_deref(), "aria2c") {
        Some(program) => Some(Accelerator {
            program: program.to_string_lossy().into_owned(),
            connections: accelerator.connections,
            split: accelerator.split,
            min_split_size: accelerator.min_split_size.clone(),
        }),
        None => {
            tracing::warn!("aria2c was not found, downloading without the accelerator");
            None
        }
    }
}

fn write_summary(path: &Path, report: &SummaryReport<'_>) -> Result<(), TubeHumError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|e| TubeHumError::SummaryWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// The first Ctrl-C stops new items from starting; a second one also stops
/// the items already running.
async fn watch_interrupts(cancel: CancellationToken, stop_now: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    tracing::warn!("Interrupted, cancelling the remaining items (press Ctrl-C again to stop now)");
    cancel.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Interrupted again, stopping running items");
        stop_now.cancel();
    }
}

pub async fn run_download(params: DownloadParams) -> Result<BatchSummary, TubeHumError> {
    let DownloadParams {
        app_config,
        url,
        format,
        quality,
        batch,
        summary_path,
    } = params;

    let extractor = Arc::new(build_extractor(&app_config)?);
    let resolved = resolve_source(extractor.as_ref(), &url).await?;

    let title = match resolved.kind {
        SourceKind::Collection => resolved.title.as_deref(),
        SourceKind::Single => None,
    };
    let destination: PathBuf = create_destination(
        &app_config.output.base_dir,
        &app_config.output.dir_prefix,
        title,
    )?;

    let requests: Vec<DownloadRequest> = resolved
        .items
        .iter()
        .map(|item| DownloadRequest {
            source_url: item.clone(),
            format,
            quality,
            destination: destination.clone(),
        })
        .collect();

    let fetcher = ItemFetcher::new(
        extractor,
        FetcherSettings {
            cookies_from_browser: app_config.credentials.cookies_from_browser.clone(),
            accelerator: resolve_accelerator(&app_config),
            user_agents: UserAgentPool::new(app_config.user_agents.clone()),
        },
    );

    let cancel = CancellationToken::new();
    let stop_now = CancellationToken::new();
    let ctrl_c = tokio::spawn(watch_interrupts(cancel.clone(), stop_now.clone()));

    tracing::info!(
        items = requests.len(),
        workers = batch.workers,
        format = %format,
        "Starting download"
    );
    let processor = BatchProcessor::new(Arc::new(fetcher), batch);
    let summary = processor
        .start(requests, cancel)
        .with_stop_token(stop_now)
        .run_to_end(&mut TracingReporter)
        .await;
    ctrl_c.abort();

    match cleanup_temp_files(&destination, &app_config.output.temp_extensions) {
        Ok(removed) => tracing::debug!(removed, "Cleaned up temporary files"),
        Err(e) => tracing::warn!("Cleanup of {} failed: {}", destination.display(), e),
    }

    if let Some(summary_path) = &summary_path {
        write_summary(
            summary_path,
            &SummaryReport {
                source_url: &resolved.url,
                destination: &destination,
                summary: &summary,
            },
        )?;
        tracing::info!("Summary written to {}", summary_path.display());
    }

    let progress = &summary.progress;
    if progress.cancelled {
        tracing::warn!(
            "Cancelled after {} of {} items",
            progress.completed,
            progress.total
        );
    }
    if progress.failed > 0 {
        tracing::warn!(
            "{} of {} items failed to download",
            progress.failed,
            progress.total
        );
    }
    tracing::info!(
        "Finished in {:.1}s: {} succeeded ({} degraded), {} failed, files in {}",
        summary.elapsed.as_secs_f64(),
        progress.succeeded,
        progress.degraded,
        progress.failed,
        destination.display()
    );

    Ok(summary)
}
