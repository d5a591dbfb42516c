use super::BatchProgress;
use crate::download::{ItemOutcome, ItemResult};

/// Receives live updates from a running batch.
pub trait ProgressReporter {
    fn item_finished(&mut self, result: &ItemResult);
    fn progress(&mut self, progress: &BatchProgress);
}

/// Reports through `tracing`, one line per item and per progress update.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn item_finished(&mut self, result: &ItemResult) {
        match &result.outcome {
            ItemOutcome::Success => tracing::info!(
                url = %result.source_url,
                bytes = result.bytes,
                elapsed = ?result.elapsed,
                "Downloaded {}",
                result.title
            ),
            ItemOutcome::Degraded { strategy } => tracing::info!(
                url = %result.source_url,
                bytes = result.bytes,
                elapsed = ?result.elapsed,
                "Downloaded {} (using {})",
                result.title,
                strategy
            ),
            ItemOutcome::Failed { reason, .. } => tracing::warn!(
                url = %result.source_url,
                "Failed to download {}: {}",
                result.title,
                reason
            ),
        }
    }

    fn progress(&mut self, progress: &BatchProgress) {
        tracing::info!(
            succeeded = progress.succeeded,
            failed = progress.failed,
            "{}/{} done, {:.1} MiB at {:.1} KiB/s, remaining {}",
            progress.completed,
            progress.total,
            progress.bytes as f64 / (1024.0 * 1024.0),
            progress.bytes_per_second / 1024.0,
            progress.eta
        );
    }
}
