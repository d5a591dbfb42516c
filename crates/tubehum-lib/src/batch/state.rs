use crate::download::ItemResult;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Estimated time until the batch completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eta {
    /// Nothing has succeeded yet, so there is no average to go by.
    Unknown,
    Remaining(Duration),
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Unknown => f.write_str("--:--"),
            Eta::Remaining(remaining) => {
                let secs = remaining.as_secs();
                let (hours, minutes, seconds) = (secs / 3600, (secs / 60) % 60, secs % 60);
                if hours > 0 {
                    write!(f, "{hours}:{minutes:02}:{seconds:02}")
                } else {
                    write!(f, "{minutes:02}:{seconds:02}")
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    /// Successes that needed a fallback strategy; included in `succeeded`.
    pub degraded: usize,
    pub failed: usize,
    pub bytes: u64,
    pub eta: Eta,
    pub bytes_per_second: f64,
    pub cancelled: bool,
}

/// Running totals for one batch. Only the coordinator mutates it.
#[derive(Debug)]
pub struct BatchState {
    total: usize,
    completed: usize,
    succeeded: usize,
    degraded: usize,
    failed: usize,
    bytes: u64,
    cancelled: bool,
    success_times: Vec<Duration>,
    started: Instant,
}

impl BatchState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            succeeded: 0,
            degraded: 0,
            failed: 0,
            bytes: 0,
            cancelled: false,
            success_times: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn record(&mut self, result: &ItemResult) {
        self.completed += 1;
        if result.outcome.is_success() {
            self.succeeded += 1;
            if !matches!(result.outcome, crate::download::ItemOutcome::Success) {
                self.degraded += 1;
            }
            self.bytes += result.bytes;
            self.success_times.push(result.elapsed);
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn eta(&self) -> Eta {
        if self.success_times.is_empty() {
            return Eta::Unknown;
        }
        let average = self.success_times.iter().sum::<Duration>() / self.success_times.len() as u32;
        let remaining = self.total.saturating_sub(self.completed) as u32;
        Eta::Remaining(average * remaining)
    }

    pub fn bytes_per_second(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.bytes as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> BatchProgress {
        BatchProgress {
            total: self.total,
            completed: self.completed,
            succeeded: self.succeeded,
            degraded: self.degraded,
            failed: self.failed,
            bytes: self.bytes,
            eta: self.eta(),
            bytes_per_second: self.bytes_per_second(),
            cancelled: self.cancelled,
        }
    }
}
