//! Boundary to the external extraction/download program.
//!
//! The rest of the crate only talks to [`MediaExtractor`]; [`YtDlpExtractor`]
//! is the production implementation that shells out to `yt-dlp`, which in
//! turn drives `ffmpeg` for transcoding and, optionally, `aria2c` for
//! downloading.

mod tools;
mod user_agent;
mod ytdlp;

pub use tools::locate_tool;
pub use user_agent::UserAgentPool;
pub use ytdlp::{YtDlpExtractor, YtDlpSettings};

use crate::download::{OutputFormat, Quality, Strategy};
use async_trait::async_trait;
use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exited {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("Malformed extractor output: {reason}")]
    Malformed { reason: String },
}

impl ExtractorError {
    /// The text the failure classifier should look at.
    pub fn detail(&self) -> Cow<'_, str> {
        match self {
            ExtractorError::Exited { stderr, .. } if !stderr.trim().is_empty() => {
                Cow::Borrowed(stderr.as_str())
            }
            other => Cow::Owned(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeKind {
    Single,
    /// Member URLs in collection order, as reported by the extractor.
    Collection { members: Vec<String> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProbeInfo {
    pub title: Option<String>,
    pub kind: ProbeKind,
    pub duration: Option<Duration>,
    pub size_estimate: Option<u64>,
}

/// External accelerator handed to the extractor for non-fragmented downloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accelerator {
    pub program: String,
    pub connections: u32,
    pub split: u32,
    pub min_split_size: String,
}

/// Everything the extractor needs for one fetch attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub url: String,
    pub format: OutputFormat,
    pub quality: Quality,
    pub destination: PathBuf,
    pub strategy: Strategy,
    pub user_agent: Option<String>,
    pub cookies_from_browser: Option<String>,
    pub accelerator: Option<Accelerator>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchedMedia {
    pub title: Option<String>,
    pub path: Option<PathBuf>,
    pub bytes: u64,
    pub duration: Option<Duration>,
}

#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Reads metadata without downloading anything.
    async fn probe(&self, url: &str) -> Result<ProbeInfo, ExtractorError>;

    /// Downloads and post-processes a single item.
    async fn fetch(&self, options: &FetchOptions) -> Result<FetchedMedia, ExtractorError>;
}

pub(crate) fn seconds(value: Option<f64>) -> Option<Duration> {
    value
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}
