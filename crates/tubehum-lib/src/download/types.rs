use crate::classify::FailureClass;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Audio bitrates offered for MP3 extraction, in kbit/s.
pub const AUDIO_BITRATES: [u32; 4] = [128, 192, 256, 320];
pub const DEFAULT_AUDIO_BITRATE: u32 = 192;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// MP3 audio with embedded metadata and cover art
    Audio,
    /// MP4 video
    Video,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Audio => f.write_str("audio"),
            OutputFormat::Video => f.write_str("video"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Target bitrate for audio extraction, in kbit/s.
    AudioBitrate(u32),
    /// Upper bound on the video stream height, in pixels.
    MaxHeight(u32),
    Best,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub source_url: String,
    pub format: OutputFormat,
    pub quality: Quality,
    pub destination: PathBuf,
}

/// The strategies tried by the item fetcher, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Primary,
    AlternateCredentials,
    DegradedQuality,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Primary => f.write_str("primary"),
            Strategy::AlternateCredentials => f.write_str("alternate credentials"),
            Strategy::DegradedQuality => f.write_str("degraded quality"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Success,
    /// Succeeded, but only after falling back to a lesser strategy.
    Degraded { strategy: Strategy },
    Failed { class: FailureClass, reason: String },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ItemOutcome::Failed { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub source_url: String,
    pub elapsed: Duration,
    pub outcome: ItemOutcome,
    pub title: String,
    pub bytes: u64,
    pub duration: Option<Duration>,
}

impl ItemResult {
    pub fn failed(
        source_url: impl Into<String>,
        elapsed: Duration,
        class: FailureClass,
        reason: impl Into<String>,
    ) -> Self {
        let source_url = source_url.into();
        Self {
            title: source_url.clone(),
            source_url,
            elapsed,
            outcome: ItemOutcome::Failed {
                class,
                reason: reason.into(),
            },
            bytes: 0,
            duration: None,
        }
    }
}
