mod types;

pub use types::{
    AUDIO_BITRATES, DEFAULT_AUDIO_BITRATE, DownloadRequest, ItemOutcome, ItemResult, OutputFormat,
    Quality, Strategy,
};
