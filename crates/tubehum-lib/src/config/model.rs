use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub accelerator: AcceleratorConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            download: DownloadConfig::default(),
            tools: ToolsConfig::default(),
            accelerator: AcceleratorConfig::default(),
            credentials: CredentialsConfig::default(),
            user_agents: default_user_agents(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    /// Directory under which one destination directory is created per batch.
    pub base_dir: PathBuf,
    /// Name prefix for destination directories of single-item batches.
    pub dir_prefix: String,
    /// File name suffixes removed from the destination once a batch ends.
    pub temp_extensions: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("downloads"),
            dir_prefix: "tubehum".to_string(),
            temp_extensions: [".jpg", ".png", ".webp", ".part", ".ytdl", ".temp"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DownloadConfig {
    pub workers: usize,
    pub item_timeout_secs: u64,
    pub cancel_grace_secs: u64,
    pub probe_timeout_secs: u64,
    pub audio_bitrate: u32,
    pub retries: u32,
    pub fragment_retries: u32,
    pub socket_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            item_timeout_secs: 1800,
            cancel_grace_secs: 30,
            probe_timeout_secs: 120,
            audio_bitrate: crate::download::DEFAULT_AUDIO_BITRATE,
            retries: 10,
            fragment_retries: 10,
            socket_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ToolsConfig {
    /// Explicit yt-dlp binary; looked up on PATH when unset.
    pub yt_dlp: Option<PathBuf>,
    /// Passed to yt-dlp as --ffmpeg-location.
    pub ffmpeg_location: Option<PathBuf>,
    pub aria2c: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct AcceleratorConfig {
    pub enabled: bool,
    pub connections: u32,
    pub split: u32,
    pub min_split_size: String,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            connections: 16,
            split: 16,
            min_split_size: "1M".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct CredentialsConfig {
    /// Browser whose stored cookies are used by the alternate-credentials strategy.
    pub cookies_from_browser: Option<String>,
}

pub fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64; rv:132.0) Gecko/20100101 Firefox/132.0",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
