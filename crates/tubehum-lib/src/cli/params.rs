use crate::batch::BatchOptions;
use crate::config::Config;
use crate::download::{OutputFormat, Quality};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DownloadParams {
    /// Loaded configuration with command-line overrides already applied.
    pub app_config: Config,
    pub url: String,
    pub format: OutputFormat,
    pub quality: Quality,
    pub batch: BatchOptions,
    pub summary_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProbeParams {
    pub app_config: Config,
    pub url: String,
}
