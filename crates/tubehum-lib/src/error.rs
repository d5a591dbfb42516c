use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TubeHumError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid command-line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Required tool {tool} is not available: {reason}")]
    ToolNotFound { tool: String, reason: String },

    #[error("Could not resolve source: {0}")]
    Resolution(#[from] crate::resolver::ResolutionError),

    #[error("Destination directory creation failed at {path}: {reason}")]
    DestinationDirectoryCreation { path: PathBuf, reason: String },

    #[error("Failed to write summary to {path}: {reason}")]
    SummaryWrite { path: PathBuf, reason: String },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
