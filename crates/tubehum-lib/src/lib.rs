pub mod batch;
pub mod classify;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod resolver;
pub mod workspace;

pub use config::Config;
pub use error::TubeHumError;
