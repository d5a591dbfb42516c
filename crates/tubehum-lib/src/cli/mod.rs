mod args;
mod download;
mod params;
mod probe;
mod resolved_command;

pub use args::{Args, Command, parse_args};
pub use download::{SummaryReport, run_download};
pub use params::{DownloadParams, ProbeParams};
pub use probe::run_probe;
pub use resolved_command::{ResolvedCommand, resolve_command};
