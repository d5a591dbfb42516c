mod processor;
mod reporter;
mod state;

pub use processor::{BatchEvent, BatchOptions, BatchProcessor, BatchRun, BatchSummary};
pub use reporter::{ProgressReporter, TracingReporter};
pub use state::{BatchProgress, BatchState, Eta};
