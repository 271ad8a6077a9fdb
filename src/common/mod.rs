pub mod config;
pub mod config_commands;
pub mod errors;
pub mod progress;

pub use config::{AppConfig, ProviderMode};
pub use errors::{MalformedResponse, PollingFailure, ScanError, TransferError};
pub use progress::{percent_of, ProgressFn, ProgressReporter};
