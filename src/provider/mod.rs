//! Data providers: where uploads go and where scan results come from.
//!
//! A provider is picked once when the orchestrator is built. The live one
//! talks HTTP to the scanning service, the fixture one simulates it.

pub mod fixture;
pub mod live;

use crate::common::{ProgressFn, ScanError};
use crate::scan::model::{ScanPoll, ServerAck, TaskId};
use crate::transfer::FileRef;

pub use fixture::{FixtureFailure, FixtureProvider};
pub use live::LiveProvider;
pub use crate::scan::model::HealthStatus;

#[async_trait::async_trait]
pub trait ScanProvider: Send + Sync {
    /// Transfer `file` and return the server acknowledgement.
    async fn upload(&self, file: &FileRef, on_progress: ProgressFn) -> Result<ServerAck, ScanError>;

    /// Observe the current state of a scan task once.
    async fn fetch_result(&self, task_id: &TaskId) -> Result<ScanPoll, ScanError>;

    async fn health(&self) -> Result<HealthStatus, ScanError>;

    /// Short label for logs and the CLI banner.
    fn describe(&self) -> String;
}
