pub mod model;
pub mod orchestrator;
pub mod poller;
pub mod session;

pub use model::{
    Anomaly, HealthStatus, ScanOutcome, ScanPoll, ScanStatus, ServerAck, Severity, TaskId,
};
pub use orchestrator::{
    Navigator, Notification, NotificationSink, Orchestrator, Route, SessionOutcome,
};
pub use poller::{ProviderPoller, ScanPoller};
pub use session::{FileSummary, Phase, UploadSession};
