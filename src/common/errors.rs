//! Failure taxonomy shared by the transfer, polling and orchestration layers.

use std::time::Duration;
use thiserror::Error;

/// Upload could not be completed. Never retried.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("file '{name}' is empty")]
    EmptyPayload { name: String },
    #[error("invalid upload endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("invalid content type '{0}'")]
    InvalidContentType(String),
    #[error("server rejected upload ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("network error during upload: {0}")]
    Network(#[source] reqwest::Error),
}

/// Scan result could not be obtained for an accepted upload.
#[derive(Debug, Error)]
pub enum PollingFailure {
    #[error("result request failed ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("network error while polling: {0}")]
    Network(#[source] reqwest::Error),
    #[error("no verdict for task {task_id} after {waited:?}")]
    TimedOut { task_id: String, waited: Duration },
    #[error("scan of task {task_id} ended in error")]
    ScanFailed { task_id: String },
}

/// Server payload did not have the expected shape.
#[derive(Debug, Error)]
#[error("{context}: {detail}")]
pub struct MalformedResponse {
    pub context: &'static str,
    pub detail: String,
}

impl MalformedResponse {
    pub fn new(context: &'static str, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

/// Every way a scan session can fail.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Polling(#[from] PollingFailure),
    #[error("malformed server response: {0}")]
    Malformed(#[from] MalformedResponse),
}

impl ScanError {
    /// Message shown to the user when a session fails.
    pub fn user_message(&self) -> String {
        match self {
            ScanError::Transfer(TransferError::EmptyPayload { name }) => {
                format!("'{name}' is empty. Choose a document with content.")
            }
            ScanError::Transfer(TransferError::Status { status, .. }) => {
                format!("The server responded with status {status}. Please try again.")
            }
            ScanError::Transfer(err) => format!("{err}. Please try again."),
            ScanError::Polling(PollingFailure::TimedOut { .. }) => {
                "Scan is taking too long. Please upload the document again.".to_string()
            }
            ScanError::Polling(err) => format!("{err}. Please try again."),
            ScanError::Malformed(err) => {
                format!("Unexpected response from the scanning service ({err}).")
            }
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, ScanError::Transfer(_))
    }
}
