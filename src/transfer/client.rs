//! Single multipart upload with byte-level progress.

use crate::common::{ProgressFn, ProgressReporter, ScanError, TransferError};
use crate::scan::model::ServerAck;
use crate::transfer::FileRef;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::sync::Arc;

/// Upload route, relative to the API base address.
pub const UPLOAD_ROUTE: &str = "scan/upload";
/// Multipart field the scanning service reads the document from.
pub const FILE_FIELD: &str = "file";

const STREAM_PIECE: usize = 64 * 1024;

/// Performs one outbound file transfer per call and keeps nothing between calls.
#[derive(Clone, Debug, Default)]
pub struct TransferClient {
    http: reqwest::Client,
}

impl TransferClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Resolve the upload endpoint against a base address ending in `/`.
    pub fn endpoint(base: &Url) -> Result<Url, TransferError> {
        base.join(UPLOAD_ROUTE)
            .map_err(|_| TransferError::InvalidEndpoint(format!("{base}{UPLOAD_ROUTE}")))
    }

    /// Upload `file` to `endpoint`, reporting progress through `on_progress`.
    ///
    /// Emissions are clamped to 0..=100 and never decrease. A successful call
    /// always ends with exactly one emission of 100.
    #[tracing::instrument(skip_all, fields(file = %file.name(), size = file.size()))]
    pub async fn send(
        &self,
        endpoint: &Url,
        file: &FileRef,
        on_progress: ProgressFn,
    ) -> Result<ServerAck, ScanError> {
        if file.is_empty() {
            return Err(TransferError::EmptyPayload {
                name: file.name().to_string(),
            }
            .into());
        }

        let reporter = Arc::new(ProgressReporter::new(file.size(), on_progress));
        reporter.report_percent(0);

        let part = Part::stream_with_length(
            progress_body(file.payload().clone(), reporter.clone()),
            file.size(),
        )
        .file_name(file.name().to_string())
        .mime_str(file.content_type())
        .map_err(|_| TransferError::InvalidContentType(file.content_type().to_string()))?;
        let form = Form::new().part(FILE_FIELD, part);

        tracing::debug!(%endpoint, "Starting upload");
        let response = self
            .http
            .post(endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(TransferError::Network)?;

        let status = response.status();
        let body = response.bytes().await.map_err(TransferError::Network)?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Upload rejected");
            return Err(TransferError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }
            .into());
        }

        let ack = ServerAck::decode(&body)?;
        reporter.finish();
        tracing::info!(task_id = %ack.task_id, "Upload accepted");
        Ok(ack)
    }
}

/// Request body that reports cumulative bytes as the transport pulls them.
fn progress_body(payload: Bytes, reporter: Arc<ProgressReporter>) -> reqwest::Body {
    let total = payload.len();
    let pieces: Vec<Bytes> = (0..total)
        .step_by(STREAM_PIECE)
        .map(|start| payload.slice(start..(start + STREAM_PIECE).min(total)))
        .collect();

    let mut sent = 0u64;
    let stream = futures::stream::iter(pieces).map(move |piece| {
        sent += piece.len() as u64;
        reporter.report_bytes(sent);
        Ok::<_, std::io::Error>(piece)
    });

    reqwest::Body::wrap_stream(stream)
}
