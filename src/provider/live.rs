use super::ScanProvider;
use crate::common::{AppConfig, PollingFailure, ProgressFn, ScanError};
use crate::scan::model::{HealthStatus, ScanPoll, ServerAck, TaskId};
use crate::transfer::{FileRef, TransferClient};
use anyhow::{Context, Result};
use reqwest::Url;

pub const RESULT_ROUTE: &str = "scan/result/";
pub const HEALTH_ROUTE: &str = "health";

/// HTTP provider backed by the scanning service.
#[derive(Clone, Debug)]
pub struct LiveProvider {
    http: reqwest::Client,
    transfer: TransferClient,
    base_url: Url,
    upload_url: Url,
    result_base: Url,
    health_url: Url,
}

impl LiveProvider {
    pub fn new(base_url: Url, http: reqwest::Client) -> Result<Self> {
        let upload_url = TransferClient::endpoint(&base_url)?;
        let result_base = base_url
            .join(RESULT_ROUTE)
            .context("Failed to build scan result URL")?;
        let health_url = base_url
            .join(HEALTH_ROUTE)
            .context("Failed to build health URL")?;
        Ok(Self {
            transfer: TransferClient::new(http.clone()),
            http,
            base_url,
            upload_url,
            result_base,
            health_url,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Self::new(config.base_url()?, http)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn result_url(&self, task_id: &TaskId) -> Url {
        let mut url = self.result_base.clone();
        // Push as a path segment so the id is percent-encoded
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(task_id.as_str());
        }
        url
    }

    async fn get(&self, url: Url) -> Result<bytes::Bytes, ScanError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(PollingFailure::Network)?;
        let status = response.status();
        let body = response.bytes().await.map_err(PollingFailure::Network)?;
        if !status.is_success() {
            return Err(PollingFailure::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }
            .into());
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl ScanProvider for LiveProvider {
    async fn upload(
        &self,
        file: &FileRef,
        on_progress: ProgressFn,
    ) -> Result<ServerAck, ScanError> {
        self.transfer.send(&self.upload_url, file, on_progress).await
    }

    async fn fetch_result(&self, task_id: &TaskId) -> Result<ScanPoll, ScanError> {
        let body = self.get(self.result_url(task_id)).await?;
        Ok(ScanPoll::decode(&body)?)
    }

    async fn health(&self) -> Result<HealthStatus, ScanError> {
        let body = self.get(self.health_url.clone()).await?;
        Ok(HealthStatus::decode(&body)?)
    }

    fn describe(&self) -> String {
        format!("live ({})", self.base_url)
    }
}
