use super::ScanProvider;
use crate::common::{ProgressFn, ProgressReporter, ScanError, TransferError};
use crate::scan::model::{
    Anomaly, HealthStatus, ScanOutcome, ScanPoll, ScanStatus, ServerAck, Severity, TaskId,
};
use crate::transfer::FileRef;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Where a fixture run should break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFailure {
    /// Server answers the upload with 503 halfway through
    Upload,
    /// Upload succeeds, scan ends in `error`
    Scan,
}

struct FixtureTask {
    outcome: ScanOutcome,
    polls_left: u32,
}

/// Simulated scanning service for offline runs and tests.
pub struct FixtureProvider {
    progress_steps: Vec<u8>,
    step_delay: Duration,
    task_id: Option<String>,
    score: u8,
    pending_polls: u32,
    failure: Option<FixtureFailure>,
    tasks: Mutex<HashMap<TaskId, FixtureTask>>,
}

impl Default for FixtureProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self {
            progress_steps: vec![0, 25, 50, 75, 100],
            step_delay: Duration::ZERO,
            task_id: None,
            score: 12,
            pending_polls: 1,
            failure: None,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_progress_steps(mut self, steps: Vec<u8>) -> Self {
        self.progress_steps = steps;
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Use a fixed task id instead of a random one.
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = score.min(100);
        self
    }

    /// Number of polls answered with `scanning` before the verdict.
    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    pub fn failing(mut self, failure: FixtureFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    fn outcome_for(&self, task_id: &TaskId, file: &FileRef) -> ScanOutcome {
        let severity = Severity::from_score(self.score);
        let anomalies = match severity {
            Severity::Safe => Vec::new(),
            Severity::Warning => vec![Anomaly {
                kind: "PII Detected".into(),
                description: "Contains: PAN number".into(),
                confidence: 0.7,
            }],
            Severity::Critical => vec![Anomaly {
                kind: "Forensic Tampering".into(),
                description: "Error level analysis found edited regions".into(),
                confidence: 0.9,
            }],
        };
        let confidence = if anomalies.is_empty() {
            0.0
        } else {
            anomalies.iter().map(|a| a.confidence).sum::<f64>() / anomalies.len() as f64
        };

        ScanOutcome {
            file_id: task_id.to_string(),
            filename: file.name().to_string(),
            fraud_score: self.score,
            severity,
            is_duplicate: false,
            duplicate_source_id: None,
            anomalies,
            scanned_at: None,
            processing_time_ms: Some(0),
            confidence: Some(confidence),
            text_content: None,
            extracted_tables: Vec::new(),
        }
    }

    fn next_task_id(&self) -> Result<TaskId, ScanError> {
        let id = self
            .task_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(TaskId::new(id)?)
    }
}

#[async_trait::async_trait]
impl ScanProvider for FixtureProvider {
    async fn upload(
        &self,
        file: &FileRef,
        on_progress: ProgressFn,
    ) -> Result<ServerAck, ScanError> {
        if file.is_empty() {
            return Err(TransferError::EmptyPayload {
                name: file.name().to_string(),
            }
            .into());
        }

        let reporter = ProgressReporter::new(file.size(), on_progress);
        let cut = match self.failure {
            Some(FixtureFailure::Upload) => self.progress_steps.len() / 2,
            _ => self.progress_steps.len(),
        };
        for &step in &self.progress_steps[..cut] {
            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            reporter.report_percent(step);
        }

        if self.failure == Some(FixtureFailure::Upload) {
            return Err(TransferError::Status {
                status: 503,
                body: "fixture upload failure".into(),
            }
            .into());
        }

        let task_id = self.next_task_id()?;
        let task = FixtureTask {
            outcome: self.outcome_for(&task_id, file),
            polls_left: self.pending_polls,
        };
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(task_id.clone(), task);

        reporter.finish();
        tracing::debug!(%task_id, "Fixture accepted upload");
        Ok(ServerAck {
            task_id,
            message: "Fixture analysis queued.".into(),
        })
    }

    async fn fetch_result(&self, task_id: &TaskId) -> Result<ScanPoll, ScanError> {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(task) = tasks.get_mut(task_id) else {
            return Ok(ScanPoll::InProgress(ScanStatus::Pending));
        };

        if task.polls_left > 0 {
            task.polls_left -= 1;
            return Ok(ScanPoll::InProgress(ScanStatus::Scanning));
        }
        if self.failure == Some(FixtureFailure::Scan) {
            return Ok(ScanPoll::Failed);
        }
        Ok(ScanPoll::Completed(Box::new(task.outcome.clone())))
    }

    async fn health(&self) -> Result<HealthStatus, ScanError> {
        Ok(HealthStatus {
            status: "healthy".into(),
            version: Some(env!("CARGO_PKG_VERSION").into()),
            service: Some("fixture".into()),
        })
    }

    fn describe(&self) -> String {
        "fixture".to_string()
    }
}
