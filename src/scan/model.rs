//! Wire payloads of the scanning service and their validated forms.
//!
//! Every body goes through an explicit decode step: raw serde structs are
//! parsed first, then checked for ranges and required values. Anything that
//! does not fit becomes a [`MalformedResponse`] rather than a default.

use crate::common::MalformedResponse;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-issued handle correlating an upload with its scan outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Result<Self, MalformedResponse> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(MalformedResponse::new("task id", "empty task_id"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Acknowledgement returned once an upload is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAck {
    pub task_id: TaskId,
    pub message: String,
}

#[derive(Deserialize)]
struct RawAck {
    task_id: String,
    #[serde(default)]
    message: String,
}

impl ServerAck {
    pub fn decode(body: &[u8]) -> Result<Self, MalformedResponse> {
        let raw: RawAck = serde_json::from_slice(body)
            .map_err(|e| MalformedResponse::new("upload acknowledgement", e.to_string()))?;
        Ok(Self {
            task_id: TaskId::new(raw.task_id)?,
            message: raw.message,
        })
    }
}

/// Three-level risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Safe,
    Warning,
    Critical,
}

impl Severity {
    pub const CRITICAL_THRESHOLD: u8 = 70;
    pub const WARNING_THRESHOLD: u8 = 30;

    /// Classification the scanning service applies to a fraud score.
    pub fn from_score(score: u8) -> Self {
        if score >= Self::CRITICAL_THRESHOLD {
            Severity::Critical
        } else if score >= Self::WARNING_THRESHOLD {
            Severity::Warning
        } else {
            Severity::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Safe => "SAFE",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Scanning,
    Completed,
    Error,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Scanning => "scanning",
            ScanStatus::Completed => "completed",
            ScanStatus::Error => "error",
        }
    }
}

/// A single detected irregularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub confidence: f64,
}

/// Final verdict for a scanned document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub file_id: String,
    pub filename: String,
    pub fraud_score: u8,
    pub severity: Severity,
    pub is_duplicate: bool,
    pub duplicate_source_id: Option<String>,
    pub anomalies: Vec<Anomaly>,
    pub scanned_at: Option<String>,
    pub processing_time_ms: Option<u64>,
    pub confidence: Option<f64>,
    pub text_content: Option<String>,
    /// Tables found in the document, passed through as the server sent them
    pub extracted_tables: Vec<serde_json::Value>,
}

/// One observation of a task while polling.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanPoll {
    /// Server has no verdict yet (pending, scanning, or not stored yet)
    InProgress(ScanStatus),
    Completed(Box<ScanOutcome>),
    Failed,
}

#[derive(Deserialize)]
struct RawResult {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status: Option<ScanStatus>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    fraud_score: Option<i64>,
    #[serde(default)]
    severity: Option<Severity>,
    #[serde(default)]
    is_duplicate: Option<bool>,
    #[serde(default)]
    duplicate_source_id: Option<String>,
    #[serde(default)]
    anomalies: Option<Vec<Anomaly>>,
    #[serde(default)]
    scanned_at: Option<String>,
    #[serde(default)]
    processing_time: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    text_content: Option<String>,
    #[serde(default)]
    extracted_tables: Option<Vec<serde_json::Value>>,
}

const RESULT: &str = "scan result";

fn require<T>(value: Option<T>, field: &str) -> Result<T, MalformedResponse> {
    value.ok_or_else(|| MalformedResponse::new(RESULT, format!("missing field `{field}`")))
}

fn check_confidence(value: f64, field: &str) -> Result<f64, MalformedResponse> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MalformedResponse::new(
            RESULT,
            format!("{field} {value} outside 0.0..=1.0"),
        ));
    }
    Ok(value)
}

impl ScanPoll {
    /// Decode a `GET scan/result/{task_id}` body.
    ///
    /// A body carrying only `error` means the verdict is not stored yet. A
    /// body without `status` but with a full result is a finished scan.
    pub fn decode(body: &[u8]) -> Result<Self, MalformedResponse> {
        let raw: RawResult = serde_json::from_slice(body)
            .map_err(|e| MalformedResponse::new(RESULT, e.to_string()))?;

        if raw.error.is_some() && raw.fraud_score.is_none() && raw.status.is_none() {
            return Ok(ScanPoll::InProgress(ScanStatus::Pending));
        }

        let status = match raw.status {
            Some(status) => status,
            None if raw.fraud_score.is_some() => ScanStatus::Completed,
            None => return Err(MalformedResponse::new(RESULT, "missing field `status`")),
        };

        match status {
            ScanStatus::Pending | ScanStatus::Scanning => Ok(ScanPoll::InProgress(status)),
            ScanStatus::Error => Ok(ScanPoll::Failed),
            ScanStatus::Completed => Ok(ScanPoll::Completed(Box::new(raw.into_outcome()?))),
        }
    }
}

impl RawResult {
    fn into_outcome(self) -> Result<ScanOutcome, MalformedResponse> {
        let score = require(self.fraud_score, "fraud_score")?;
        let fraud_score = u8::try_from(score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| {
                MalformedResponse::new(RESULT, format!("fraud_score {score} outside 0..=100"))
            })?;

        let anomalies = require(self.anomalies, "anomalies")?;
        for anomaly in &anomalies {
            check_confidence(anomaly.confidence, "anomaly confidence")?;
        }
        if let Some(confidence) = self.confidence {
            check_confidence(confidence, "confidence")?;
        }

        let processing_time_ms = match self.processing_time {
            Some(ms) if ms.is_finite() && ms >= 0.0 => Some(ms.round() as u64),
            Some(ms) => {
                return Err(MalformedResponse::new(
                    RESULT,
                    format!("processing_time {ms} is not a duration"),
                ))
            }
            None => None,
        };

        Ok(ScanOutcome {
            file_id: require(self.file_id, "file_id")?,
            filename: require(self.filename, "filename")?,
            fraud_score,
            severity: require(self.severity, "severity")?,
            is_duplicate: self.is_duplicate.unwrap_or(false),
            duplicate_source_id: self.duplicate_source_id,
            anomalies,
            scanned_at: self.scanned_at,
            processing_time_ms,
            confidence: self.confidence,
            text_content: self.text_content,
            extracted_tables: self.extracted_tables.unwrap_or_default(),
        })
    }
}

/// Reply of the `health` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn decode(body: &[u8]) -> Result<Self, MalformedResponse> {
        serde_json::from_slice(body).map_err(|e| MalformedResponse::new("health", e.to_string()))
    }

    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
