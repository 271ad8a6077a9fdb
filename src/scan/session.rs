//! Upload session record and its phase rules.

use crate::scan::model::TaskId;
use crate::transfer::FileRef;
use serde::Serialize;
use std::fmt;

/// Stage of a session's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Uploading,
    Settling,
    Scanning,
    Complete,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Complete | Phase::Failed)
    }

    /// Forward-only ordering; `Failed` may interrupt any live phase.
    pub fn can_advance_to(&self, next: Phase) -> bool {
        use Phase::*;
        match (*self, next) {
            (Idle, Uploading)
            | (Uploading, Settling)
            | (Settling, Scanning)
            | (Scanning, Complete) => true,
            (Uploading | Settling | Scanning, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Settling => "settling",
            Phase::Scanning => "scanning",
            Phase::Complete => "complete",
            Phase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Descriptive part of the selected file, kept on the session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

impl From<&FileRef> for FileSummary {
    fn from(file: &FileRef) -> Self {
        Self {
            name: file.name().to_string(),
            size: file.size(),
            content_type: file.content_type().to_string(),
        }
    }
}

/// The single mutable record of an in-flight upload.
///
/// All mutators take the caller's epoch and refuse to act when it is stale,
/// returning `false` so watch observers are not woken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSession {
    pub file: Option<FileSummary>,
    pub phase: Phase,
    pub progress_percent: u8,
    pub task_id: Option<TaskId>,
    pub epoch: u64,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self {
            file: None,
            phase: Phase::Idle,
            progress_percent: 0,
            task_id: None,
            epoch: 0,
        }
    }
}

impl UploadSession {
    /// Replace whatever was here with a fresh `Uploading` session.
    pub fn begin(&mut self, file: FileSummary) -> u64 {
        self.epoch += 1;
        self.file = Some(file);
        self.phase = Phase::Uploading;
        self.progress_percent = 0;
        self.task_id = None;
        self.epoch
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// Apply a transfer progress callback. Lower values are dropped.
    pub fn apply_progress(&mut self, epoch: u64, pct: u8) -> bool {
        if !self.is_current(epoch) || self.phase != Phase::Uploading {
            return false;
        }
        let pct = pct.min(100);
        if pct <= self.progress_percent {
            return false;
        }
        self.progress_percent = pct;
        true
    }

    /// Upload accepted: progress pinned to 100, task id recorded once.
    pub fn settle(&mut self, epoch: u64, task_id: TaskId) -> bool {
        if !self.is_current(epoch) || !self.phase.can_advance_to(Phase::Settling) {
            return false;
        }
        if self.task_id.is_some() {
            return false;
        }
        self.progress_percent = 100;
        self.task_id = Some(task_id);
        self.phase = Phase::Settling;
        true
    }

    pub fn advance(&mut self, epoch: u64, next: Phase) -> bool {
        if !self.is_current(epoch) || !self.phase.can_advance_to(next) {
            return false;
        }
        self.phase = next;
        true
    }

    /// Return to an Idle-equivalent state after a failure, keeping the epoch.
    pub fn reset(&mut self, epoch: u64) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        self.file = None;
        self.phase = Phase::Idle;
        self.progress_percent = 0;
        self.task_id = None;
        true
    }
}
