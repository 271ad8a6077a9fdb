//! Upload orchestration state machine.
//!
//! One [`Orchestrator`] owns one [`UploadSession`] at a time, held in a
//! `watch` channel so displays can follow every change. Each call to
//! [`Orchestrator::submit`] starts a new epoch; every later mutation made on
//! behalf of that call is checked against the epoch, so a superseded upload
//! can keep running in the background without touching the new session.

use crate::common::{ProgressFn, ScanError};
use crate::provider::ScanProvider;
use crate::scan::model::{ScanOutcome, TaskId};
use crate::scan::poller::ScanPoller;
use crate::scan::session::{FileSummary, Phase, UploadSession};
use crate::transfer::FileRef;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// User-visible failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn scan_failed(err: &ScanError) -> Self {
        let title = if err.is_transfer() {
            "Upload failed"
        } else {
            "Scan failed"
        };
        Self {
            title: title.to_string(),
            message: err.user_message(),
        }
    }
}

/// Surfaces error messages to the user.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Views the user can be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ScanResult { task_id: TaskId },
}

impl Route {
    pub fn scan_result(task_id: TaskId) -> Self {
        Route::ScanResult { task_id }
    }

    pub fn task_id(&self) -> &TaskId {
        match self {
            Route::ScanResult { task_id } => task_id,
        }
    }

    /// Path form, e.g. `/results?taskId=abc123`.
    pub fn path(&self) -> String {
        match self {
            Route::ScanResult { task_id } => format!("/results?taskId={task_id}"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Moves the user to a results view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// How a call to [`Orchestrator::submit`] ended.
#[derive(Debug)]
pub enum SessionOutcome {
    Completed {
        task_id: TaskId,
        outcome: Box<ScanOutcome>,
    },
    Failed(ScanError),
    /// A newer selection replaced this session; no effects were produced
    Superseded,
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionOutcome::Completed { .. })
    }
}

pub struct Orchestrator {
    provider: Arc<dyn ScanProvider>,
    poller: Arc<dyn ScanPoller>,
    notifier: Arc<dyn NotificationSink>,
    navigator: Arc<dyn Navigator>,
    settle: Duration,
    session: Arc<watch::Sender<UploadSession>>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ScanProvider>,
        poller: Arc<dyn ScanPoller>,
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
        settle: Duration,
    ) -> Self {
        let (session, _) = watch::channel(UploadSession::default());
        Self {
            provider,
            poller,
            notifier,
            navigator,
            settle,
            session: Arc::new(session),
        }
    }

    /// Follow session changes.
    pub fn subscribe(&self) -> watch::Receiver<UploadSession> {
        self.session.subscribe()
    }

    pub fn snapshot(&self) -> UploadSession {
        self.session.borrow().clone()
    }

    /// Run one session for `file`: upload, settle, scan, navigate.
    ///
    /// Failures are reported through the notification sink and returned as
    /// [`SessionOutcome::Failed`]; this never returns an error.
    pub async fn submit(&self, file: FileRef) -> SessionOutcome {
        let summary = FileSummary::from(&file);
        let mut epoch = 0;
        self.session.send_modify(|s| epoch = s.begin(summary));
        tracing::debug!(epoch, file = %file.name(), size = file.size(), "Session started");

        let ack = match self.provider.upload(&file, self.progress_for(epoch)).await {
            Ok(ack) => ack,
            Err(err) => return self.fail(epoch, err),
        };

        let task_id = ack.task_id;
        if !self.update(|s| s.settle(epoch, task_id.clone())) {
            return self.superseded(epoch, Phase::Settling);
        }
        tracing::debug!(epoch, %task_id, "Upload settled");

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        if !self.update(|s| s.advance(epoch, Phase::Scanning)) {
            return self.superseded(epoch, Phase::Scanning);
        }

        let outcome = match self.poller.wait_for_outcome(&task_id).await {
            Ok(outcome) => outcome,
            Err(err) => return self.fail(epoch, err),
        };

        if !self.update(|s| s.advance(epoch, Phase::Complete)) {
            return self.superseded(epoch, Phase::Complete);
        }

        tracing::info!(
            epoch,
            %task_id,
            score = outcome.fraud_score,
            severity = %outcome.severity,
            "Scan complete"
        );
        self.navigator.navigate(Route::scan_result(task_id.clone()));

        SessionOutcome::Completed {
            task_id,
            outcome: Box::new(outcome),
        }
    }

    /// Progress callback bound to `epoch`.
    fn progress_for(&self, epoch: u64) -> ProgressFn {
        let session = self.session.clone();
        Arc::new(move |pct: u8| {
            let applied = session.send_if_modified(|s| s.apply_progress(epoch, pct));
            if !applied && !session.borrow().is_current(epoch) {
                tracing::trace!(epoch, pct, "Dropped progress from stale session");
            }
        })
    }

    fn update(&self, change: impl FnOnce(&mut UploadSession) -> bool) -> bool {
        self.session.send_if_modified(change)
    }

    fn superseded(&self, epoch: u64, next: Phase) -> SessionOutcome {
        tracing::warn!(epoch, %next, "Session superseded before transition, discarding");
        SessionOutcome::Superseded
    }

    fn fail(&self, epoch: u64, err: ScanError) -> SessionOutcome {
        if !self.update(|s| s.advance(epoch, Phase::Failed)) {
            tracing::warn!(epoch, error = %err, "Discarding failure of superseded session");
            return SessionOutcome::Superseded;
        }

        // The notifier is the user-facing report; keep the log below the default filter
        tracing::debug!(epoch, error = %err, "Session failed");
        self.notifier.notify(Notification::scan_failed(&err));
        self.update(|s| s.reset(epoch));

        SessionOutcome::Failed(err)
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.describe())
            .field("settle", &self.settle)
            .field("session", &*self.session.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{FixtureFailure, FixtureProvider};
    use crate::scan::poller::ProviderPoller;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        notes: Mutex<Vec<Notification>>,
        routes: Mutex<Vec<Route>>,
    }

    impl NotificationSink for Recorder {
        fn notify(&self, notification: Notification) {
            self.notes.lock().unwrap().push(notification);
        }
    }

    impl Navigator for Recorder {
        fn navigate(&self, route: Route) {
            self.routes.lock().unwrap().push(route);
        }
    }

    fn orchestrator(provider: FixtureProvider) -> (Orchestrator, Arc<Recorder>) {
        let provider: Arc<dyn ScanProvider> = Arc::new(provider);
        let poller = Arc::new(ProviderPoller::new(
            provider.clone(),
            Duration::from_millis(100),
            Duration::from_secs(10),
        ));
        let recorder = Arc::new(Recorder::default());
        let orch = Orchestrator::new(
            provider,
            poller,
            recorder.clone(),
            recorder.clone(),
            Duration::from_millis(800),
        );
        (orch, recorder)
    }

    fn document() -> FileRef {
        FileRef::new("invoice.pdf", "application/pdf", vec![7u8; 4096])
    }

    #[test]
    fn route_path_carries_task_id() {
        let route = Route::scan_result(TaskId::new("abc123").unwrap());
        assert_eq!(route.path(), "/results?taskId=abc123");
        assert_eq!(route.task_id().as_str(), "abc123");
    }

    #[tokio::test(start_paused = true)]
    async fn success_navigates_once() {
        let (orch, recorder) = orchestrator(FixtureProvider::new().with_task_id("abc123"));

        let outcome = orch.submit(document()).await;
        assert!(outcome.is_completed());

        let session = orch.snapshot();
        assert_eq!(session.phase, Phase::Complete);
        assert_eq!(session.progress_percent, 100);
        assert_eq!(session.task_id.as_ref().map(TaskId::as_str), Some("abc123"));
        assert_eq!(recorder.routes.lock().unwrap().len(), 1);
        assert!(recorder.notes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn upload_failure_notifies_and_resets() {
        let (orch, recorder) = orchestrator(FixtureProvider::new().failing(FixtureFailure::Upload));

        let outcome = orch.submit(document()).await;
        assert!(matches!(outcome, SessionOutcome::Failed(ref e) if e.is_transfer()));

        let session = orch.snapshot();
        assert_eq!(session.phase, Phase::Idle);
        assert_eq!(session.progress_percent, 0);
        assert!(session.task_id.is_none());
        assert_eq!(recorder.notes.lock().unwrap().len(), 1);
        assert_eq!(recorder.notes.lock().unwrap()[0].title, "Upload failed");
        assert!(recorder.routes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn watchers_see_phases_in_order() {
        let (orch, _) = orchestrator(FixtureProvider::new());
        let mut rx = orch.subscribe();

        let seen = tokio::spawn(async move {
            let mut phases = Vec::new();
            while rx.changed().await.is_ok() {
                let phase = rx.borrow_and_update().phase;
                if phases.last() != Some(&phase) {
                    phases.push(phase);
                }
                if phase.is_terminal() {
                    break;
                }
            }
            phases
        });

        orch.submit(document()).await;
        let phases = seen.await.unwrap();
        let order = [
            Phase::Uploading,
            Phase::Settling,
            Phase::Scanning,
            Phase::Complete,
        ];
        let ranks: Vec<usize> = phases
            .iter()
            .map(|p| order.iter().position(|o| o == p).expect("unexpected phase"))
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]), "{phases:?}");
        assert_eq!(phases.last(), Some(&Phase::Complete));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_logged_at_default_level() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("fraudshield=warn"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (upload_fails, notes) =
            orchestrator(FixtureProvider::new().failing(FixtureFailure::Upload));
        let outcome = upload_fails.submit(document()).await;
        assert!(matches!(outcome, SessionOutcome::Failed(_)));

        let (never_ready, _) = orchestrator(FixtureProvider::new().with_pending_polls(u32::MAX));
        let outcome = never_ready.submit(document()).await;
        assert!(matches!(outcome, SessionOutcome::Failed(_)));

        tracing::warn!("capture check");
        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.lines().count(), 1, "{text}");
        assert!(text.contains("capture check"));
        assert_eq!(notes.notes.lock().unwrap().len(), 1);
    }
}
