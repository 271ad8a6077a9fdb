//! Follows the session watch channel and draws it in the terminal.

use crate::scan::session::{Phase, UploadSession};
use crate::ui::output;
use indicatif::ProgressBar;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What the view drew last, so phase changes are rendered once.
#[derive(Default)]
struct ViewState {
    bar: Option<ProgressBar>,
    phase: Option<Phase>,
}

impl ViewState {
    fn render(&mut self, session: &UploadSession) {
        let name = session
            .file
            .as_ref()
            .map(|f| f.name.as_str())
            .unwrap_or("document");

        if self.phase != Some(session.phase) {
            self.enter(session.phase, name);
            self.phase = Some(session.phase);
        }
        if let Some(bar) = &self.bar {
            if session.phase == Phase::Uploading || session.phase == Phase::Settling {
                bar.set_position(u64::from(session.progress_percent));
            }
        }
    }

    fn enter(&mut self, phase: Phase, name: &str) {
        match phase {
            Phase::Uploading => {
                self.clear();
                self.bar = Some(output::upload_bar(name));
            }
            Phase::Settling => {
                if let Some(bar) = &self.bar {
                    bar.set_position(100);
                    bar.set_message(format!("Uploaded {name}"));
                }
            }
            Phase::Scanning => {
                if let Some(bar) = self.bar.take() {
                    output::finish_success(&bar, &format!("Uploaded {name}"));
                }
                self.bar = Some(output::spinner("Analyzing document..."));
            }
            Phase::Complete => {
                if let Some(bar) = self.bar.take() {
                    output::finish_success(&bar, "Analysis complete");
                }
            }
            Phase::Failed => {
                if let Some(bar) = self.bar.take() {
                    output::finish_error(&bar, "Failed");
                }
            }
            Phase::Idle => self.clear(),
        }
    }

    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Spawn the view. It stops on cancellation or when the sender is dropped.
pub fn spawn(mut rx: watch::Receiver<UploadSession>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut view = ViewState::default();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let session = rx.borrow_and_update().clone();
                    view.render(&session);
                }
            }
        }
        view.clear();
    })
}
