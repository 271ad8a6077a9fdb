//! Command runners wiring config, provider, orchestrator and terminal view.

use crate::common::{AppConfig, ProviderMode};
use crate::provider::{FixtureProvider, LiveProvider, ScanProvider};
use crate::scan::{Orchestrator, ProviderPoller, ScanPoll, SessionOutcome, TaskId};
use crate::transfer::FileRef;
use crate::ui::{output, session_view, ConsoleNavigator, ConsoleNotifier};
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Pick the data source once, from config.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn ScanProvider>> {
    let provider: Arc<dyn ScanProvider> = match config.provider {
        ProviderMode::Live => Arc::new(LiveProvider::from_config(config)?),
        ProviderMode::Fixture => Arc::new(FixtureProvider::new()),
    };
    tracing::debug!(provider = %provider.describe(), "Provider selected");
    Ok(provider)
}

pub fn build_orchestrator(
    config: &AppConfig,
    provider: Arc<dyn ScanProvider>,
    navigator: Arc<ConsoleNavigator>,
) -> Orchestrator {
    let poller = Arc::new(ProviderPoller::new(
        provider.clone(),
        config.poll_interval(),
        config.poll_timeout(),
    ));
    Orchestrator::new(
        provider,
        poller,
        Arc::new(ConsoleNotifier::new()),
        navigator,
        config.settle_delay(),
    )
}

/// How a command ended when it did not return an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Failed, and the user was already told through the notifier
    Reported,
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::Reported => ExitCode::FAILURE,
        }
    }
}

/// Upload one document and print its verdict.
pub async fn run_scan(config: &AppConfig, path: &Path) -> Result<RunStatus> {
    let file = FileRef::open(path).await?;
    let provider = build_provider(config)?;
    let navigator = Arc::new(ConsoleNavigator::new());
    let orchestrator = build_orchestrator(config, provider, navigator);

    let root_token = CancellationToken::new();
    let view = config
        .ui
        .show_progress
        .then(|| session_view::spawn(orchestrator.subscribe(), root_token.child_token()));

    let outcome = tokio::select! {
        outcome = orchestrator.submit(file) => Some(outcome),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
            tracing::info!("Ctrl+C received, abandoning scan");
            None
        }
    };

    root_token.cancel();
    if let Some(view) = view {
        view.await.context("Session view task failed")?;
    }

    match outcome {
        Some(SessionOutcome::Completed { outcome, .. }) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            output::render_outcome(&outcome, &mut out)?;
            out.flush()?;
            Ok(RunStatus::Success)
        }
        Some(SessionOutcome::Failed(err)) => {
            tracing::debug!(error = %err, "Scan failed, exiting non-zero");
            Ok(RunStatus::Reported)
        }
        Some(SessionOutcome::Superseded) => bail!("Scan was superseded"),
        None => bail!("Scan interrupted"),
    }
}

/// Fetch the stored verdict of an earlier task once.
pub async fn run_result(config: &AppConfig, task_id: &str) -> Result<()> {
    let task_id = TaskId::new(task_id)?;
    let provider = build_provider(config)?;

    let poll = provider.fetch_result(&task_id).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match poll {
        ScanPoll::Completed(outcome) => output::render_outcome(&outcome, &mut out)?,
        ScanPoll::InProgress(status) => {
            writeln!(out, "Task {task_id} is still {}", status.as_str())?
        }
        ScanPoll::Failed => bail!("Scan of task {task_id} failed on the server"),
    }
    Ok(())
}

pub async fn run_health(config: &AppConfig) -> Result<()> {
    let provider = build_provider(config)?;
    let pb = output::spinner(&format!("Checking {}", provider.describe()));

    match provider.health().await {
        Ok(health) if health.is_healthy() => {
            let version = health.version.as_deref().unwrap_or("unknown");
            output::finish_success(&pb, &format!("Service healthy (version {version})"));
            Ok(())
        }
        Ok(health) => {
            output::finish_error(&pb, &format!("Service reports '{}'", health.status));
            bail!("Service is not healthy: {}", health.status)
        }
        Err(err) => {
            output::finish_error(&pb, "Service unreachable");
            Err(err).context("Health check failed")
        }
    }
}
