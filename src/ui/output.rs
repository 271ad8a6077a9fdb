//! Terminal rendering helpers.

use crate::scan::model::{ScanOutcome, Severity};
use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.cyan} {msg:<24} [{bar:30.cyan/blue}] {pos:>3}%";
const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
        pb.set_style(template);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Percentage bar for the upload phase, 0..=100.
pub fn upload_bar(file_name: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(template) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
        pb.set_style(template.progress_chars("=> "));
    }
    pb.set_message(format!("Uploading {file_name}"));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_with_message(format!("{} {}", style("✓").green().bold(), msg));
}

pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.abandon_with_message(format!("{} {}", style("✗").red().bold(), msg));
}

pub fn severity_label(severity: Severity) -> StyledObject<&'static str> {
    let label = style(severity.as_str()).bold();
    match severity {
        Severity::Safe => label.green(),
        Severity::Warning => label.yellow(),
        Severity::Critical => label.red(),
    }
}

/// Write a human-readable verdict.
pub fn render_outcome(outcome: &ScanOutcome, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{} {}", style("Document:").dim(), outcome.filename)?;
    writeln!(out, "{} {}", style("File ID: ").dim(), outcome.file_id)?;
    writeln!(
        out,
        "{} {}/100 {}",
        style("Score:   ").dim(),
        outcome.fraud_score,
        severity_label(outcome.severity)
    )?;
    if let Some(confidence) = outcome.confidence {
        writeln!(out, "{} {:.0}%", style("Confidence:").dim(), confidence * 100.0)?;
    }
    if outcome.is_duplicate {
        let source = outcome.duplicate_source_id.as_deref().unwrap_or("unknown");
        writeln!(out, "{} duplicate of {source}", style("!").yellow().bold())?;
    }

    if outcome.anomalies.is_empty() {
        writeln!(out, "{}", style("No anomalies detected").green())?;
    } else {
        writeln!(out, "{}", style("Anomalies:").bold())?;
        for anomaly in &outcome.anomalies {
            writeln!(
                out,
                "  - {} ({:.0}%): {}",
                anomaly.kind,
                anomaly.confidence * 100.0,
                anomaly.description
            )?;
        }
    }

    if !outcome.extracted_tables.is_empty() {
        writeln!(
            out,
            "{} {}",
            style("Tables:  ").dim(),
            outcome.extracted_tables.len()
        )?;
    }

    if let Some(ms) = outcome.processing_time_ms {
        writeln!(out, "{}", style(format!("Processed in {ms} ms")).dim())?;
    }
    Ok(())
}
