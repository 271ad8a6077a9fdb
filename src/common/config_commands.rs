//! CLI handlers for `fraudshield config` subcommands.

use crate::common::config::{config_path, AppConfig};
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

fn defaults_toml() -> Result<String> {
    toml::to_string_pretty(&AppConfig::default()).context("Failed to serialize default config")
}

/// Print resolved config file path.
pub fn run_config_path() -> Result<()> {
    let stdout = std::io::stdout();
    writeln!(stdout.lock(), "{}", config_path().display())?;
    Ok(())
}

/// Print config file contents, or the effective defaults when no file exists.
pub fn run_config_show() -> Result<()> {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    show_config_with_io(&config_path(), &mut stdout.lock(), &mut stderr.lock())
}

/// Write default config, asking first unless `yes` is set.
pub fn run_config_reset(yes: bool) -> Result<bool> {
    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let stdout = std::io::stdout();
    reset_config_with_io(
        &config_path(),
        yes,
        interactive,
        &mut stdin.lock(),
        &mut stdout.lock(),
    )
}

fn show_config_with_io(path: &Path, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    if path.exists() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        stdout.write_all(text.as_bytes())?;
    } else {
        writeln!(stderr, "No config file at {}; defaults in effect:", path.display())?;
        stdout.write_all(defaults_toml()?.as_bytes())?;
    }
    Ok(())
}

fn reset_config_with_io(
    path: &Path,
    yes: bool,
    interactive: bool,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<bool> {
    if !yes {
        if !interactive {
            bail!("Refusing to reset config in non-interactive mode. Use --yes");
        }

        write!(output, "Overwrite {} with defaults? [y/N]: ", path.display())?;
        output.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            writeln!(output, "Reset cancelled.")?;
            return Ok(false);
        }
    }

    atomic_write(path, &defaults_toml()?)?;
    writeln!(output, "Config reset to defaults: {}", path.display())?;
    Ok(true)
}

/// Replace `path` through a synced sibling temp file and a rename.
fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let tmp_path = sibling_temp_path(path);
    {
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()
            .with_context(|| format!("Failed to sync {}", tmp_path.display()))?;
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to replace config file {}", path.display()))?;
    Ok(())
}

fn sibling_temp_path(path: &Path) -> PathBuf {
    let base = path
        .file_name()
        .and_then(|x| x.to_str())
        .unwrap_or("config.toml");
    path.with_file_name(format!(".{base}.{}.tmp", Uuid::new_v4()))
}
