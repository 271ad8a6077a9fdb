use anyhow::Result;
use clap::{Parser, Subcommand};
use fraudshield::common::config::{apply_overrides, load_config, ConfigOverrides};
use fraudshield::common::config_commands::{run_config_path, run_config_reset, run_config_show};
use fraudshield::common::ProviderMode;
use fraudshield::runtime;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fraudshield", version)]
#[command(about = "Upload documents for fraud analysis and follow the scan")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a document and wait for its verdict
    Scan {
        #[arg(help = "Path to the document to scan")]
        file: PathBuf,

        /// Scanning service base URL
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,

        /// Use the built-in simulated service instead of HTTP
        #[arg(long)]
        fixture: bool,

        /// Pause after upload before scanning starts
        #[arg(long, value_name = "MS")]
        settle_ms: Option<u64>,

        /// Hide the progress display
        #[arg(long)]
        no_progress: bool,
    },

    /// Show the stored verdict for a task id
    Result {
        task_id: String,

        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },

    /// Check the scanning service is up
    Health {
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },

    /// Inspect or reset the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the config file, or the defaults when there is none
    Show,
    /// Overwrite the config file with defaults
    Reset {
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fraudshield=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let overrides = match &cli.command {
        Commands::Scan {
            api_url,
            fixture,
            settle_ms,
            no_progress,
            ..
        } => ConfigOverrides {
            api_url: api_url.clone(),
            provider: fixture.then_some(ProviderMode::Fixture),
            settle_ms: *settle_ms,
            show_progress: no_progress.then_some(false),
        },
        Commands::Result { api_url, .. } | Commands::Health { api_url } => ConfigOverrides {
            api_url: api_url.clone(),
            ..Default::default()
        },
        Commands::Config { action } => {
            match action {
                ConfigAction::Path => run_config_path()?,
                ConfigAction::Show => run_config_show()?,
                ConfigAction::Reset { yes } => {
                    run_config_reset(*yes)?;
                }
            }
            return Ok(ExitCode::SUCCESS);
        }
    };

    let config = apply_overrides(load_config()?, &overrides);
    config.validate()?;
    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Scan { file, .. } => Ok(runtime::run_scan(&config, &file).await?.into()),
        Commands::Result { task_id, .. } => {
            runtime::run_result(&config, &task_id).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Health { .. } => {
            runtime::run_health(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}
