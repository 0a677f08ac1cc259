use clap::{Parser, Subcommand};
use sluice_config::Config;
use sluice_pipeline::PipelineConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sluice", about = "Fetch a remote data archive and normalize its contents into CSV", version)]
struct Cli {
    /// Additional TOML configuration file, layered over `sluice.toml`.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Download the source into raw storage.
    Fetch {
        /// Overrides the configured source URL.
        #[arg(long)]
        url: Option<String>,
    },
    /// Copy/extract raw storage into intermediate storage and convert to CSV.
    Extract,
    /// Fetch, then extract (default).
    Run {
        /// Overrides the configured source URL.
        #[arg(long)]
        url: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = ?err, "Failed to load configuration");
            return ExitCode::FAILURE;
        },
    };

    let (url, fetch_first, extract) = match cli.command.unwrap_or(Command::Run { url: None }) {
        Command::Fetch { url } => (url, true, false),
        Command::Extract => (None, false, true),
        Command::Run { url } => (url, true, true),
    };
    let config = config.with_source_url(url);

    if fetch_first {
        match sluice_fetch::fetch(&config.fetch()) {
            Ok(path) => tracing::debug!(path = %path.display(), "Fetch complete"),
            Err(err) => {
                tracing::error!(error = ?err, "Download failed");
                return ExitCode::FAILURE;
            },
        }
    }
    if extract {
        return run_pipeline(&config.pipeline());
    }
    ExitCode::SUCCESS
}

fn run_pipeline(config: &PipelineConfig) -> ExitCode {
    match sluice_pipeline::run(config) {
        // Per-item failures are already logged; they don't fail the process.
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "Extraction aborted");
            ExitCode::FAILURE
        },
    }
}
