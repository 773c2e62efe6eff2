use std::path::PathBuf;

use clap::Parser;

mod commands;
mod config;
mod state;

/// Sync settled Akahu transactions into a Google Sheets ledger.
#[derive(Debug, Parser)]
#[command(name = "kahu", version, about)]
struct Cli {
    /// Print the planned sheet mutations without applying them
    #[arg(long)]
    dry_run: bool,

    /// Ignore saved sync state and fetch the full lookback window
    #[arg(long)]
    reset_state: bool,

    /// Upload category rules from a local CSV file instead of syncing
    #[arg(long, value_name = "CSV_FILE")]
    upload_categories: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(long, default_value = "kahu.toml")]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::Config::load(&cli.config)?;

    match cli.upload_categories {
        Some(csv_path) => commands::upload_categories(&config, &csv_path).await,
        None => commands::run_sync(&config, cli.dry_run, cli.reset_state).await,
    }
}
