//! SEI Sync - NetFile to Socrata Form 700 sync

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use seisync::{run_sync, SyncConfig, Variant};
use seisync_common::logging::{init_logging, LogConfig, LogLevel};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "seisync")]
#[command(author, version, about = "Sync Form 700 filings from NetFile to Socrata")]
struct Cli {
    /// Which filings to publish
    #[arg(long, value_enum, default_value_t = VariantArg::Redacted)]
    variant: VariantArg,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum VariantArg {
    Redacted,
    Unredacted,
    /// Redacted first, then unredacted
    All,
}

impl VariantArg {
    fn variants(self) -> &'static [Variant] {
        match self {
            VariantArg::Redacted => &[Variant::Redacted],
            VariantArg::Unredacted => &[Variant::Unredacted],
            VariantArg::All => &[Variant::Redacted, Variant::Unredacted],
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = match LogConfig::builder()
        .level(log_level)
        .log_file_prefix("seisync")
        .build()
        .merge_env()
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid logging configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        },
    };

    match sync(cli.variant).await {
        Ok(()) => {
            info!("Sync finished");
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("Sync failed: {e:#}");
            ExitCode::FAILURE
        },
    }
}

async fn sync(variant: VariantArg) -> Result<()> {
    let config = SyncConfig::load().context("Failed to load configuration")?;

    for &variant in variant.variants() {
        let report = run_sync(&config, variant)
            .await
            .with_context(|| format!("{} sync halted", variant))?;
        info!(
            variant = %report.variant,
            stage = %report.stage,
            cover = report.counter(seisync::Category::Cover).created,
            items = report.items.created,
            started_at = %report.started_at,
            finished_at = %report.finished_at,
            "Published {} filings",
            variant
        );
        let summary =
            serde_json::to_string(&report).context("Failed to serialize run report")?;
        info!(report = %summary, "Run report");
    }

    Ok(())
}
