//! cine-validate - showtime data validation tool
//!
//! Validates the showtime database, prints a quality report and optionally
//! deletes stale records afterwards.
//!
//! Exit status: 0 on success, 1 when the database cannot be loaded, 2 with
//! `--strict` when critical findings exist.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use cine_common::config::{resolve_database_path, TomlConfig};
use cine_validate::db::AccessMode;
use cine_validate::{clean, validate, SqliteStore, ValidationRun};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Command-line arguments for cine-validate
#[derive(Parser, Debug)]
#[command(name = "cine-validate")]
#[command(about = "Validate showtime data quality and report issues")]
#[command(version)]
struct Args {
    /// SQLite database to validate
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Configuration file (must exist and parse when given)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference date for date-based rules (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Delete records flagged by cleanable rules after reporting
    #[arg(long)]
    clean: bool,

    /// Skip expensive rules
    #[arg(short, long)]
    quick: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also write the report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exit with status 2 when critical findings exist
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting cine-validate v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let db_path = resolve_database_path(args.database.as_deref(), &config);
    info!("Database path: {}", db_path.display());

    let mode = if args.clean {
        AccessMode::ReadWrite
    } else {
        AccessMode::ReadOnly
    };
    let store = match SqliteStore::open(&db_path, mode).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e).context("Cannot validate without a database");
        }
    };

    let reference_date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let run = ValidationRun::new(reference_date, &config.validation).quick(args.quick);

    let mut report = match validate(&store, &run).await {
        Ok(report) => report,
        Err(e) => {
            error!("Validation aborted: {}", e);
            return Err(e).context("Failed to load snapshot");
        }
    };

    if args.clean {
        report.cleanup = clean(&store, &report).await;
        if report.cleanup.iter().any(|outcome| outcome.error.is_some()) {
            warn!("Cleanup incomplete, see report");
        }
    }

    let rendered = match args.format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => report.to_json().context("Failed to serialize report")?,
    };
    println!("{}", rendered);

    if let Some(path) = &args.output {
        std::fs::write(path, &rendered)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report saved to {}", path.display());
    }

    if args.strict && report.summary.critical_found {
        warn!("Critical findings present (strict mode)");
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}
