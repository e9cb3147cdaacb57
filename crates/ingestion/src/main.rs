//! PrintTrack import CLI
//!
//! `import run <file>` bulk-imports a CSV or spreadsheet of SKU recipes and
//! writes the error report when any row fails. `import sample` writes the
//! upload template.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use printtrack_common::config::{ConfigError, ReportFormat};
use printtrack_common::db::DbPool;
use printtrack_common::telemetry::init_tracing;
use printtrack_common::{AppConfig, InMemoryStore, RecipeStore, Repository, VERSION};
use printtrack_ingestion::processor::ImportProcessor;
use printtrack_ingestion::BatchOutcome;
use printtrack_ingestion::sample::{sample_file_name, sample_template};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "import", version = VERSION, about = "Bulk import SKU recipes")]
struct Cli {
    /// Configuration file (defaults to config/ and APP__ environment variables)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a CSV or Excel file of recipes
    Run {
        file: PathBuf,

        /// Where to write the error report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Report format, overrides `import.report_format`
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Validate against an empty in-memory store; nothing is written
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the upload template
    Sample {
        #[arg(long, value_enum, default_value_t = FormatArg::Xlsx)]
        format: FormatArg,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ReportFormat::Csv,
            FormatArg::Xlsx => ReportFormat::Xlsx,
        }
    }
}

/// Configuration plus the load error a dry run chose to ignore
type LoadedConfig = (AppConfig, Option<ConfigError>);

/// Load configuration. An explicit `--config` file must always load; the
/// implicit lookup falls back to defaults when `allow_defaults` is set.
fn load_config(path: Option<&str>, allow_defaults: bool) -> anyhow::Result<LoadedConfig> {
    if let Some(path) = path {
        let config = AppConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?;
        return Ok((config, None));
    }

    match AppConfig::load() {
        Ok(config) => Ok((config, None)),
        Err(e) if allow_defaults => Ok((AppConfig::default(), Some(e))),
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

/// One-line result shown after an import
fn summary_line(outcome: &BatchOutcome, dry_run: bool) -> String {
    if dry_run {
        format!(
            "{} (dry run): {} of {} rows would be imported, nothing was written",
            outcome.status().as_str(),
            outcome.accepted.len(),
            outcome.total_rows
        )
    } else {
        format!(
            "{}: {} of {} rows imported",
            outcome.status().as_str(),
            outcome.accepted.len(),
            outcome.total_rows
        )
    }
}

async fn run_import<S: RecipeStore>(
    processor: ImportProcessor<S>,
    file: &Path,
    report_path: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<ExitCode> {
    let result = processor
        .process_file(file)
        .await
        .with_context(|| format!("Failed to import {}", file.display()))?;

    let outcome = &result.outcome;
    println!("{}", summary_line(outcome, dry_run));

    let Some(report) = result.report else {
        return Ok(ExitCode::SUCCESS);
    };

    let path = report_path.unwrap_or_else(|| PathBuf::from(&report.file_name));
    tokio::fs::write(&path, &report.bytes)
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    for failure in &outcome.failures {
        println!("  {}", failure.message());
    }
    println!("Error report written to {}", path.display());

    Ok(ExitCode::from(2))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Sample { format, output } => {
            let format = ReportFormat::from(format);
            let path = output.unwrap_or_else(|| PathBuf::from(sample_file_name(format)));

            let bytes = sample_template(format)?;
            tokio::fs::write(&path, bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            println!("Sample template written to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }

        Command::Run { file, report, format, dry_run } => {
            let (config, ignored) = load_config(cli.config.as_deref(), dry_run)?;
            init_tracing(&config.observability);

            info!("Starting PrintTrack import v{}", VERSION);
            if let Some(e) = ignored {
                warn!(error = %e, "Configuration failed to load, dry run continues with defaults");
            }

            let format = format.map(ReportFormat::from).unwrap_or(config.import.report_format);

            if dry_run {
                warn!("Dry run: rows are validated against an empty in-memory store");
                let processor = ImportProcessor::new(InMemoryStore::new(), config.import.clone())
                    .with_report_format(format);
                return run_import(processor, &file, report, true).await;
            }

            info!("Connecting to database...");
            let pool = DbPool::new(&config.database).await?;
            let processor = ImportProcessor::new(Repository::new(pool), config.import.clone())
                .with_report_format(format);

            run_import(processor, &file, report, false).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printtrack_ingestion::{RowError, RowFailure};
    use uuid::Uuid;

    fn outcome() -> BatchOutcome {
        BatchOutcome {
            batch_id: Uuid::new_v4(),
            total_rows: 3,
            accepted: vec![],
            failures: vec![RowFailure { row_index: 1, errors: vec![RowError::DuplicateName] }],
        }
    }

    #[test]
    fn test_dry_run_summary_says_nothing_was_written() {
        let line = summary_line(&outcome(), true);
        assert!(line.contains("0 of 3 rows would be imported"));
        assert!(line.contains("nothing was written"));

        let line = summary_line(&outcome(), false);
        assert!(line.ends_with(": 0 of 3 rows imported"));
    }

    #[test]
    fn test_explicit_config_file_must_load_even_in_dry_run() {
        let err = load_config(Some("/nonexistent/printtrack-import"), true).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/printtrack-import"));
    }
}
