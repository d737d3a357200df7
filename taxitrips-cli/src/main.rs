//! taxitrips CLI — run, manifest and validate commands.
//!
//! Commands:
//! - `run` — acquire the configured months and validate every file
//! - `manifest` — print the file identifiers for a month range
//! - `validate` — normalize and validate a single local file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use taxitrips_core::data::{transport_for, ParquetFrameReader};
use taxitrips_core::manifest::{generate_range, FileNaming};
use taxitrips_core::{PipelineConfig, TracingObserver, ValidationVerdict, YearMonth};
use taxitrips_runner::{check_file, save_report, PipelineOrchestrator, RunReport};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "taxitrips",
    about = "taxitrips — monthly trip-record ingestion and quality gate"
)]
struct Cli {
    /// Also write logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire missing monthly files and validate each one.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// First month (YYYY-MM). Overrides the config file.
        #[arg(long)]
        start: Option<YearMonth>,

        /// Last month (YYYY-MM). Overrides the config file.
        #[arg(long)]
        end: Option<YearMonth>,

        /// URL or directory the file names are appended to.
        #[arg(long)]
        source_base: Option<String>,

        /// Local storage directory.
        #[arg(long)]
        storage_dir: Option<PathBuf>,

        /// Write report.json and findings.csv under this directory.
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
    /// Print the manifest for a month range.
    Manifest {
        #[arg(long)]
        start: YearMonth,

        #[arg(long)]
        end: YearMonth,

        #[arg(long, default_value = "yellow_tripdata")]
        prefix: String,

        #[arg(long, default_value = "parquet")]
        extension: String,
    },
    /// Normalize and validate one local Parquet file.
    Validate {
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run {
            config,
            start,
            end,
            source_base,
            storage_dir,
            report_dir,
        } => run_pipeline(
            config,
            Overrides {
                start,
                end,
                source_base,
                storage_dir,
            },
            report_dir,
        ),
        Commands::Manifest {
            start,
            end,
            prefix,
            extension,
        } => run_manifest(start, end, prefix, extension),
        Commands::Validate { file } => run_validate(&file),
    }
}

/// Console logging filtered by `RUST_LOG` (default `info`), plus an optional file sink.
fn init_logging(log_file: Option<&Path>) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, Layer};

    let env = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_writer(std::io::stderr).with_filter(env());

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(console).init();
        return Ok(None);
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("log file path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(env());

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(Some(guard))
}

/// Flags that take precedence over the config file.
#[derive(Default)]
struct Overrides {
    start: Option<YearMonth>,
    end: Option<YearMonth>,
    source_base: Option<String>,
    storage_dir: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(start) = self.start {
            config.range_start = start;
        }
        if let Some(end) = self.end {
            config.range_end = end;
        }
        if let Some(base) = self.source_base {
            config.source_base = base;
        }
        if let Some(dir) = self.storage_dir {
            config.storage_dir = dir;
        }
    }
}

/// Config file (or defaults when absent) with the flag overrides applied, validated.
fn resolve_config(config_path: Option<&Path>, overrides: Overrides) -> Result<PipelineConfig> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => match (overrides.start, overrides.end) {
            (Some(start), Some(end)) => PipelineConfig::new(start, end),
            _ => bail!("--start and --end are required without --config"),
        },
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn run_pipeline(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    report_dir: Option<PathBuf>,
) -> Result<ExitCode> {
    let config = resolve_config(config_path.as_deref(), overrides)?;

    tracing::info!(
        start = %config.range_start,
        end = %config.range_end,
        source = %config.source_base,
        storage = %config.storage_dir.display(),
        "starting run"
    );

    let transport = transport_for(&config.source_base, config.max_retries)?;
    let orchestrator =
        PipelineOrchestrator::new(transport.as_ref(), &ParquetFrameReader, &TracingObserver);
    let report = orchestrator.run(&config)?;

    print_summary(&report);

    if let Some(dir) = report_dir {
        let run_dir = save_report(&report, &dir)?;
        println!("Report saved to: {}", run_dir.display());
    }

    Ok(exit_code(report.passed()))
}

fn run_manifest(
    start: YearMonth,
    end: YearMonth,
    prefix: String,
    extension: String,
) -> Result<ExitCode> {
    let naming = FileNaming { prefix, extension };
    naming.validate()?;
    for id in generate_range(start, end, &naming)? {
        println!("{id}");
    }
    Ok(ExitCode::SUCCESS)
}

fn run_validate(file: &Path) -> Result<ExitCode> {
    let check = check_file(&ParquetFrameReader, file)?;
    println!("{} ({} rows, blake3 {})", file.display(), check.rows, check.content_hash);
    print_verdict(&check.verdict);
    Ok(exit_code(check.verdict.passed))
}

/// Exit status 1 signals data-quality failures; infrastructure errors surface as `Err`.
fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("=== Run {} → {} ===", report.range_start, report.range_end);
    println!(
        "Acquired: {} fetched, {} already present, {} failed",
        report.fetched.len(),
        report.already_present.len(),
        report.acquisition_failures.len()
    );
    for failure in &report.acquisition_failures {
        println!("  FAIL: {}: {}", failure.identifier, failure.reason);
    }
    for file in &report.files {
        println!(
            "{}  {} ({} rows)",
            if file.verdict.passed { "PASS" } else { "FAIL" },
            file.identifier,
            file.rows
        );
        if !file.verdict.passed {
            print_verdict(&file.verdict);
        }
    }
    let failed = report.failed_files().count();
    println!(
        "\n{}/{} files passed",
        report.files.len() - failed,
        report.files.len()
    );
}

fn print_verdict(verdict: &ValidationVerdict) {
    if verdict.passed {
        println!("  verdict: passed");
        return;
    }
    if !verdict.missing_columns.is_empty() {
        let missing: Vec<&str> = verdict.missing_columns.iter().map(String::as_str).collect();
        println!("  missing columns: {}", missing.join(", "));
    }
    for violation in &verdict.violations {
        println!("  [{}] {}", violation.rule, violation.description);
    }
}
