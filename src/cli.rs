use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use medallion::bronze::SourceId;
use medallion::config::{load_app_config, save_app_config};
use medallion::integrity::verify_published;
use medallion::lifecycle::SnapshotFormat;
use medallion::pipeline::{PipelineSpec, RunReport, run_pipeline};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "medallion",
    version,
    about = "Bronze/Silver/Gold conformance warehouse for CRM and ERP extracts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load every extract, rebuild Silver and Gold, run the quality gate and publish
    Run {
        /// Pipeline spec file. Defaults to the settings in the config file.
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Directory holding the source extracts
        #[arg(long, env = "MEDALLION_SOURCE_DIR")]
        source_dir: Option<PathBuf>,

        /// Directory to publish Gold snapshots to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Snapshot format: csv or parquet
        #[arg(short, long)]
        format: Option<String>,

        /// Reference date for future-date rules (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Skip publishing; only refresh and run the quality gate
        #[arg(long)]
        no_publish: bool,
    },
    /// Refresh and print the quality report without publishing anything
    Check {
        /// Pipeline spec file. Defaults to the settings in the config file.
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Directory holding the source extracts
        #[arg(long, env = "MEDALLION_SOURCE_DIR")]
        source_dir: Option<PathBuf>,

        /// Reference date for future-date rules (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Write a pipeline spec with default settings
    InitSpec {
        /// Where to write the spec
        file: PathBuf,
    },
    /// Re-hash a published snapshot and compare it with its version record
    Verify {
        /// The snapshot's `.meta.json` file
        file: PathBuf,
    },
}

/// Run a command; `Ok(false)` means it completed but the run did not succeed.
pub fn run_command(command: Commands) -> Result<bool> {
    match command {
        Commands::Run {
            spec,
            source_dir,
            output,
            format,
            as_of,
            no_publish,
        } => {
            let mut spec = load_spec(spec)?;
            if let Some(dir) = source_dir {
                spec.sources.dir = dir;
            }
            if let Some(dir) = output {
                spec.output.dir = dir;
            }
            if let Some(format) = format {
                spec.output.format = SnapshotFormat::parse_format(&format)
                    .with_context(|| format!("Unknown snapshot format '{format}'"))?;
            }
            if as_of.is_some() {
                spec.as_of = as_of;
            }
            if no_publish {
                spec.output.publish = false;
            }
            handle_run(&spec)
        }
        Commands::Check {
            spec,
            source_dir,
            as_of,
        } => {
            let mut spec = load_spec(spec)?;
            if let Some(dir) = source_dir {
                spec.sources.dir = dir;
            }
            if as_of.is_some() {
                spec.as_of = as_of;
            }
            spec.output.publish = false;
            spec.output.report_file = None;
            handle_check(&spec)
        }
        Commands::InitSpec { file } => handle_init_spec(&file),
        Commands::Verify { file } => handle_verify(&file),
    }
}

fn load_spec(path: Option<PathBuf>) -> Result<PipelineSpec> {
    match path {
        Some(path) => PipelineSpec::from_file(&path)
            .with_context(|| format!("Failed to load spec {}", path.display())),
        None => Ok(PipelineSpec::from_settings(
            "default",
            load_app_config().settings(),
        )),
    }
}

fn handle_run(spec: &PipelineSpec) -> Result<bool> {
    println!(
        "Running pipeline '{}' on {}...",
        spec.name,
        spec.sources.dir.display()
    );
    let report = run_pipeline(spec)?;
    record_run("run", &report);

    println!("{}", report.summary());
    for published in &report.published {
        println!(
            "  {} v{} -> {}",
            published.version.extent,
            published.version.sequence,
            published.location.path().display()
        );
    }
    if let Some(path) = &report.report_path {
        println!("Quality report written to {}", path.display());
    }

    Ok(report.is_success())
}

fn handle_check(spec: &PipelineSpec) -> Result<bool> {
    let report = run_pipeline(spec)?;
    record_run("check", &report);

    for failure in &report.load_failures {
        println!("✗ {}: {}", failure.source, failure.message);
    }
    println!("{}", report.quality.format_cli());

    Ok(report.load_failures.is_empty() && report.quality.passed())
}

fn handle_init_spec(file: &Path) -> Result<bool> {
    if file.exists() {
        return Err(anyhow::anyhow!(
            "Refusing to overwrite existing file: {}",
            file.display()
        ));
    }
    let spec = PipelineSpec::from_settings("default", load_app_config().settings());
    spec.to_file(file)?;
    println!("Wrote pipeline spec to {}", file.display());
    Ok(true)
}

fn handle_verify(file: &Path) -> Result<bool> {
    let result = verify_published(file)?;
    println!("{}", result.format_cli());
    Ok(result.passed)
}

/// Append the outcome of a run to the audit log in the config file
fn record_run(action: &str, report: &RunReport) {
    let mut config = load_app_config();
    config.log_event(
        action,
        format!(
            "{}: {}/{} sources, {} violations, success={}",
            report.name,
            report.sources_loaded(),
            SourceId::ALL.len(),
            report.quality.violation_count(),
            report.is_success()
        ),
    );
    if let Err(e) = save_app_config(&config) {
        tracing::warn!("Failed to record run in audit log: {e:#}");
    }
}
