//! Pipeline execution engine.
//!
//! Runs one full refresh: load every extract into the Raw Store, conform the
//! Silver entities, compute the Gold views, run the quality gate and publish.

use super::spec::PipelineSpec;
use super::validation::validate_pipeline;
use crate::bronze::SourceId;
use crate::gold::{GoldViews, ViewName};
use crate::lifecycle::{PublishedVersion, VersionStore};
use crate::quality::{QualityReport, gold_battery, silver_battery};
use crate::silver::ConformContext;
use crate::warehouse::{Warehouse, publish_views};
use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Time spent in one step of a run
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    /// `<layer>.<extent>` for per-extent steps, otherwise the step name
    pub step: String,
    pub rows: usize,
    pub elapsed: Duration,
}

/// A source whose extract could not be loaded
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub source: SourceId,
    pub path: PathBuf,
    pub message: String,
}

/// Report generated after pipeline execution
#[derive(Debug, Clone)]
pub struct RunReport {
    pub name: String,
    pub as_of: NaiveDate,

    /// Steps in execution order
    pub steps: Vec<StepTiming>,

    /// Sources skipped because their extract was rejected. The previous
    /// Raw version of these sources stays current.
    pub load_failures: Vec<LoadFailure>,

    /// Rows per Silver entity after conformance
    pub silver_rows: Vec<(&'static str, usize)>,

    /// Rows per Gold view
    pub gold_rows: Vec<(ViewName, usize)>,

    pub quality: QualityReport,

    /// Published snapshot of each view (empty when publishing is off)
    pub published: Vec<PublishedVersion>,

    /// Where the quality report was written
    pub report_path: Option<PathBuf>,

    /// Whether quality violations fail the run
    pub fail_on_violation: bool,

    /// Warnings generated during execution
    pub warnings: Vec<String>,

    /// Time taken for execution
    pub duration: Duration,
}

impl RunReport {
    pub fn sources_loaded(&self) -> usize {
        SourceId::ALL.len() - self.load_failures.len()
    }

    /// False if any source failed to load, or the quality gate failed while
    /// `fail_on_violation` is set
    pub fn is_success(&self) -> bool {
        self.load_failures.is_empty() && (!self.fail_on_violation || self.quality.passed())
    }

    pub fn step(&self, name: &str) -> Option<&StepTiming> {
        self.steps.iter().find(|s| s.step == name)
    }

    /// Create a summary message
    pub fn summary(&self) -> String {
        let silver_total: usize = self.silver_rows.iter().map(|(_, rows)| rows).sum();
        let gold_total: usize = self.gold_rows.iter().map(|(_, rows)| rows).sum();
        let failed_checks = self.quality.violations().count();

        let mut summary = format!(
            "Pipeline '{}' completed: {}/{} sources loaded, {} silver rows, {} gold rows, quality gate {} ({}/{} checks failed), {} views published, {:.2}s",
            self.name,
            self.sources_loaded(),
            SourceId::ALL.len(),
            silver_total,
            gold_total,
            if self.quality.passed() { "passed" } else { "failed" },
            failed_checks,
            self.quality.checks.len(),
            self.published.len(),
            self.duration.as_secs_f64()
        );

        for failure in &self.load_failures {
            summary.push_str(&format!("\n  ✗ {}: {}", failure.source, failure.message));
        }
        for warning in &self.warnings {
            summary.push_str(&format!("\n  ⚠ {warning}"));
        }
        summary
    }
}

/// Execute a pipeline spec against a fresh warehouse
pub fn run_pipeline(spec: &PipelineSpec) -> Result<RunReport> {
    let ctx = spec.as_of.map(ConformContext::new).unwrap_or_default();
    let warehouse = Warehouse::new(ctx)?;
    run_pipeline_on(&warehouse, spec)
}

/// Execute a pipeline spec against an existing warehouse.
///
/// Re-running on the same warehouse with unchanged extracts yields Silver and
/// Gold content identical to the previous run.
pub fn run_pipeline_on(warehouse: &Warehouse, spec: &PipelineSpec) -> Result<RunReport> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let mut steps = Vec::new();

    let (fatal, per_source): (Vec<_>, Vec<_>) = validate_pipeline(spec)
        .into_iter()
        .partition(|e| e.source.is_none());
    if let Some(first) = fatal.first() {
        return Err(anyhow::anyhow!("Invalid pipeline spec: {first}"));
    }
    warnings.extend(per_source.iter().map(ToString::to_string));

    tracing::info!(
        pipeline = spec.name.as_str(),
        source_dir = %spec.sources.dir.display(),
        as_of = %warehouse.context().as_of,
        "Pipeline started"
    );

    // Bronze
    let loads = warehouse.load_sources(&spec.sources.dir, &spec.sources.files);
    let mut load_failures = Vec::new();
    for load in loads {
        steps.push(StepTiming {
            step: format!("bronze.{}", load.source),
            rows: load.rows(),
            elapsed: load.elapsed,
        });
        if let Err(e) = load.result {
            load_failures.push(LoadFailure {
                source: load.source,
                path: load.path,
                message: e.to_string(),
            });
        }
    }

    // Silver
    let refresh = warehouse
        .refresh_silver()
        .context("Failed to refresh Silver layer")?;
    let silver_rows = refresh
        .entities
        .iter()
        .map(|e| (e.entity, e.output_rows))
        .collect();
    steps.extend(refresh.entities.iter().map(|e| StepTiming {
        step: format!("silver.{}", e.entity),
        rows: e.output_rows,
        elapsed: e.elapsed,
    }));

    // Gold and quality gate both read the same Silver snapshot
    let gold_start = Instant::now();
    let snapshot = warehouse.silver_snapshot()?;
    let views = GoldViews::build(&snapshot);
    let gold_rows: Vec<(ViewName, usize)> = ViewName::ALL
        .into_iter()
        .map(|view| (view, views.row_count(view)))
        .collect();
    steps.push(StepTiming {
        step: "gold".to_owned(),
        rows: gold_rows.iter().map(|(_, rows)| rows).sum(),
        elapsed: gold_start.elapsed(),
    });

    let quality_start = Instant::now();
    let mut quality = silver_battery(&snapshot, warehouse.context().as_of)?;
    quality.merge(gold_battery(&views)?);
    steps.push(StepTiming {
        step: "quality".to_owned(),
        rows: quality.violation_count(),
        elapsed: quality_start.elapsed(),
    });

    let mut published = Vec::new();
    if spec.output.publish {
        let publish_start = Instant::now();
        let store = VersionStore::new(spec.output.dir.clone())?;
        published = publish_views(&views, &store, spec.output.format)?;
        steps.push(StepTiming {
            step: "publish".to_owned(),
            rows: published.iter().map(|p| p.version.row_count).sum(),
            elapsed: publish_start.elapsed(),
        });
    }

    let report_path = spec.output.report_path();
    if let Some(path) = &report_path {
        quality.save(path)?;
    }

    if !quality.passed() {
        warnings.push(format!(
            "{} quality checks reported {} offending rows",
            quality.violations().count(),
            quality.violation_count()
        ));
    }

    let report = RunReport {
        name: spec.name.clone(),
        as_of: warehouse.context().as_of,
        steps,
        load_failures,
        silver_rows,
        gold_rows,
        quality,
        published,
        report_path,
        fail_on_violation: spec.quality.fail_on_violation,
        warnings,
        duration: start.elapsed(),
    };

    tracing::info!(
        pipeline = spec.name.as_str(),
        elapsed_ms = report.duration.as_millis() as u64,
        success = report.is_success(),
        "Pipeline finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bronze::SourceId;
    use tempfile::TempDir;

    fn write_headers_only(dir: &std::path::Path) -> Result<()> {
        for source in SourceId::ALL {
            std::fs::write(dir.join(source.default_file_name()), source.columns().join(","))?;
        }
        Ok(())
    }

    #[test]
    fn test_empty_extracts_run_cleanly() -> Result<()> {
        let source_dir = TempDir::new()?;
        let output_dir = TempDir::new()?;
        write_headers_only(source_dir.path())?;

        let mut spec = PipelineSpec::new("empty");
        spec.sources.dir = source_dir.path().to_path_buf();
        spec.output.dir = output_dir.path().to_path_buf();
        spec.as_of = NaiveDate::from_ymd_opt(2025, 1, 1);

        let report = run_pipeline(&spec)?;
        assert!(report.is_success(), "{}", report.summary());
        assert_eq!(report.sources_loaded(), 6);
        assert_eq!(report.published.len(), 3);
        assert!(report.step("bronze.crm_cust_info").is_some());
        assert!(report.step("publish").is_some());
        assert!(
            report.report_path.as_ref().is_some_and(|p| p.exists()),
            "Quality report is written"
        );
        Ok(())
    }

    #[test]
    fn test_missing_source_dir_is_fatal() {
        let mut spec = PipelineSpec::new("broken");
        spec.sources.dir = "/definitely/not/here".into();
        let err = run_pipeline(&spec).unwrap_err();
        assert!(err.to_string().contains("Source directory not found"));
    }

    #[test]
    fn test_missing_extract_is_a_load_failure() -> Result<()> {
        let source_dir = TempDir::new()?;
        write_headers_only(source_dir.path())?;
        std::fs::remove_file(source_dir.path().join("crm_sales_details.csv"))?;

        let mut spec = PipelineSpec::new("partial");
        spec.sources.dir = source_dir.path().to_path_buf();
        spec.output.publish = false;
        spec.output.report_file = None;

        let report = run_pipeline(&spec)?;
        assert_eq!(report.load_failures.len(), 1);
        assert_eq!(report.load_failures[0].source, SourceId::CrmSalesDetails);
        assert!(!report.is_success());
        assert!(report.published.is_empty());
        assert!(report.summary().contains("5/6 sources loaded"));
        Ok(())
    }
}
