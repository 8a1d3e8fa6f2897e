//! Quality Gate: read-only checks over the Silver extents and Gold views.
//!
//! The gate never changes data and never stops a refresh. It reports, for
//! every check, the rows that violate it; what to do about a dirty report is
//! up to the caller (see `fail_on_violation` in the pipeline spec).

pub mod battery;
pub mod checks;

pub use battery::{gold_battery, silver_battery};

use crate::error::{Result, ResultExt as _};
use crate::lifecycle::Layer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Outcome of one check against one extent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check kind, e.g. `uniqueness`
    pub name: String,
    pub extent: String,
    pub layer: Layer,
    /// What was asserted, e.g. `cst_id is unique and not null`
    pub description: String,
    pub offending_count: usize,
    /// Offending rows in the shape of the checked extent
    pub offending: Vec<serde_json::Value>,
}

impl CheckResult {
    pub fn from_rows<T: Serialize>(
        name: &str,
        extent: &str,
        layer: Layer,
        description: impl Into<String>,
        rows: &[&T],
    ) -> Result<Self> {
        let offending = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to serialize offending rows")?;

        Ok(Self {
            name: name.to_owned(),
            extent: extent.to_owned(),
            layer,
            description: description.into(),
            offending_count: offending.len(),
            offending,
        })
    }

    pub fn passed(&self) -> bool {
        self.offending_count == 0
    }
}

/// Results of a battery of checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub generated_at: DateTime<Utc>,
    pub checks: Vec<CheckResult>,
}

impl Default for QualityReport {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            checks: Vec::new(),
        }
    }

    pub fn push(&mut self, check: CheckResult) {
        if !check.passed() {
            tracing::warn!(
                check = check.name.as_str(),
                extent = check.extent.as_str(),
                rows = check.offending_count,
                "Quality check failed: {}",
                check.description
            );
        }
        self.checks.push(check);
    }

    /// Append all checks of `other`
    pub fn merge(&mut self, other: Self) {
        self.checks.extend(other.checks);
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(CheckResult::passed)
    }

    pub fn violations(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed())
    }

    /// Total offending rows over all checks
    pub fn violation_count(&self) -> usize {
        self.checks.iter().map(|c| c.offending_count).sum()
    }

    /// Checks run against one extent
    pub fn for_extent<'a>(&'a self, extent: &'a str) -> impl Iterator<Item = &'a CheckResult> {
        self.checks.iter().filter(move |c| c.extent == extent)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write quality report: {}", path.display()))
    }

    pub fn format_cli(&self) -> String {
        let failed: Vec<&CheckResult> = self.violations().collect();
        let mut output = format!(
            "Quality gate: {} checks, {} failed, {} offending rows\n",
            self.checks.len(),
            failed.len(),
            self.violation_count()
        );
        for check in &self.checks {
            let mark = if check.passed() { "✓" } else { "✗" };
            output.push_str(&format!(
                "  {mark} [{}] {}.{}: {}",
                check.layer, check.extent, check.name, check.description
            ));
            if !check.passed() {
                output.push_str(&format!(" ({} rows)", check.offending_count));
            }
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_report_pass_and_fail() -> Result<()> {
        let mut report = QualityReport::new();
        report.push(CheckResult::from_rows::<i64>(
            "uniqueness",
            "dim_customers",
            Layer::Gold,
            "customer_key is unique",
            &[],
        )?);
        assert!(report.passed());

        report.push(CheckResult::from_rows(
            "non_negative",
            "crm_prd_info",
            Layer::Silver,
            "prd_cost is not negative",
            &[&-3_i64],
        )?);
        assert!(!report.passed());
        assert_eq!(report.violations().count(), 1);
        assert_eq!(report.violation_count(), 1);
        assert_eq!(report.for_extent("crm_prd_info").count(), 1);
        assert!(report.format_cli().contains("✗ [silver] crm_prd_info.non_negative"));
        Ok(())
    }

    #[test]
    fn test_report_save() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("reports").join("quality.json");

        let report = QualityReport::new();
        report.save(&path)?;

        let saved: QualityReport = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(saved, report);
        Ok(())
    }
}
