//! Pipeline specification data structures.
//!
//! A pipeline spec is the JSON description of one batch run: where the source
//! extracts live, where Gold snapshots go, and how the quality gate reacts.

use crate::bronze::SourceId;
use crate::config::WarehouseSettings;
use crate::lifecycle::SnapshotFormat;
use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Current pipeline spec version
pub const SPEC_VERSION: &str = "0.1";

/// Root pipeline specification structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Specification version for future migrations
    pub version: String,

    /// Human-readable pipeline name
    pub name: String,

    pub sources: SourcesConfig,

    pub output: OutputConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    /// Reference date for "not in the future" rules; today when absent
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

impl PipelineSpec {
    /// Create a new pipeline spec with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SPEC_VERSION.to_owned(),
            name: name.into(),
            sources: SourcesConfig::default(),
            output: OutputConfig::default(),
            quality: QualityConfig::default(),
            as_of: None,
        }
    }

    /// Derive a spec from the persisted application settings
    pub fn from_settings(name: impl Into<String>, settings: &WarehouseSettings) -> Self {
        let mut spec = Self::new(name);
        spec.sources.dir.clone_from(&settings.source_dir);
        spec.output.dir.clone_from(&settings.output_dir);
        spec.output.format = settings.export_format;
        spec.quality.fail_on_violation = settings.fail_on_violation;
        spec
    }

    /// Load a pipeline spec from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read pipeline spec file")?;
        Self::from_json(&content)
    }

    /// Parse a pipeline spec from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse pipeline spec JSON")
    }

    /// Save pipeline spec to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json).context("Failed to write pipeline spec file")
    }

    /// Serialize pipeline spec to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline spec")
    }

    /// Path of the extract for `source`
    pub fn source_path(&self, source: SourceId) -> PathBuf {
        let file_name = self
            .sources
            .files
            .get(&source)
            .cloned()
            .unwrap_or_else(|| source.default_file_name());
        self.sources.dir.join(file_name)
    }
}

/// Where the source extracts are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub dir: PathBuf,

    /// Per-source file name overrides; unlisted sources use `<source_id>.csv`
    #[serde(default)]
    pub files: BTreeMap<SourceId, String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            dir: default_source_dir(),
            files: BTreeMap::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,

    #[serde(default)]
    pub format: SnapshotFormat,

    /// Materialize the Gold views into `dir`
    #[serde(default = "default_true")]
    pub publish: bool,

    /// Where to write the quality report, relative to `dir` unless absolute
    #[serde(default = "default_report_file")]
    pub report_file: Option<PathBuf>,
}

impl OutputConfig {
    /// Resolved path of the quality report, if one is requested
    pub fn report_path(&self) -> Option<PathBuf> {
        self.report_file.as_ref().map(|file| {
            if file.is_absolute() {
                file.clone()
            } else {
                self.dir.join(file)
            }
        })
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: SnapshotFormat::default(),
            publish: true,
            report_file: default_report_file(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Treat any quality violation as a failed run
    #[serde(default)]
    pub fail_on_violation: bool,
}

fn default_source_dir() -> PathBuf {
    WarehouseSettings::default().source_dir
}

fn default_output_dir() -> PathBuf {
    WarehouseSettings::default().output_dir
}

fn default_true() -> bool {
    true
}

fn default_report_file() -> Option<PathBuf> {
    Some(PathBuf::from("quality_report.json"))
}
