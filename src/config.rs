//! Persistent application settings and the refresh audit log.
//!
//! Stored as JSON at `<config dir>/medallion/config.json`. A missing or
//! unreadable file yields the defaults, so a first run needs no setup.

use crate::lifecycle::SnapshotFormat;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum number of audit entries kept in the config file
pub const AUDIT_LOG_LIMIT: usize = 1000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, action: impl Into<String>, details: impl Into<String>) {
        self.entries.push(AuditEntry {
            timestamp: Utc::now(),
            action: action.into(),
            details: details.into(),
        });

        if self.entries.len() > AUDIT_LOG_LIMIT {
            self.entries.drain(0..self.entries.len() - AUDIT_LOG_LIMIT);
        }
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Defaults used when a run does not name its own directories
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WarehouseSettings {
    /// Directory holding the six source extracts
    pub source_dir: PathBuf,
    /// Directory published Gold snapshots and reports are written to
    pub output_dir: PathBuf,
    pub export_format: SnapshotFormat,
    /// Exit non-zero when the quality gate reports violations
    pub fail_on_violation: bool,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data/source"),
            output_dir: PathBuf::from("data/gold"),
            export_format: SnapshotFormat::Csv,
            fail_on_violation: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub settings: WarehouseSettings,
    #[serde(default)]
    pub audit_log: AuditLog,
}

impl AppConfig {
    pub fn settings(&self) -> &WarehouseSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WarehouseSettings {
        &mut self.settings
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit_log
    }

    pub fn log_event(&mut self, action: impl Into<String>, details: impl Into<String>) {
        self.audit_log.push(action, details);
    }

    /// Read a config file; `None` if it is missing or not valid JSON
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Ignoring unreadable config: {e}");
                None
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medallion")
        .join("config.json")
}

pub fn load_app_config() -> AppConfig {
    AppConfig::load_from(&get_config_path()).unwrap_or_default()
}

pub fn save_app_config(config: &AppConfig) -> Result<()> {
    config.save_to(&get_config_path())
}
