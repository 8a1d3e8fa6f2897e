//! Version records for extents

use super::layers::Layer;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for one immutable version of an extent.
///
/// Every refresh of an extent produces a new version; the previous version is
/// referenced through `parent_id`. `upstream` lists the versions of the
/// previous layer the rows were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtentVersion {
    pub id: Uuid,
    pub extent: String,
    pub layer: Layer,
    /// 0 for the empty extent a cell starts with, then 1, 2, ...
    pub sequence: u64,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub upstream: Vec<Uuid>,
    pub row_count: usize,
    /// SHA-256 over the canonical JSON of the rows
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

impl ExtentVersion {
    /// The empty version a freshly created extent starts at
    pub fn initial(extent: impl Into<String>, layer: Layer, fingerprint: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            extent: extent.into(),
            layer,
            sequence: 0,
            parent_id: None,
            upstream: Vec::new(),
            row_count: 0,
            fingerprint,
            created_at: Utc::now(),
        }
    }

    /// The version that replaces `self`
    pub fn successor(&self, row_count: usize, fingerprint: String, upstream: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            extent: self.extent.clone(),
            layer: self.layer,
            sequence: self.sequence + 1,
            parent_id: Some(self.id),
            upstream,
            row_count,
            fingerprint,
            created_at: Utc::now(),
        }
    }

    /// True if both versions hold exactly the same rows
    pub fn same_content(&self, other: &Self) -> bool {
        self.extent == other.extent && self.fingerprint == other.fingerprint
    }

    pub fn is_loaded(&self) -> bool {
        self.sequence > 0
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize version")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize version")
    }
}

/// Bounded lineage of versions for one extent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionHistory {
    versions: Vec<ExtentVersion>,
    limit: usize,
}

impl VersionHistory {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn new(limit: usize) -> Self {
        Self {
            versions: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn record(&mut self, version: ExtentVersion) {
        self.versions.push(version);
        if self.versions.len() > self.limit {
            let excess = self.versions.len() - self.limit;
            self.versions.drain(0..excess);
        }
    }

    pub fn latest(&self) -> Option<&ExtentVersion> {
        self.versions.last()
    }

    pub fn get(&self, id: &Uuid) -> Option<&ExtentVersion> {
        self.versions.iter().find(|v| v.id == *id)
    }

    /// Versions from the oldest retained ancestor up to `version_id`
    pub fn lineage(&self, version_id: &Uuid) -> Vec<&ExtentVersion> {
        let mut lineage = Vec::new();
        let mut current_id = *version_id;

        while let Some(version) = self.get(&current_id) {
            lineage.push(version);
            if let Some(parent_id) = version.parent_id {
                current_id = parent_id;
            } else {
                break;
            }
        }

        lineage.reverse();
        lineage
    }

    pub fn list_all(&self) -> &[ExtentVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successor_links_parent() {
        let v0 = ExtentVersion::initial("crm_cust_info", Layer::Bronze, "e3b0".to_owned());
        let v1 = v0.successor(10, "abcd".to_owned(), Vec::new());

        assert_eq!(v1.sequence, 1);
        assert_eq!(v1.parent_id, Some(v0.id));
        assert_eq!(v1.layer, Layer::Bronze);
        assert!(v1.is_loaded());
        assert!(!v0.is_loaded());
        assert!(!v1.same_content(&v0));
    }

    #[test]
    fn test_history_lineage_and_limit() {
        let mut history = VersionHistory::new(3);
        let mut current = ExtentVersion::initial("x", Layer::Silver, String::new());
        history.record(current.clone());
        for n in 1..=4 {
            current = current.successor(n, format!("fp{n}"), Vec::new());
            history.record(current.clone());
        }

        assert_eq!(history.len(), 3);
        let latest = history.latest().expect("history has versions");
        assert_eq!(latest.sequence, 4);

        let lineage = history.lineage(&latest.id);
        let sequences: Vec<u64> = lineage.iter().map(|v| v.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 4]);
    }

    #[test]
    fn test_version_json_roundtrip() -> Result<()> {
        let v = ExtentVersion::initial("dim_customers", Layer::Gold, "ff".to_owned());
        let parsed = ExtentVersion::from_json(&v.to_json()?)?;
        assert_eq!(parsed, v);
        Ok(())
    }
}
