//! Copy-on-write extents.
//!
//! An [`ExtentCell`] owns the current [`Extent`] of one logical table. A
//! refresh builds the complete replacement first and then swaps an `Arc`
//! under a short write lock, so readers holding a snapshot keep a complete
//! version and never observe a half-written one.

use super::layers::Layer;
use super::version::{ExtentVersion, VersionHistory};
use crate::integrity::fingerprint_rows;
use anyhow::Result;
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// One immutable version of an extent's rows
#[derive(Debug)]
pub struct Extent<T> {
    version: ExtentVersion,
    rows: Vec<T>,
}

impl<T> Extent<T> {
    pub fn version(&self) -> &ExtentVersion {
        &self.version
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Holder of the current version of a named extent
#[derive(Debug)]
pub struct ExtentCell<T> {
    name: &'static str,
    layer: Layer,
    current: RwLock<Arc<Extent<T>>>,
    history: RwLock<VersionHistory>,
}

impl<T: Serialize> ExtentCell<T> {
    /// Create an empty cell at sequence 0
    pub fn new(name: &'static str, layer: Layer) -> Result<Self> {
        let empty: Vec<T> = Vec::new();
        let version = ExtentVersion::initial(name, layer, fingerprint_rows(&empty)?);

        let mut history = VersionHistory::new(VersionHistory::DEFAULT_LIMIT);
        history.record(version.clone());

        Ok(Self {
            name,
            layer,
            current: RwLock::new(Arc::new(Extent {
                version,
                rows: empty,
            })),
            history: RwLock::new(history),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Replace the whole extent with `rows`
    pub fn replace(&self, rows: Vec<T>) -> Result<ExtentVersion> {
        self.install(rows, Vec::new())
    }

    /// Replace the whole extent with rows derived from `upstream` extents of
    /// the previous layer
    pub fn replace_derived(&self, rows: Vec<T>, upstream: &[&ExtentVersion]) -> Result<ExtentVersion> {
        for source in upstream {
            if !source.layer.can_transition_to(self.layer) {
                return Err(anyhow::anyhow!(
                    "Extent {} ({}) cannot be derived from {} ({})",
                    self.name,
                    self.layer,
                    source.extent,
                    source.layer
                ));
            }
        }

        self.install(rows, upstream.iter().map(|v| v.id).collect())
    }

    fn install(&self, rows: Vec<T>, upstream: Vec<uuid::Uuid>) -> Result<ExtentVersion> {
        // Hash before taking any lock; readers are never blocked on this
        let fingerprint = fingerprint_rows(&rows)?;

        let mut current = self
            .current
            .write()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;

        let version = current
            .version
            .successor(rows.len(), fingerprint, upstream);
        *current = Arc::new(Extent {
            version: version.clone(),
            rows,
        });
        drop(current);

        self.history
            .write()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?
            .record(version.clone());

        tracing::debug!(
            extent = self.name,
            layer = self.layer.as_str(),
            sequence = version.sequence,
            rows = version.row_count,
            "Extent replaced"
        );

        Ok(version)
    }

    /// The current complete version; unaffected by later replacements
    pub fn snapshot(&self) -> Result<Arc<Extent<T>>> {
        let current = self
            .current
            .read()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        Ok(Arc::clone(&current))
    }

    pub fn current_version(&self) -> Result<ExtentVersion> {
        Ok(self.snapshot()?.version.clone())
    }

    pub fn history(&self) -> Result<VersionHistory> {
        let history = self
            .history
            .read()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        Ok(history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_empty() -> Result<()> {
        let cell: ExtentCell<i64> = ExtentCell::new("numbers", Layer::Bronze)?;
        let snapshot = cell.snapshot()?;
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.version().sequence, 0);
        assert!(!snapshot.version().is_loaded());
        Ok(())
    }

    #[test]
    fn test_snapshot_survives_replacement() -> Result<()> {
        let cell = ExtentCell::new("numbers", Layer::Bronze)?;
        cell.replace(vec![1_i64, 2, 3])?;

        let before = cell.snapshot()?;
        cell.replace(vec![4_i64])?;
        let after = cell.snapshot()?;

        assert_eq!(before.rows(), &[1, 2, 3]);
        assert_eq!(after.rows(), &[4]);
        assert_eq!(after.version().parent_id, Some(before.version().id));
        assert_eq!(cell.history()?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_identical_rows_share_fingerprint() -> Result<()> {
        let cell = ExtentCell::new("numbers", Layer::Bronze)?;
        let first = cell.replace(vec![7_i64, 8])?;
        let second = cell.replace(vec![7_i64, 8])?;

        assert!(first.same_content(&second));
        assert_ne!(first.id, second.id);
        assert_eq!(second.sequence, first.sequence + 1);
        Ok(())
    }

    #[test]
    fn test_derivation_must_move_forward() -> Result<()> {
        let bronze = ExtentCell::new("raw", Layer::Bronze)?;
        let raw_version = bronze.replace(vec![1_i64])?;

        let gold: ExtentCell<i64> = ExtentCell::new("view", Layer::Gold)?;
        assert!(gold.replace_derived(vec![1], &[&raw_version]).is_err());

        let silver: ExtentCell<i64> = ExtentCell::new("conformed", Layer::Silver)?;
        let derived = silver.replace_derived(vec![1], &[&raw_version])?;
        assert_eq!(derived.upstream, vec![raw_version.id]);
        Ok(())
    }
}
