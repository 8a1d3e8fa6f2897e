//! The warehouse: Bronze, Silver and Gold behind one handle.

use crate::bronze::{RawStore, SourceId, SourceLoad};
use crate::gold::{GoldViews, ViewName};
use crate::lifecycle::{PublishedVersion, SnapshotFormat, VersionStore};
use crate::quality::{QualityReport, gold_battery, silver_battery};
use crate::silver::{ConformContext, ConformanceEngine, SilverRefresh, SilverSnapshot, SilverStore};
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Owns the Raw and Silver stores and computes Gold views on request.
///
/// Every step reads complete snapshots, so a reader running alongside a
/// refresh sees either the old or the new version of each extent.
#[derive(Debug)]
pub struct Warehouse {
    raw: RawStore,
    silver: SilverStore,
    engine: ConformanceEngine,
}

impl Warehouse {
    pub fn new(ctx: ConformContext) -> Result<Self> {
        Ok(Self {
            raw: RawStore::new()?,
            silver: SilverStore::new()?,
            engine: ConformanceEngine::new(ctx),
        })
    }

    pub fn raw(&self) -> &RawStore {
        &self.raw
    }

    pub fn silver(&self) -> &SilverStore {
        &self.silver
    }

    pub fn context(&self) -> &ConformContext {
        self.engine.context()
    }

    /// Load every source extract found in `dir`; failures are per source
    pub fn load_sources(&self, dir: &Path, files: &BTreeMap<SourceId, String>) -> Vec<SourceLoad> {
        self.raw.load_from_dir(dir, files)
    }

    /// Re-derive every Silver extent from the current Raw Store
    pub fn refresh_silver(&self) -> Result<SilverRefresh> {
        self.engine.refresh(&self.raw, &self.silver)
    }

    pub fn silver_snapshot(&self) -> Result<SilverSnapshot> {
        self.silver.snapshot()
    }

    /// Compute the Gold views from the current Silver snapshot
    pub fn gold_views(&self) -> Result<GoldViews> {
        Ok(GoldViews::build(&self.silver_snapshot()?))
    }

    /// Run the Silver and Gold batteries against one Silver snapshot
    pub fn quality_report(&self) -> Result<QualityReport> {
        let snapshot = self.silver_snapshot()?;
        let views = GoldViews::build(&snapshot);

        let mut report = silver_battery(&snapshot, self.context().as_of)?;
        report.merge(gold_battery(&views)?);
        Ok(report)
    }
}

/// Materialize every Gold view into `store`.
///
/// A view whose content matches its latest published version is not written
/// again; that version is returned instead.
pub fn publish_views(
    views: &GoldViews,
    store: &VersionStore,
    format: SnapshotFormat,
) -> Result<Vec<PublishedVersion>> {
    let mut published = Vec::with_capacity(ViewName::ALL.len());

    for view in ViewName::ALL {
        let fingerprint = views.fingerprint(view)?;

        if let Some(latest) = store.latest(view.as_str())?
            && latest.version.fingerprint == fingerprint
            && latest.format == format
            && latest.location.path().exists()
        {
            tracing::info!(
                view = view.as_str(),
                sequence = latest.version.sequence,
                "View unchanged, keeping published version"
            );
            published.push(latest);
            continue;
        }

        let version = store.next_version(
            view.as_str(),
            views.row_count(view),
            fingerprint,
            views.upstream.clone(),
        )?;
        let mut df = views
            .to_frame(view)
            .with_context(|| format!("Failed to build frame for {view}"))?;
        let record = store.publish(version, &mut df, format)?;

        tracing::info!(
            view = view.as_str(),
            sequence = record.version.sequence,
            rows = record.version.row_count,
            path = %record.location.path().display(),
            "View published"
        );
        published.push(record);
    }

    Ok(published)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bronze::{CrmCustomerRaw, ErpCustomerRaw};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn warehouse() -> Result<Warehouse> {
        Warehouse::new(ConformContext::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()))
    }

    #[test]
    fn test_gold_views_follow_refresh() -> Result<()> {
        let wh = warehouse()?;
        wh.raw().load(vec![CrmCustomerRaw {
            cst_id: Some(11000),
            cst_key: Some("AW00011000".to_owned()),
            ..Default::default()
        }])?;
        wh.raw().load(vec![ErpCustomerRaw {
            cid: Some("NASAW00011000".to_owned()),
            bdate: NaiveDate::from_ymd_opt(1971, 10, 6),
            gender: Some("Female".to_owned()),
        }])?;

        assert!(wh.gold_views()?.dim_customers.is_empty(), "Nothing conformed yet");

        wh.refresh_silver()?;
        let views = wh.gold_views()?;
        assert_eq!(views.dim_customers.len(), 1);
        assert_eq!(views.dim_customers[0].gender, "Female");
        assert_eq!(views.dim_customers[0].birthdate, NaiveDate::from_ymd_opt(1971, 10, 6));

        assert!(wh.quality_report()?.passed());
        Ok(())
    }

    #[test]
    fn test_publish_skips_unchanged_views() -> Result<()> {
        let temp = TempDir::new()?;
        let store = VersionStore::new(temp.path().to_path_buf())?;

        let wh = warehouse()?;
        wh.raw().load(vec![CrmCustomerRaw {
            cst_id: Some(11000),
            cst_key: Some("AW00011000".to_owned()),
            ..Default::default()
        }])?;
        wh.refresh_silver()?;

        let first = publish_views(&wh.gold_views()?, &store, SnapshotFormat::Csv)?;
        assert_eq!(first.len(), 3);

        wh.refresh_silver()?;
        let second = publish_views(&wh.gold_views()?, &store, SnapshotFormat::Csv)?;
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.version.id, b.version.id, "Unchanged view is not republished");
        }
        assert_eq!(store.list_versions("dim_customers")?.len(), 1);
        Ok(())
    }
}
