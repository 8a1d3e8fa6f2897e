//! Bronze layer: raw extracts exactly as delivered.
//!
//! The [`RawStore`] holds one extent per [`SourceId`]. A load parses the
//! whole extract first and only then replaces the extent, so a malformed file
//! leaves the previous extent of that source in place and never touches the
//! other sources.

pub mod reader;
pub mod records;
pub mod source;

pub use reader::{RawFields, read_extract, read_frame};
pub use records::{
    CrmCustomerRaw, CrmProductRaw, CrmSalesRaw, ErpCategoryRaw, ErpCustomerRaw, ErpLocationRaw,
    RawRecord,
};
pub use source::SourceId;

use crate::error::{Result, WarehouseError};
use crate::lifecycle::{Extent, ExtentCell, ExtentVersion, Layer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of loading one source from disk
#[derive(Debug)]
pub struct SourceLoad {
    pub source: SourceId,
    pub path: PathBuf,
    pub elapsed: Duration,
    pub result: Result<ExtentVersion>,
}

impl SourceLoad {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn rows(&self) -> usize {
        self.result.as_ref().map_or(0, |v| v.row_count)
    }
}

/// Raw extents, one per source
#[derive(Debug)]
pub struct RawStore {
    pub(crate) crm_customers: ExtentCell<CrmCustomerRaw>,
    pub(crate) crm_products: ExtentCell<CrmProductRaw>,
    pub(crate) crm_sales: ExtentCell<CrmSalesRaw>,
    pub(crate) erp_customers: ExtentCell<ErpCustomerRaw>,
    pub(crate) erp_locations: ExtentCell<ErpLocationRaw>,
    pub(crate) erp_categories: ExtentCell<ErpCategoryRaw>,
}

impl RawStore {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            crm_customers: ExtentCell::new(SourceId::CrmCustInfo.as_str(), Layer::Bronze)?,
            crm_products: ExtentCell::new(SourceId::CrmPrdInfo.as_str(), Layer::Bronze)?,
            crm_sales: ExtentCell::new(SourceId::CrmSalesDetails.as_str(), Layer::Bronze)?,
            erp_customers: ExtentCell::new(SourceId::ErpCustAz12.as_str(), Layer::Bronze)?,
            erp_locations: ExtentCell::new(SourceId::ErpLocA101.as_str(), Layer::Bronze)?,
            erp_categories: ExtentCell::new(SourceId::ErpPxCatG1v2.as_str(), Layer::Bronze)?,
        })
    }

    /// Replace the extent of `R`'s source with `records`, in the given order
    pub fn load<R: RawRecord>(&self, records: Vec<R>) -> Result<ExtentVersion> {
        Ok(R::cell(self).replace(records)?)
    }

    /// The current extent of `R`'s source
    pub fn extent<R: RawRecord>(&self) -> Result<Arc<Extent<R>>> {
        Ok(R::cell(self).snapshot()?)
    }

    /// Parse `path` and replace the extent of `R`'s source with its rows
    pub fn load_file<R: RawRecord>(&self, path: &Path) -> Result<ExtentVersion> {
        let records = read_extract::<R>(path)?;
        self.load(records)
    }

    /// Load every source from `dir`, each independently of the others.
    ///
    /// `files` overrides the file name of individual sources; the rest use
    /// `<source_id>.csv`.
    pub fn load_from_dir(&self, dir: &Path, files: &BTreeMap<SourceId, String>) -> Vec<SourceLoad> {
        SourceId::ALL
            .into_iter()
            .map(|source| {
                let file_name = files
                    .get(&source)
                    .cloned()
                    .unwrap_or_else(|| source.default_file_name());
                let path = dir.join(file_name);
                let start = Instant::now();

                let result = match source {
                    SourceId::CrmCustInfo => self.load_file::<CrmCustomerRaw>(&path),
                    SourceId::CrmPrdInfo => self.load_file::<CrmProductRaw>(&path),
                    SourceId::CrmSalesDetails => self.load_file::<CrmSalesRaw>(&path),
                    SourceId::ErpCustAz12 => self.load_file::<ErpCustomerRaw>(&path),
                    SourceId::ErpLocA101 => self.load_file::<ErpLocationRaw>(&path),
                    SourceId::ErpPxCatG1v2 => self.load_file::<ErpCategoryRaw>(&path),
                };
                let elapsed = start.elapsed();

                match &result {
                    Ok(version) => tracing::info!(
                        source = source.as_str(),
                        rows = version.row_count,
                        sequence = version.sequence,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Source loaded"
                    ),
                    Err(e) => tracing::warn!(
                        source = source.as_str(),
                        path = %path.display(),
                        "Source load failed: {e}"
                    ),
                }

                SourceLoad {
                    source,
                    path,
                    elapsed,
                    result,
                }
            })
            .collect()
    }

    /// Current version of every source extent
    pub fn versions(&self) -> Result<Vec<ExtentVersion>> {
        let versions = vec![
            self.crm_customers.current_version()?,
            self.crm_products.current_version()?,
            self.crm_sales.current_version()?,
            self.erp_customers.current_version()?,
            self.erp_locations.current_version()?,
            self.erp_categories.current_version()?,
        ];
        Ok(versions)
    }

    /// Current version of one source extent
    pub fn version_of(&self, source: SourceId) -> Result<ExtentVersion> {
        let version = match source {
            SourceId::CrmCustInfo => self.crm_customers.current_version(),
            SourceId::CrmPrdInfo => self.crm_products.current_version(),
            SourceId::CrmSalesDetails => self.crm_sales.current_version(),
            SourceId::ErpCustAz12 => self.erp_customers.current_version(),
            SourceId::ErpLocA101 => self.erp_locations.current_version(),
            SourceId::ErpPxCatG1v2 => self.erp_categories.current_version(),
        };
        version.map_err(WarehouseError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn location(cid: &str, cntry: &str) -> ErpLocationRaw {
        ErpLocationRaw {
            cid: Some(cid.to_owned()),
            cntry: Some(cntry.to_owned()),
        }
    }

    #[test]
    fn test_load_replaces_whole_extent() -> anyhow::Result<()> {
        let store = RawStore::new()?;
        store.load(vec![location("AW-1", "DE"), location("AW-2", "US")])?;
        let version = store.load(vec![location("AW-3", "FR")])?;

        let extent = store.extent::<ErpLocationRaw>()?;
        assert_eq!(extent.rows(), &[location("AW-3", "FR")]);
        assert_eq!(version.sequence, 2);
        Ok(())
    }

    #[test]
    fn test_failed_load_keeps_previous_extent() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let good = temp.path().join("good.csv");
        let bad = temp.path().join("bad.csv");
        fs::write(&good, "cid,cntry\nAW-1,DE\nAW-2,US\n")?;
        fs::write(&bad, "cid,cntry\nAW-3,FR,extra\n")?;

        let store = RawStore::new()?;
        store.load_file::<ErpLocationRaw>(&good)?;
        assert!(store.load_file::<ErpLocationRaw>(&bad).is_err());

        let extent = store.extent::<ErpLocationRaw>()?;
        assert_eq!(extent.len(), 2, "Failed load must not replace the extent");
        Ok(())
    }

    #[test]
    fn test_load_from_dir_isolates_failures() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("erp_loc_a101.csv"), "cid,cntry\nAW-1,DE\n")?;
        fs::write(temp.path().join("cats.csv"), "id,cat,subcat,maintenance\nAC_BR,Accessories,Bike Racks,Yes\n")?;

        let mut files = BTreeMap::new();
        files.insert(SourceId::ErpPxCatG1v2, "cats.csv".to_owned());

        let store = RawStore::new()?;
        let loads = store.load_from_dir(temp.path(), &files);
        assert_eq!(loads.len(), 6);

        let ok: Vec<SourceId> = loads.iter().filter(|l| l.is_ok()).map(|l| l.source).collect();
        assert_eq!(ok, vec![SourceId::ErpLocA101, SourceId::ErpPxCatG1v2]);
        assert_eq!(store.extent::<ErpCategoryRaw>()?.len(), 1);
        assert!(!store.version_of(SourceId::CrmCustInfo)?.is_loaded());
        Ok(())
    }
}
