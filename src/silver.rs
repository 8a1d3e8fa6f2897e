//! Silver layer: conformed entities.
//!
//! The [`ConformanceEngine`] reads the current Raw Store extents, applies the
//! field rules in [`rules`] and the set stages in [`ops`], and replaces every
//! Silver extent. Conformance never fails on data; only lock failures surface
//! as errors.

pub mod crm;
pub mod erp;
pub mod ops;
pub mod rules;

pub use crm::{Customer, Product, SalesDetail, conform_customers, conform_products, conform_sales};
pub use erp::{
    ErpCustomer, ErpLocation, ProductCategory, conform_categories, conform_erp_customers,
    conform_locations,
};

use crate::bronze::{RawRecord, RawStore, SourceId};
use crate::lifecycle::{Extent, ExtentCell, ExtentVersion, Layer};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Inputs to conformance that are not part of the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConformContext {
    /// Processing date; dates after it are implausible
    pub as_of: NaiveDate,
}

impl ConformContext {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }
}

impl Default for ConformContext {
    fn default() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

/// Conformed extents
#[derive(Debug)]
pub struct SilverStore {
    customers: ExtentCell<Customer>,
    products: ExtentCell<Product>,
    sales: ExtentCell<SalesDetail>,
    erp_customers: ExtentCell<ErpCustomer>,
    locations: ExtentCell<ErpLocation>,
    categories: ExtentCell<ProductCategory>,
}

/// The Silver extents as of one moment; later refreshes don't affect it
#[derive(Debug, Clone)]
pub struct SilverSnapshot {
    pub customers: Arc<Extent<Customer>>,
    pub products: Arc<Extent<Product>>,
    pub sales: Arc<Extent<SalesDetail>>,
    pub erp_customers: Arc<Extent<ErpCustomer>>,
    pub locations: Arc<Extent<ErpLocation>>,
    pub categories: Arc<Extent<ProductCategory>>,
}

impl SilverSnapshot {
    pub fn versions(&self) -> Vec<&ExtentVersion> {
        vec![
            self.customers.version(),
            self.products.version(),
            self.sales.version(),
            self.erp_customers.version(),
            self.locations.version(),
            self.categories.version(),
        ]
    }
}

impl SilverStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            customers: ExtentCell::new(SourceId::CrmCustInfo.as_str(), Layer::Silver)?,
            products: ExtentCell::new(SourceId::CrmPrdInfo.as_str(), Layer::Silver)?,
            sales: ExtentCell::new(SourceId::CrmSalesDetails.as_str(), Layer::Silver)?,
            erp_customers: ExtentCell::new(SourceId::ErpCustAz12.as_str(), Layer::Silver)?,
            locations: ExtentCell::new(SourceId::ErpLocA101.as_str(), Layer::Silver)?,
            categories: ExtentCell::new(SourceId::ErpPxCatG1v2.as_str(), Layer::Silver)?,
        })
    }

    pub fn snapshot(&self) -> Result<SilverSnapshot> {
        Ok(SilverSnapshot {
            customers: self.customers.snapshot()?,
            products: self.products.snapshot()?,
            sales: self.sales.snapshot()?,
            erp_customers: self.erp_customers.snapshot()?,
            locations: self.locations.snapshot()?,
            categories: self.categories.snapshot()?,
        })
    }
}

/// Result of conforming one entity
#[derive(Debug, Clone, Serialize)]
pub struct EntityRefresh {
    pub entity: &'static str,
    pub input_rows: usize,
    pub output_rows: usize,
    pub version: ExtentVersion,
    pub elapsed: Duration,
}

/// Result of a full Silver refresh
#[derive(Debug, Clone, Serialize)]
pub struct SilverRefresh {
    pub entities: Vec<EntityRefresh>,
    pub elapsed: Duration,
}

impl SilverRefresh {
    pub fn total_rows(&self) -> usize {
        self.entities.iter().map(|e| e.output_rows).sum()
    }

    pub fn entity(&self, name: &str) -> Option<&EntityRefresh> {
        self.entities.iter().find(|e| e.entity == name)
    }
}

/// Derives every Silver extent from the Raw Store
#[derive(Debug, Clone, Copy, Default)]
pub struct ConformanceEngine {
    ctx: ConformContext,
}

impl ConformanceEngine {
    pub fn new(ctx: ConformContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ConformContext {
        &self.ctx
    }

    /// Conform all six entities and replace the Silver extents
    pub fn refresh(&self, raw: &RawStore, silver: &SilverStore) -> Result<SilverRefresh> {
        let start = Instant::now();
        tracing::info!(as_of = %self.ctx.as_of, "Silver refresh started");

        let entities = vec![
            self.conform_entity(raw, &silver.customers, conform_customers)?,
            self.conform_entity(raw, &silver.products, conform_products)?,
            self.conform_entity(raw, &silver.sales, conform_sales)?,
            self.conform_entity(raw, &silver.erp_customers, conform_erp_customers)?,
            self.conform_entity(raw, &silver.locations, conform_locations)?,
            self.conform_entity(raw, &silver.categories, conform_categories)?,
        ];

        let refresh = SilverRefresh {
            entities,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            rows = refresh.total_rows(),
            elapsed_ms = refresh.elapsed.as_millis() as u64,
            "Silver refresh finished"
        );
        Ok(refresh)
    }

    fn conform_entity<R, T>(
        &self,
        raw: &RawStore,
        target: &ExtentCell<T>,
        conform: fn(&[R], &ConformContext) -> Vec<T>,
    ) -> Result<EntityRefresh>
    where
        R: RawRecord,
        T: Serialize,
    {
        let start = Instant::now();
        let source = R::cell(raw).snapshot()?;
        let rows = conform(source.rows(), &self.ctx);
        let output_rows = rows.len();
        let version = target.replace_derived(rows, &[source.version()])?;
        let elapsed = start.elapsed();

        tracing::info!(
            entity = target.name(),
            input_rows = source.len(),
            output_rows,
            elapsed_ms = elapsed.as_millis() as u64,
            "Entity conformed"
        );

        Ok(EntityRefresh {
            entity: target.name(),
            input_rows: source.len(),
            output_rows,
            version,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bronze::{CrmCustomerRaw, ErpLocationRaw};

    fn engine() -> ConformanceEngine {
        ConformanceEngine::new(ConformContext::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        ))
    }

    fn customers() -> Vec<CrmCustomerRaw> {
        vec![
            CrmCustomerRaw {
                cst_id: Some(11000),
                cst_key: Some("AW00011000".to_owned()),
                cst_gndr: Some("M".to_owned()),
                ..Default::default()
            },
            CrmCustomerRaw {
                cst_id: Some(11001),
                cst_key: Some("AW00011001".to_owned()),
                cst_gndr: Some("F".to_owned()),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_refresh_replaces_all_entities() -> Result<()> {
        let raw = RawStore::new()?;
        raw.load(customers())?;
        raw.load(vec![ErpLocationRaw {
            cid: Some("AW-00011000".to_owned()),
            cntry: Some("US".to_owned()),
        }])?;

        let silver = SilverStore::new()?;
        let refresh = engine().refresh(&raw, &silver)?;

        assert_eq!(refresh.entities.len(), 6);
        assert_eq!(refresh.total_rows(), 3);
        assert_eq!(refresh.entity("crm_cust_info").map(|e| e.output_rows), Some(2));

        let snapshot = silver.snapshot()?;
        assert_eq!(snapshot.locations.rows()[0].cntry, "United States");
        assert!(snapshot.versions().iter().all(|v| v.layer == Layer::Silver));
        Ok(())
    }

    #[test]
    fn test_refresh_is_idempotent() -> Result<()> {
        let raw = RawStore::new()?;
        raw.load(customers())?;
        let silver = SilverStore::new()?;

        let first = engine().refresh(&raw, &silver)?;
        let second = engine().refresh(&raw, &silver)?;

        for (a, b) in first.entities.iter().zip(&second.entities) {
            assert!(a.version.same_content(&b.version), "{} changed", a.entity);
            assert_eq!(b.version.sequence, a.version.sequence + 1);
        }
        Ok(())
    }

    #[test]
    fn test_snapshot_is_isolated_from_refresh() -> Result<()> {
        let raw = RawStore::new()?;
        raw.load(customers())?;
        let silver = SilverStore::new()?;
        engine().refresh(&raw, &silver)?;

        let before = silver.snapshot()?;
        raw.load(Vec::<CrmCustomerRaw>::new())?;
        engine().refresh(&raw, &silver)?;

        assert_eq!(before.customers.len(), 2);
        assert!(silver.snapshot()?.customers.is_empty());
        Ok(())
    }
}
