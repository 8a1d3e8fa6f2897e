//! Gold layer: dimensional views over the conformed extents.
//!
//! Views are virtual. [`GoldViews::build`] computes all three from one
//! [`SilverSnapshot`] on every read, and this is the only place surrogate keys
//! are assigned. Keys are reproducible only while the Silver input is
//! unchanged.

pub mod dimension;
pub mod fact;
pub mod frame;
pub mod keys;

pub use dimension::{DimCustomer, DimProduct, build_dim_customers, build_dim_products};
pub use fact::{FactSales, build_fact_sales};
pub use keys::{Lookup, SurrogateKey, assign_surrogate_keys};

use crate::error::Result;
use crate::integrity::fingerprint_rows;
use crate::silver::SilverSnapshot;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named Gold view
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewName {
    DimCustomers,
    DimProducts,
    FactSales,
}

impl ViewName {
    pub const ALL: [Self; 3] = [Self::DimCustomers, Self::DimProducts, Self::FactSales];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DimCustomers => "dim_customers",
            Self::DimProducts => "dim_products",
            Self::FactSales => "fact_sales",
        }
    }
}

impl std::fmt::Display for ViewName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three Gold views computed from one Silver snapshot
#[derive(Debug, Clone)]
pub struct GoldViews {
    pub dim_customers: Vec<DimCustomer>,
    pub dim_products: Vec<DimProduct>,
    pub fact_sales: Vec<FactSales>,
    /// Silver versions the views were computed from
    pub upstream: Vec<Uuid>,
}

impl GoldViews {
    pub fn build(snapshot: &SilverSnapshot) -> Self {
        let dim_customers = build_dim_customers(
            snapshot.customers.rows(),
            snapshot.erp_customers.rows(),
            snapshot.locations.rows(),
        );
        let dim_products = build_dim_products(snapshot.products.rows(), snapshot.categories.rows());
        let fact_sales = build_fact_sales(snapshot.sales.rows(), &dim_products, &dim_customers);

        tracing::debug!(
            dim_customers = dim_customers.len(),
            dim_products = dim_products.len(),
            fact_sales = fact_sales.len(),
            "Gold views built"
        );

        Self {
            dim_customers,
            dim_products,
            fact_sales,
            upstream: snapshot.versions().iter().map(|v| v.id).collect(),
        }
    }

    pub fn row_count(&self, view: ViewName) -> usize {
        match view {
            ViewName::DimCustomers => self.dim_customers.len(),
            ViewName::DimProducts => self.dim_products.len(),
            ViewName::FactSales => self.fact_sales.len(),
        }
    }

    /// Content fingerprint of one view
    pub fn fingerprint(&self, view: ViewName) -> Result<String> {
        match view {
            ViewName::DimCustomers => fingerprint_rows(&self.dim_customers),
            ViewName::DimProducts => fingerprint_rows(&self.dim_products),
            ViewName::FactSales => fingerprint_rows(&self.fact_sales),
        }
    }

    /// One view as a frame with the business column names
    pub fn to_frame(&self, view: ViewName) -> Result<DataFrame> {
        match view {
            ViewName::DimCustomers => frame::dim_customers_frame(&self.dim_customers),
            ViewName::DimProducts => frame::dim_products_frame(&self.dim_products),
            ViewName::FactSales => frame::fact_sales_frame(&self.fact_sales),
        }
    }
}
