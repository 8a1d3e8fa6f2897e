//! Typed raw rows, one struct per source.
//!
//! Values go through primitive parsing only: integers and dates are parsed,
//! text is kept exactly as delivered (not trimmed) and an empty field is
//! `None`.

use super::RawStore;
use super::reader::RawFields;
use super::source::SourceId;
use crate::error::Result;
use crate::lifecycle::ExtentCell;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A row type that can be parsed from one extract line and stored in the
/// Raw Store
pub trait RawRecord: Serialize + Sized {
    const SOURCE: SourceId;

    /// Build a record from the fields of one line, in header order
    fn from_fields(fields: &RawFields<'_>) -> Result<Self>;

    /// The Raw Store cell holding this source's extent
    fn cell(store: &RawStore) -> &ExtentCell<Self>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrmCustomerRaw {
    pub cst_id: Option<i64>,
    pub cst_key: Option<String>,
    pub cst_firstname: Option<String>,
    pub cst_lastname: Option<String>,
    pub cst_marital_status: Option<String>,
    pub cst_gndr: Option<String>,
    pub cst_create_date: Option<NaiveDate>,
}

impl RawRecord for CrmCustomerRaw {
    const SOURCE: SourceId = SourceId::CrmCustInfo;

    fn from_fields(f: &RawFields<'_>) -> Result<Self> {
        Ok(Self {
            cst_id: f.int(0)?,
            cst_key: f.text(1),
            cst_firstname: f.text(2),
            cst_lastname: f.text(3),
            cst_marital_status: f.text(4),
            cst_gndr: f.text(5),
            cst_create_date: f.date(6)?,
        })
    }

    fn cell(store: &RawStore) -> &ExtentCell<Self> {
        &store.crm_customers
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrmProductRaw {
    pub prd_id: Option<i64>,
    /// Compound key: category id prefix plus product number
    pub prd_key: Option<String>,
    pub prd_nm: Option<String>,
    pub prd_cost: Option<i64>,
    pub prd_line: Option<String>,
    pub prd_start_dt: Option<NaiveDate>,
    pub prd_end_dt: Option<NaiveDate>,
}

impl RawRecord for CrmProductRaw {
    const SOURCE: SourceId = SourceId::CrmPrdInfo;

    fn from_fields(f: &RawFields<'_>) -> Result<Self> {
        Ok(Self {
            prd_id: f.int(0)?,
            prd_key: f.text(1),
            prd_nm: f.text(2),
            prd_cost: f.int(3)?,
            prd_line: f.text(4),
            prd_start_dt: f.date(5)?,
            prd_end_dt: f.date(6)?,
        })
    }

    fn cell(store: &RawStore) -> &ExtentCell<Self> {
        &store.crm_products
    }
}

/// Sales line; the three dates arrive as `YYYYMMDD` integers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrmSalesRaw {
    pub sls_ord_num: Option<String>,
    pub sls_prd_key: Option<String>,
    pub sls_cust_id: Option<i64>,
    pub sls_order_dt: Option<i64>,
    pub sls_ship_dt: Option<i64>,
    pub sls_due_dt: Option<i64>,
    pub sls_sales: Option<i64>,
    pub sls_quantity: Option<i64>,
    pub sls_price: Option<i64>,
}

impl RawRecord for CrmSalesRaw {
    const SOURCE: SourceId = SourceId::CrmSalesDetails;

    fn from_fields(f: &RawFields<'_>) -> Result<Self> {
        Ok(Self {
            sls_ord_num: f.text(0),
            sls_prd_key: f.text(1),
            sls_cust_id: f.int(2)?,
            sls_order_dt: f.int(3)?,
            sls_ship_dt: f.int(4)?,
            sls_due_dt: f.int(5)?,
            sls_sales: f.int(6)?,
            sls_quantity: f.int(7)?,
            sls_price: f.int(8)?,
        })
    }

    fn cell(store: &RawStore) -> &ExtentCell<Self> {
        &store.crm_sales
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErpCustomerRaw {
    pub cid: Option<String>,
    pub bdate: Option<NaiveDate>,
    #[serde(rename = "gen")]
    pub gender: Option<String>,
}

impl RawRecord for ErpCustomerRaw {
    const SOURCE: SourceId = SourceId::ErpCustAz12;

    fn from_fields(f: &RawFields<'_>) -> Result<Self> {
        Ok(Self {
            cid: f.text(0),
            bdate: f.date(1)?,
            gender: f.text(2),
        })
    }

    fn cell(store: &RawStore) -> &ExtentCell<Self> {
        &store.erp_customers
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErpLocationRaw {
    pub cid: Option<String>,
    pub cntry: Option<String>,
}

impl RawRecord for ErpLocationRaw {
    const SOURCE: SourceId = SourceId::ErpLocA101;

    fn from_fields(f: &RawFields<'_>) -> Result<Self> {
        Ok(Self {
            cid: f.text(0),
            cntry: f.text(1),
        })
    }

    fn cell(store: &RawStore) -> &ExtentCell<Self> {
        &store.erp_locations
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErpCategoryRaw {
    pub id: Option<String>,
    pub cat: Option<String>,
    pub subcat: Option<String>,
    pub maintenance: Option<String>,
}

impl RawRecord for ErpCategoryRaw {
    const SOURCE: SourceId = SourceId::ErpPxCatG1v2;

    fn from_fields(f: &RawFields<'_>) -> Result<Self> {
        Ok(Self {
            id: f.text(0),
            cat: f.text(1),
            subcat: f.text(2),
            maintenance: f.text(3),
        })
    }

    fn cell(store: &RawStore) -> &ExtentCell<Self> {
        &store.erp_categories
    }
}
