//! Conformed ERP entities.

use super::ConformContext;
use super::rules::{COUNTRY, ERP_GENDER, null_if_future, remove_dashes, strip_legacy_prefix, trim_text};
use crate::bronze::{ErpCategoryRaw, ErpCustomerRaw, ErpLocationRaw};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Demographics keyed by the CRM customer key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpCustomer {
    pub cid: Option<String>,
    pub bdate: Option<NaiveDate>,
    #[serde(rename = "gen")]
    pub gender: String,
}

pub fn conform_erp_customers(raw: &[ErpCustomerRaw], ctx: &ConformContext) -> Vec<ErpCustomer> {
    raw.iter()
        .map(|r| ErpCustomer {
            cid: trim_text(r.cid.as_deref()).map(|cid| strip_legacy_prefix(&cid)),
            bdate: null_if_future(r.bdate, ctx.as_of),
            gender: ERP_GENDER.standardize(r.gender.as_deref()),
        })
        .collect()
}

/// Country keyed by the CRM customer key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpLocation {
    pub cid: Option<String>,
    pub cntry: String,
}

pub fn conform_locations(raw: &[ErpLocationRaw], _ctx: &ConformContext) -> Vec<ErpLocation> {
    raw.iter()
        .map(|r| ErpLocation {
            cid: trim_text(r.cid.as_deref()).map(|cid| remove_dashes(&cid)),
            cntry: COUNTRY.standardize(r.cntry.as_deref()),
        })
        .collect()
}

/// Category and subcategory of a product category id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: Option<String>,
    pub cat: Option<String>,
    pub subcat: Option<String>,
    pub maintenance: Option<String>,
}

pub fn conform_categories(raw: &[ErpCategoryRaw], _ctx: &ConformContext) -> Vec<ProductCategory> {
    raw.iter()
        .map(|r| ProductCategory {
            id: trim_text(r.id.as_deref()),
            cat: trim_text(r.cat.as_deref()),
            subcat: trim_text(r.subcat.as_deref()),
            maintenance: trim_text(r.maintenance.as_deref()),
        })
        .collect()
}
