//! Conformed CRM entities: customers, products and sales lines.

use super::ConformContext;
use super::ops::{Versioned, derive_validity_intervals, latest_per_key};
use super::rules::{
    CRM_GENDER, MARITAL_STATUS, PRODUCT_LINE, default_non_negative, null_if_future,
    parse_yyyymmdd, reconcile_measure, split_product_key, trim_text,
};
use crate::bronze::{CrmCustomerRaw, CrmProductRaw, CrmSalesRaw};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One customer per `cst_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub cst_id: i64,
    pub cst_key: Option<String>,
    pub cst_firstname: Option<String>,
    pub cst_lastname: Option<String>,
    pub cst_marital_status: String,
    pub cst_gndr: String,
    pub cst_create_date: Option<NaiveDate>,
}

/// Trim names, standardize codes, drop rows without `cst_id` and keep the
/// most recently created row per customer
pub fn conform_customers(raw: &[CrmCustomerRaw], ctx: &ConformContext) -> Vec<Customer> {
    let conformed: Vec<Customer> = raw
        .iter()
        .filter_map(|r| {
            Some(Customer {
                cst_id: r.cst_id?,
                cst_key: trim_text(r.cst_key.as_deref()),
                cst_firstname: trim_text(r.cst_firstname.as_deref()),
                cst_lastname: trim_text(r.cst_lastname.as_deref()),
                cst_marital_status: MARITAL_STATUS.standardize(r.cst_marital_status.as_deref()),
                cst_gndr: CRM_GENDER.standardize(r.cst_gndr.as_deref()),
                cst_create_date: null_if_future(r.cst_create_date, ctx.as_of),
            })
        })
        .collect();

    let dropped = raw.len() - conformed.len();
    if dropped > 0 {
        tracing::debug!(rows = dropped, "Dropped customers without cst_id");
    }

    // Option orders None first, so the greatest rank is the latest date and
    // rows without a date only win when no dated row exists
    latest_per_key(conformed, |c| Some(c.cst_id), |c| c.cst_create_date)
}

/// One dated version of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub prd_id: Option<i64>,
    /// Category id derived from the compound key, e.g. `CO_RF`
    pub cat_id: Option<String>,
    /// Product number derived from the compound key, e.g. `FR-R92B-58`
    pub prd_key: Option<String>,
    pub prd_nm: Option<String>,
    pub prd_cost: i64,
    pub prd_line: String,
    pub prd_start_dt: Option<NaiveDate>,
    pub prd_end_dt: Option<NaiveDate>,
}

impl Versioned for Product {
    type Key = Option<String>;

    fn version_key(&self) -> Self::Key {
        self.prd_key.clone()
    }

    fn start_date(&self) -> Option<NaiveDate> {
        self.prd_start_dt
    }

    fn tie_break(&self) -> Option<i64> {
        self.prd_id
    }

    fn set_end_date(&mut self, end: Option<NaiveDate>) {
        self.prd_end_dt = end;
    }
}

/// Split the compound key, default the cost and recompute every end date from
/// the next version's start
pub fn conform_products(raw: &[CrmProductRaw], _ctx: &ConformContext) -> Vec<Product> {
    let mut products: Vec<Product> = raw
        .iter()
        .map(|r| {
            let (cat_id, prd_key) = match trim_text(r.prd_key.as_deref()) {
                Some(key) => {
                    let (category, number) = split_product_key(&key);
                    (Some(category), Some(number))
                }
                None => (None, None),
            };
            Product {
                prd_id: r.prd_id,
                cat_id,
                prd_key,
                prd_nm: trim_text(r.prd_nm.as_deref()),
                prd_cost: default_non_negative(r.prd_cost),
                prd_line: PRODUCT_LINE.standardize(r.prd_line.as_deref()),
                prd_start_dt: r.prd_start_dt,
                prd_end_dt: None,
            }
        })
        .collect();

    derive_validity_intervals(&mut products);
    products
}

/// Sales line with calendar dates and a consistent amount and price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesDetail {
    pub sls_ord_num: Option<String>,
    pub sls_prd_key: Option<String>,
    pub sls_cust_id: Option<i64>,
    pub sls_order_dt: Option<NaiveDate>,
    pub sls_ship_dt: Option<NaiveDate>,
    pub sls_due_dt: Option<NaiveDate>,
    pub sls_sales: Option<i64>,
    pub sls_quantity: Option<i64>,
    pub sls_price: Option<i64>,
}

pub fn conform_sales(raw: &[CrmSalesRaw], _ctx: &ConformContext) -> Vec<SalesDetail> {
    raw.iter()
        .map(|r| {
            let measure = reconcile_measure(r.sls_sales, r.sls_quantity, r.sls_price);
            SalesDetail {
                sls_ord_num: trim_text(r.sls_ord_num.as_deref()),
                sls_prd_key: trim_text(r.sls_prd_key.as_deref()),
                sls_cust_id: r.sls_cust_id,
                sls_order_dt: parse_yyyymmdd(r.sls_order_dt),
                sls_ship_dt: parse_yyyymmdd(r.sls_ship_dt),
                sls_due_dt: parse_yyyymmdd(r.sls_due_dt),
                sls_sales: measure.sales,
                sls_quantity: r.sls_quantity.filter(|q| *q > 0),
                sls_price: measure.price,
            }
        })
        .collect()
}
