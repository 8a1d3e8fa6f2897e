//! The fixed battery of checks run after every refresh.

use super::checks::{
    accuracy, completeness, date_order, date_range, formatting, non_negative,
    referential_integrity, standardization, uniqueness,
};
use super::{CheckResult, QualityReport};
use crate::error::Result;
use crate::gold::{GoldViews, SurrogateKey, ViewName};
use crate::lifecycle::Layer;
use crate::silver::SilverSnapshot;
use crate::silver::rules::{COUNTRY, CRM_GENDER, ERP_GENDER, MARITAL_STATUS, PRODUCT_LINE};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Birth dates before this are implausible
pub fn earliest_birthdate() -> NaiveDate {
    NaiveDate::from_ymd_opt(1924, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Collects checks of one layer and extent into a report
struct Battery<'r> {
    report: &'r mut QualityReport,
    layer: Layer,
    extent: &'static str,
}

impl<'r> Battery<'r> {
    fn new(report: &'r mut QualityReport, layer: Layer) -> Self {
        Self {
            report,
            layer,
            extent: "",
        }
    }

    fn extent(&mut self, extent: &'static str) {
        self.extent = extent;
    }

    fn check<T: Serialize>(&mut self, name: &str, description: &str, rows: &[&T]) -> Result<()> {
        let result = CheckResult::from_rows(name, self.extent, self.layer, description, rows)?;
        self.report.push(result);
        Ok(())
    }
}

/// Checks over the conformed extents.
///
/// `as_of` bounds the plausible birth and creation dates.
pub fn silver_battery(snapshot: &SilverSnapshot, as_of: NaiveDate) -> Result<QualityReport> {
    let mut report = QualityReport::new();
    let mut b = Battery::new(&mut report, Layer::Silver);

    let customers = snapshot.customers.rows();
    b.extent("crm_cust_info");
    b.check(
        "uniqueness",
        "cst_id is unique and not null",
        &uniqueness(customers, |c| Some(c.cst_id)),
    )?;
    b.check(
        "completeness",
        "cst_key is present",
        &completeness(customers, |c| c.cst_key.as_deref()),
    )?;
    b.check(
        "formatting",
        "cst_key has no surrounding spaces",
        &formatting(customers, |c| c.cst_key.as_deref()),
    )?;
    b.check(
        "formatting",
        "cst_firstname has no surrounding spaces",
        &formatting(customers, |c| c.cst_firstname.as_deref()),
    )?;
    b.check(
        "formatting",
        "cst_lastname has no surrounding spaces",
        &formatting(customers, |c| c.cst_lastname.as_deref()),
    )?;
    b.check(
        "standardization",
        "cst_marital_status is a marital status label",
        &standardization(customers, |c| c.cst_marital_status.as_str(), &MARITAL_STATUS),
    )?;
    b.check(
        "standardization",
        "cst_gndr is a gender label",
        &standardization(customers, |c| c.cst_gndr.as_str(), &CRM_GENDER),
    )?;
    b.check(
        "date_range",
        "cst_create_date is not after the processing date",
        &date_range(customers, |c| c.cst_create_date, NaiveDate::MIN, as_of),
    )?;

    let products = snapshot.products.rows();
    b.extent("crm_prd_info");
    b.check(
        "uniqueness",
        "prd_id is unique and not null",
        &uniqueness(products, |p| p.prd_id),
    )?;
    b.check(
        "formatting",
        "prd_nm has no surrounding spaces",
        &formatting(products, |p| p.prd_nm.as_deref()),
    )?;
    b.check(
        "non_negative",
        "prd_cost is present and not negative",
        &non_negative(products, |p| Some(p.prd_cost)),
    )?;
    b.check(
        "standardization",
        "prd_line is a product line label",
        &standardization(products, |p| p.prd_line.as_str(), &PRODUCT_LINE),
    )?;
    b.check(
        "date_order",
        "prd_start_dt is not after prd_end_dt",
        &date_order(products, |p| p.prd_start_dt, |p| p.prd_end_dt),
    )?;

    let sales = snapshot.sales.rows();
    b.extent("crm_sales_details");
    b.check(
        "completeness",
        "sls_ord_num is present",
        &completeness(sales, |s| s.sls_ord_num.as_deref()),
    )?;
    b.check(
        "date_order",
        "sls_order_dt is not after sls_ship_dt",
        &date_order(sales, |s| s.sls_order_dt, |s| s.sls_ship_dt),
    )?;
    b.check(
        "date_order",
        "sls_order_dt is not after sls_due_dt",
        &date_order(sales, |s| s.sls_order_dt, |s| s.sls_due_dt),
    )?;
    b.check(
        "accuracy",
        "sls_sales = sls_quantity * sls_price, all positive",
        &accuracy(sales, |s| (s.sls_sales, s.sls_quantity, s.sls_price)),
    )?;

    let erp_customers = snapshot.erp_customers.rows();
    b.extent("erp_cust_az12");
    b.check(
        "date_range",
        "bdate is between 1924-01-01 and the processing date",
        &date_range(erp_customers, |e| e.bdate, earliest_birthdate(), as_of),
    )?;
    b.check(
        "standardization",
        "gen is a gender label",
        &standardization(erp_customers, |e| e.gender.as_str(), &ERP_GENDER),
    )?;

    let locations = snapshot.locations.rows();
    b.extent("erp_loc_a101");
    b.check(
        "formatting",
        "cid has no surrounding spaces",
        &formatting(locations, |l| l.cid.as_deref()),
    )?;
    b.check(
        "standardization",
        "cntry is a trimmed country name, not a code",
        &standardization(locations, |l| l.cntry.as_str(), &COUNTRY),
    )?;

    let categories = snapshot.categories.rows();
    b.extent("erp_px_cat_g1v2");
    b.check(
        "formatting",
        "cat has no surrounding spaces",
        &formatting(categories, |c| c.cat.as_deref()),
    )?;
    b.check(
        "formatting",
        "subcat has no surrounding spaces",
        &formatting(categories, |c| c.subcat.as_deref()),
    )?;
    b.check(
        "formatting",
        "maintenance has no surrounding spaces",
        &formatting(categories, |c| c.maintenance.as_deref()),
    )?;

    tracing::info!(
        checks = report.checks.len(),
        failed = report.violations().count(),
        "Silver quality battery finished"
    );
    Ok(report)
}

/// Checks over the Gold views: key uniqueness, natural keys, fact references
/// and measures.
///
/// A null fact reference is an unresolved natural key and is reported as a
/// referential gap.
pub fn gold_battery(views: &GoldViews) -> Result<QualityReport> {
    let mut report = QualityReport::new();
    let mut b = Battery::new(&mut report, Layer::Gold);

    b.extent(ViewName::DimCustomers.as_str());
    b.check(
        "uniqueness",
        "customer_key is unique",
        &uniqueness(&views.dim_customers, |c| Some(c.customer_key)),
    )?;
    b.check(
        "completeness",
        "customer_number is present",
        &completeness(&views.dim_customers, |c| c.customer_number.as_deref()),
    )?;
    b.check(
        "standardization",
        "gender is a gender label",
        &standardization(&views.dim_customers, |c| c.gender.as_str(), &ERP_GENDER),
    )?;

    b.extent(ViewName::DimProducts.as_str());
    b.check(
        "uniqueness",
        "product_key is unique",
        &uniqueness(&views.dim_products, |p| Some(p.product_key)),
    )?;
    b.check(
        "completeness",
        "product_number is present",
        &completeness(&views.dim_products, |p| p.product_number.as_deref()),
    )?;

    let customer_keys: BTreeSet<SurrogateKey> =
        views.dim_customers.iter().map(|c| c.customer_key).collect();
    let product_keys: BTreeSet<SurrogateKey> =
        views.dim_products.iter().map(|p| p.product_key).collect();

    b.extent(ViewName::FactSales.as_str());
    b.check(
        "referential_integrity",
        "product_key resolves to dim_products",
        &referential_integrity(&views.fact_sales, |f| f.product_key, &product_keys, false),
    )?;
    b.check(
        "referential_integrity",
        "customer_key resolves to dim_customers",
        &referential_integrity(&views.fact_sales, |f| f.customer_key, &customer_keys, false),
    )?;
    b.check(
        "accuracy",
        "sales_amount = quantity * price, all positive",
        &accuracy(&views.fact_sales, |f| (f.sales_amount, f.quantity, f.price)),
    )?;

    tracing::info!(
        checks = report.checks.len(),
        failed = report.violations().count(),
        "Gold quality battery finished"
    );
    Ok(report)
}
