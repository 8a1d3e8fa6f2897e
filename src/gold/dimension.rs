//! Customer and product dimensions.

use super::keys::{Lookup, SurrogateKey, assign_surrogate_keys};
use crate::silver::rules::UNKNOWN;
use crate::silver::{Customer, ErpCustomer, ErpLocation, Product, ProductCategory};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimCustomer {
    pub customer_key: SurrogateKey,
    pub customer_id: i64,
    pub customer_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `None` when the customer has no location record
    pub country: Option<String>,
    pub marital_status: String,
    pub gender: String,
    pub birthdate: Option<NaiveDate>,
    pub create_date: Option<NaiveDate>,
}

/// CRM gender wins; ERP gender fills in where CRM has none
fn resolve_gender(crm: &str, erp: Option<&ErpCustomer>) -> String {
    if crm != UNKNOWN {
        return crm.to_owned();
    }
    erp.map_or_else(|| UNKNOWN.to_owned(), |e| e.gender.clone())
}

/// One row per conformed customer, enriched from the ERP extents and keyed in
/// `customer_id` order
pub fn build_dim_customers(
    customers: &[Customer],
    erp_customers: &[ErpCustomer],
    locations: &[ErpLocation],
) -> Vec<DimCustomer> {
    let demographics = Lookup::first_match(erp_customers, |e| e.cid.clone());
    let countries = Lookup::first_match(locations, |l| l.cid.clone());

    let rows: Vec<&Customer> = customers.iter().collect();
    let keyed = assign_surrogate_keys(rows, |c| c.cst_id);
    keyed
        .into_iter()
        .map(|(customer_key, c)| {
            let erp = c.cst_key.as_deref().and_then(|k| demographics.get(k));
            let location = c.cst_key.as_deref().and_then(|k| countries.get(k));

            DimCustomer {
                customer_key,
                customer_id: c.cst_id,
                customer_number: c.cst_key.clone(),
                first_name: c.cst_firstname.clone(),
                last_name: c.cst_lastname.clone(),
                country: location.map(|l| l.cntry.clone()),
                marital_status: c.cst_marital_status.clone(),
                gender: resolve_gender(&c.cst_gndr, erp),
                birthdate: erp.and_then(|e| e.bdate),
                create_date: c.cst_create_date,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimProduct {
    pub product_key: SurrogateKey,
    pub product_id: Option<i64>,
    pub product_number: Option<String>,
    pub product_name: Option<String>,
    pub category_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub maintenance: Option<String>,
    pub cost: i64,
    pub product_line: String,
    pub start_date: Option<NaiveDate>,
}

/// Current product versions only (open end date), keyed in
/// `(start_date, product_number, product_id)` order
pub fn build_dim_products(products: &[Product], categories: &[ProductCategory]) -> Vec<DimProduct> {
    let categories = Lookup::first_match(categories, |c| c.id.clone());

    let current: Vec<&Product> = products.iter().filter(|p| p.prd_end_dt.is_none()).collect();
    let keyed = assign_surrogate_keys(current, |p| {
        (p.prd_start_dt, p.prd_key.clone(), p.prd_id)
    });

    keyed
        .into_iter()
        .map(|(product_key, p)| {
            let category = p.cat_id.as_deref().and_then(|id| categories.get(id));

            DimProduct {
                product_key,
                product_id: p.prd_id,
                product_number: p.prd_key.clone(),
                product_name: p.prd_nm.clone(),
                category_id: p.cat_id.clone(),
                category: category.and_then(|c| c.cat.clone()),
                subcategory: category.and_then(|c| c.subcat.clone()),
                maintenance: category.and_then(|c| c.maintenance.clone()),
                cost: p.prd_cost,
                product_line: p.prd_line.clone(),
                start_date: p.prd_start_dt,
            }
        })
        .collect()
}
