//! Sales fact.

use super::dimension::{DimCustomer, DimProduct};
use super::keys::{Lookup, SurrogateKey};
use crate::silver::SalesDetail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSales {
    pub order_number: Option<String>,
    /// `None` when the product number has no current product
    pub product_key: Option<SurrogateKey>,
    /// `None` when the customer id has no customer
    pub customer_key: Option<SurrogateKey>,
    pub order_date: Option<NaiveDate>,
    pub shipping_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub sales_amount: Option<i64>,
    pub quantity: Option<i64>,
    pub price: Option<i64>,
}

/// Resolve each sales line's natural keys to surrogate keys.
///
/// Every input line produces one fact row, in input order. Unresolved
/// references keep the row with a `None` key.
pub fn build_fact_sales(
    sales: &[SalesDetail],
    dim_products: &[DimProduct],
    dim_customers: &[DimCustomer],
) -> Vec<FactSales> {
    let products = Lookup::first_match(dim_products, |p| p.product_number.clone());
    let customers = Lookup::first_match(dim_customers, |c| Some(c.customer_id));

    let facts: Vec<FactSales> = sales
        .iter()
        .map(|s| FactSales {
            order_number: s.sls_ord_num.clone(),
            product_key: s
                .sls_prd_key
                .as_deref()
                .and_then(|k| products.get(k))
                .map(|p| p.product_key),
            customer_key: s
                .sls_cust_id
                .and_then(|id| customers.get(&id))
                .map(|c| c.customer_key),
            order_date: s.sls_order_dt,
            shipping_date: s.sls_ship_dt,
            due_date: s.sls_due_dt,
            sales_amount: s.sls_sales,
            quantity: s.sls_quantity,
            price: s.sls_price,
        })
        .collect();

    let unresolved = facts
        .iter()
        .filter(|f| f.product_key.is_none() || f.customer_key.is_none())
        .count();
    if unresolved > 0 {
        tracing::debug!(rows = unresolved, "Fact rows with unresolved references");
    }

    facts
}
