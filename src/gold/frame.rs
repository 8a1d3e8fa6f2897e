//! Columnar projections of the Gold views for publishing.

use super::dimension::{DimCustomer, DimProduct};
use super::fact::FactSales;
use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::*;

fn text(name: &str, values: Vec<Option<String>>) -> Column {
    Column::from(Series::new(name.into(), values))
}

fn label(name: &str, values: Vec<String>) -> Column {
    Column::from(Series::new(name.into(), values))
}

fn key(name: &str, values: Vec<Option<u64>>) -> Column {
    Column::from(Series::new(name.into(), values))
}

fn int(name: &str, values: Vec<Option<i64>>) -> Column {
    Column::from(Series::new(name.into(), values))
}

fn days_since_epoch(date: NaiveDate) -> Option<i32> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    i32::try_from(date.signed_duration_since(epoch).num_days()).ok()
}

fn date(name: &str, values: Vec<Option<NaiveDate>>) -> Result<Column> {
    let days: Vec<Option<i32>> = values
        .into_iter()
        .map(|d| d.and_then(days_since_epoch))
        .collect();
    let series = Series::new(name.into(), days).cast(&DataType::Date)?;
    Ok(Column::from(series))
}

pub fn dim_customers_frame(rows: &[DimCustomer]) -> Result<DataFrame> {
    let columns = vec![
        key("customer_key", rows.iter().map(|r| Some(r.customer_key)).collect()),
        int("customer_id", rows.iter().map(|r| Some(r.customer_id)).collect()),
        text("customer_number", rows.iter().map(|r| r.customer_number.clone()).collect()),
        text("first_name", rows.iter().map(|r| r.first_name.clone()).collect()),
        text("last_name", rows.iter().map(|r| r.last_name.clone()).collect()),
        text("country", rows.iter().map(|r| r.country.clone()).collect()),
        label("marital_status", rows.iter().map(|r| r.marital_status.clone()).collect()),
        label("gender", rows.iter().map(|r| r.gender.clone()).collect()),
        date("birthdate", rows.iter().map(|r| r.birthdate).collect())?,
        date("create_date", rows.iter().map(|r| r.create_date).collect())?,
    ];
    Ok(DataFrame::new(columns)?)
}

pub fn dim_products_frame(rows: &[DimProduct]) -> Result<DataFrame> {
    let columns = vec![
        key("product_key", rows.iter().map(|r| Some(r.product_key)).collect()),
        int("product_id", rows.iter().map(|r| r.product_id).collect()),
        text("product_number", rows.iter().map(|r| r.product_number.clone()).collect()),
        text("product_name", rows.iter().map(|r| r.product_name.clone()).collect()),
        text("category_id", rows.iter().map(|r| r.category_id.clone()).collect()),
        text("category", rows.iter().map(|r| r.category.clone()).collect()),
        text("subcategory", rows.iter().map(|r| r.subcategory.clone()).collect()),
        text("maintenance", rows.iter().map(|r| r.maintenance.clone()).collect()),
        int("cost", rows.iter().map(|r| Some(r.cost)).collect()),
        label("product_line", rows.iter().map(|r| r.product_line.clone()).collect()),
        date("start_date", rows.iter().map(|r| r.start_date).collect())?,
    ];
    Ok(DataFrame::new(columns)?)
}

pub fn fact_sales_frame(rows: &[FactSales]) -> Result<DataFrame> {
    let columns = vec![
        text("order_number", rows.iter().map(|r| r.order_number.clone()).collect()),
        key("product_key", rows.iter().map(|r| r.product_key).collect()),
        key("customer_key", rows.iter().map(|r| r.customer_key).collect()),
        date("order_date", rows.iter().map(|r| r.order_date).collect())?,
        date("shipping_date", rows.iter().map(|r| r.shipping_date).collect())?,
        date("due_date", rows.iter().map(|r| r.due_date).collect())?,
        int("sales_amount", rows.iter().map(|r| r.sales_amount).collect()),
        int("quantity", rows.iter().map(|r| r.quantity).collect()),
        int("price", rows.iter().map(|r| r.price).collect()),
    ];
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_frame_keeps_null_keys() {
        let rows = vec![FactSales {
            order_number: Some("SO43697".to_owned()),
            product_key: None,
            customer_key: Some(4),
            order_date: NaiveDate::from_ymd_opt(2023, 10, 26),
            shipping_date: None,
            due_date: None,
            sales_amount: Some(3578),
            quantity: Some(1),
            price: Some(3578),
        }];
        let df = fact_sales_frame(&rows).unwrap();

        assert_eq!(df.shape(), (1, 9));
        assert_eq!(df.column("product_key").unwrap().null_count(), 1);
        assert_eq!(df.column("order_date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_days_since_epoch() {
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), Some(1));
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), Some(-1));
    }
}
