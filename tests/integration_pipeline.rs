//! Integration tests for full refresh runs
//!
//! These tests run the complete pipeline on the fixture extracts under
//! `testdata/` and check the conformed entities, Gold views, quality report
//! and published snapshots.

use anyhow::Result;
use chrono::NaiveDate;
use medallion::bronze::SourceId;
use medallion::gold::{GoldViews, ViewName};
use medallion::integrity::verify_published;
use medallion::pipeline::{PipelineSpec, run_pipeline, run_pipeline_on};
use medallion::silver::ConformContext;
use medallion::warehouse::Warehouse;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn fixture_spec(output: &Path) -> PipelineSpec {
    let mut spec = PipelineSpec::new("fixtures");
    spec.sources.dir = PathBuf::from("testdata");
    spec.output.dir = output.to_path_buf();
    spec.as_of = Some(as_of());
    spec
}

/// Copy the fixture extracts so a test can break one of them
fn copy_fixtures(dir: &Path) -> Result<()> {
    for source in SourceId::ALL {
        let name = source.default_file_name();
        std::fs::copy(Path::new("testdata").join(&name), dir.join(&name))?;
    }
    Ok(())
}

#[test]
fn test_full_refresh_conforms_fixtures() -> Result<()> {
    let output = TempDir::new()?;
    let warehouse = Warehouse::new(ConformContext::new(as_of()))?;
    let report = run_pipeline_on(&warehouse, &fixture_spec(output.path()))?;

    assert!(report.load_failures.is_empty(), "{}", report.summary());
    assert_eq!(report.sources_loaded(), 6);

    let silver = warehouse.silver_snapshot()?;

    // Two versions of customer 1 collapse to the latest; the row without an id is dropped
    let customers = silver.customers.rows();
    assert_eq!(customers.len(), 3, "One row per cst_id");
    let jon = customers.iter().find(|c| c.cst_id == 1).unwrap();
    assert_eq!(jon.cst_gndr, "Female");
    assert_eq!(jon.cst_create_date, date(2023, 6, 1));
    assert_eq!(jon.cst_firstname.as_deref(), Some("Jon"));
    assert_eq!(jon.cst_lastname.as_deref(), Some("Yang"));

    let ruben = customers.iter().find(|c| c.cst_id == 3).unwrap();
    assert_eq!(ruben.cst_create_date, None, "Future create date is cleared");
    assert_eq!(ruben.cst_marital_status, "Married");

    // Future birth date is cleared, legacy prefix stripped
    let erp = silver.erp_customers.rows();
    assert_eq!(erp[0].cid.as_deref(), Some("AW00000001"));
    assert_eq!(erp[2].bdate, None);

    // Numeric dates: 20231026 parses, 0 becomes null
    let sales = silver.sales.rows();
    assert_eq!(sales[0].sls_order_dt, date(2023, 10, 26));
    assert_eq!(sales[1].sls_order_dt, None);
    assert_eq!(sales[1].sls_sales, Some(3000), "Missing amount is recomputed");
    assert_eq!(sales[2].sls_price, Some(45), "Missing price is back-derived");

    // Product versions get derived end dates
    let products = silver.products.rows();
    let helmet_ends: Vec<Option<NaiveDate>> = products
        .iter()
        .filter(|p| p.prd_key.as_deref() == Some("HL-U509-R"))
        .map(|p| p.prd_end_dt)
        .collect();
    assert_eq!(helmet_ends, vec![date(2012, 6, 30), date(2013, 6, 30), None]);
    Ok(())
}

#[test]
fn test_gold_views_from_fixtures() -> Result<()> {
    let output = TempDir::new()?;
    let warehouse = Warehouse::new(ConformContext::new(as_of()))?;
    run_pipeline_on(&warehouse, &fixture_spec(output.path()))?;
    let views = warehouse.gold_views()?;

    // Dense keys from 1
    let customer_keys: Vec<u64> = views.dim_customers.iter().map(|c| c.customer_key).collect();
    assert_eq!(customer_keys, vec![1, 2, 3]);
    let product_keys: Vec<u64> = views.dim_products.iter().map(|p| p.product_key).collect();
    assert_eq!(product_keys, vec![1, 2, 3], "Only current product versions");

    let eugene = &views.dim_customers[1];
    assert_eq!(eugene.gender, "Male", "Unknown CRM gender falls back to ERP");
    assert_eq!(eugene.country.as_deref(), Some("United States"));
    assert_eq!(eugene.birthdate, date(1976, 5, 10));

    let jon = &views.dim_customers[0];
    assert_eq!(jon.gender, "Female", "CRM gender wins when known");
    assert_eq!(jon.country.as_deref(), Some("Australia"));

    assert_eq!(views.dim_customers[2].country.as_deref(), Some("Germany"));

    let helmet = &views.dim_products[2];
    assert_eq!(helmet.product_id, Some(214));
    assert_eq!(helmet.category.as_deref(), Some("Accessories"));
    assert_eq!(helmet.subcategory.as_deref(), Some("Helmets"));

    // Every sale is kept; the unknown product stays as a null key
    assert_eq!(views.fact_sales.len(), 4);
    assert_eq!(views.fact_sales[0].product_key, Some(3));
    assert_eq!(views.fact_sales[0].customer_key, Some(1));
    assert_eq!(views.fact_sales[3].product_key, None);
    Ok(())
}

#[test]
fn test_quality_gate_reports_referential_gap_once() -> Result<()> {
    let output = TempDir::new()?;
    let report = run_pipeline(&fixture_spec(output.path()))?;

    let failed: Vec<_> = report.quality.violations().collect();
    assert_eq!(failed.len(), 1, "{}", report.quality.format_cli());

    let gap = failed[0];
    assert_eq!(gap.extent, ViewName::FactSales.as_str());
    assert_eq!(gap.name, "referential_integrity");
    assert_eq!(gap.offending_count, 1);
    assert_eq!(gap.offending[0]["order_number"], "SO43700");

    // Violations are reported, not fatal, unless the spec says so
    assert!(report.is_success());
    let mut strict = fixture_spec(output.path());
    strict.quality.fail_on_violation = true;
    assert!(!run_pipeline(&strict)?.is_success());
    Ok(())
}

#[test]
fn test_rerun_is_idempotent() -> Result<()> {
    let output = TempDir::new()?;
    let spec = fixture_spec(output.path());
    let warehouse = Warehouse::new(ConformContext::new(as_of()))?;

    let first = run_pipeline_on(&warehouse, &spec)?;
    let silver_before: Vec<String> = warehouse
        .silver_snapshot()?
        .versions()
        .iter()
        .map(|v| v.fingerprint.clone())
        .collect();
    let views_before = warehouse.gold_views()?;

    let second = run_pipeline_on(&warehouse, &spec)?;
    let silver_after: Vec<String> = warehouse
        .silver_snapshot()?
        .versions()
        .iter()
        .map(|v| v.fingerprint.clone())
        .collect();
    let views_after = warehouse.gold_views()?;

    assert_eq!(silver_before, silver_after, "Same extracts, same Silver content");
    for view in ViewName::ALL {
        assert_eq!(
            views_before.fingerprint(view)?,
            views_after.fingerprint(view)?,
            "{view} is reproduced exactly"
        );
    }
    for (a, b) in first.published.iter().zip(&second.published) {
        assert_eq!(a.version.id, b.version.id, "Unchanged views are not republished");
    }
    Ok(())
}

#[test]
fn test_failed_source_is_isolated() -> Result<()> {
    let sources = TempDir::new()?;
    let output = TempDir::new()?;
    copy_fixtures(sources.path())?;

    let mut spec = fixture_spec(output.path());
    spec.sources.dir = sources.path().to_path_buf();
    spec.output.publish = false;

    let warehouse = Warehouse::new(ConformContext::new(as_of()))?;
    run_pipeline_on(&warehouse, &spec)?;
    let products_before = warehouse.silver_snapshot()?.products.len();

    // Break line 3 of the product extract
    std::fs::write(
        sources.path().join("crm_prd_info.csv"),
        "prd_id,prd_key,prd_nm,prd_cost,prd_line,prd_start_dt,prd_end_dt\n\
         210,CO-RF-FR-R92B-58,HL Road Frame,,R,2003-07-01,\n\
         abc,CO-RF-FR-R92R-58,HL Road Frame,,R,2003-07-01,\n",
    )?;

    let report = run_pipeline_on(&warehouse, &spec)?;
    assert_eq!(report.load_failures.len(), 1);
    let failure = &report.load_failures[0];
    assert_eq!(failure.source, SourceId::CrmPrdInfo);
    assert!(
        failure.message.contains("line 3") && failure.message.contains("prd_id"),
        "Error names line and column: {}",
        failure.message
    );
    assert!(!report.is_success());

    let silver = warehouse.silver_snapshot()?;
    assert_eq!(
        silver.products.len(),
        products_before,
        "Rejected extract leaves the previous Raw version in place"
    );
    assert_eq!(silver.customers.len(), 3, "Other sources still refresh");
    Ok(())
}

#[test]
fn test_published_snapshots_verify() -> Result<()> {
    let output = TempDir::new()?;
    let report = run_pipeline(&fixture_spec(output.path()))?;
    assert_eq!(report.published.len(), 3);

    for published in &report.published {
        let meta = published
            .location
            .path()
            .with_file_name(format!("{}.meta.json", published.version.id));
        let result = verify_published(&meta)?;
        assert!(result.passed, "{}", result.format_cli());
    }

    // Tampering is detected
    let dim_customers = &report.published[0];
    std::fs::write(dim_customers.location.path(), "customer_key\n999\n")?;
    let meta = dim_customers
        .location
        .path()
        .with_file_name(format!("{}.meta.json", dim_customers.version.id));
    assert!(!verify_published(&meta)?.passed);
    Ok(())
}

#[test]
fn test_views_match_direct_build() -> Result<()> {
    let output = TempDir::new()?;
    let warehouse = Warehouse::new(ConformContext::new(as_of()))?;
    run_pipeline_on(&warehouse, &fixture_spec(output.path()))?;

    let rebuilt = GoldViews::build(&warehouse.silver_snapshot()?);
    assert_eq!(rebuilt.dim_customers, warehouse.gold_views()?.dim_customers);
    assert_eq!(rebuilt.row_count(ViewName::FactSales), 4);
    Ok(())
}
