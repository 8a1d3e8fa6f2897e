//! # Medallion - Bronze/Silver/Gold conformance warehouse
//!
//! Medallion ingests six CSV extracts from a CRM and an ERP system, conforms
//! them into clean entities and exposes a star schema for sales analysis.
//!
//! ## Quick Start
//!
//! ```no_run
//! use medallion::silver::ConformContext;
//! use medallion::warehouse::Warehouse;
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! let warehouse = Warehouse::new(ConformContext::default())?;
//! for load in warehouse.load_sources(Path::new("extracts"), &BTreeMap::new()) {
//!     println!("{}: {} rows", load.source, load.rows());
//! }
//! warehouse.refresh_silver()?;
//!
//! let views = warehouse.gold_views()?;
//! println!("{} customers, {} sales", views.dim_customers.len(), views.fact_sales.len());
//! println!("{}", warehouse.quality_report()?.format_cli());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`bronze`]: Raw Store, source extracts loaded verbatim
//! - [`silver`]: Conformance Engine, cleansed and deduplicated entities
//! - [`gold`]: surrogate keys and the dimensional views
//! - [`quality`]: quality gate over Silver and Gold
//! - [`warehouse`]: the three layers behind one handle, plus publishing
//! - [`pipeline`]: JSON-described batch runs and their reports
//! - [`lifecycle`]: extent versions, copy-on-write cells, published snapshots
//! - [`integrity`]: content fingerprints and snapshot verification
//! - [`config`], [`logging`], [`error`]: settings, tracing setup, error types
//!
//! ## Key Concepts
//!
//! ### Full refresh
//!
//! Every refresh rebuilds a whole extent and swaps it in atomically. Readers
//! holding a snapshot keep seeing the version they started with.
//!
//! ### Views, not tables
//!
//! Gold views are computed from the current Silver snapshot on access.
//! Publishing materializes them as versioned CSV or Parquet files with a
//! SHA-256 hash recorded next to each file.

#![warn(clippy::all, rust_2018_idioms)]

pub mod bronze;
pub mod config;
pub mod error;
pub mod gold;
pub mod integrity;
pub mod lifecycle;
pub mod logging;
pub mod pipeline;
pub mod quality;
pub mod silver;
pub mod warehouse;
