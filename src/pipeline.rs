//! Batch pipelines: one JSON spec, one full refresh.
//!
//! A [`PipelineSpec`] names the source directory, the output directory and
//! format, and how the quality gate treats violations. [`run_pipeline`] loads
//! every extract, re-derives Silver, computes the Gold views, runs the quality
//! battery and optionally publishes versioned snapshots.
//!
//! # Example
//!
//! ```no_run
//! use medallion::pipeline::{PipelineSpec, run_pipeline};
//!
//! let mut spec = PipelineSpec::new("nightly");
//! spec.sources.dir = "extracts".into();
//! spec.output.dir = "gold".into();
//!
//! let report = run_pipeline(&spec)?;
//! println!("{}", report.summary());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Spec format
//!
//! ```json
//! {
//!   "version": "0.1",
//!   "name": "nightly",
//!   "sources": { "dir": "extracts", "files": { "erp_px_cat_g1v2": "PX_CAT_G1V2.csv" } },
//!   "output": { "dir": "gold", "format": "parquet", "publish": true },
//!   "quality": { "fail_on_violation": true },
//!   "as_of": "2025-01-01"
//! }
//! ```

pub mod executor;
pub mod spec;
pub mod validation;

pub use executor::{LoadFailure, RunReport, StepTiming, run_pipeline, run_pipeline_on};
pub use spec::{OutputConfig, PipelineSpec, QualityConfig, SPEC_VERSION, SourcesConfig};
pub use validation::{ValidationError, validate_pipeline};
