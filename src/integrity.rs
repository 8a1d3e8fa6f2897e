//! Content fingerprints and published snapshot verification.
//!
//! Two kinds of hash are used by the warehouse:
//!
//! - **Row fingerprints** ([`fingerprint_rows`]) identify the content of an
//!   in-memory extent. Two versions of an extent with equal fingerprints hold
//!   exactly the same rows, which is how repeated refreshes are shown to be
//!   idempotent.
//! - **File hashes** ([`compute_file_hash`]) are recorded in the metadata of
//!   every published Gold snapshot and checked again by [`verify_published`].
//!
//! ```no_run
//! use medallion::integrity;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let meta = Path::new("gold/dim_customers/0b6c...e1.meta.json");
//! let result = integrity::verify_published(meta)?;
//! println!("{}", result.format_cli());
//! # Ok(())
//! # }
//! ```

pub mod hasher;
pub mod verifier;

pub use hasher::{HASH_ALGORITHM, compute_file_hash, fingerprint_rows};
pub use verifier::{VerificationResult, verify_published};
