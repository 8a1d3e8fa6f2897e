//! Verification of published Gold snapshots against their recorded hash.

use crate::error::{Result, ResultExt as _, WarehouseError};
use crate::integrity::hasher::compute_file_hash;
use crate::lifecycle::storage::PublishedVersion;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Outcome of checking one published snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub passed: bool,

    /// Human-readable message describing the result
    pub message: String,

    /// Path to the data file that was verified
    pub file_path: String,

    /// Hash recorded when the snapshot was published
    pub expected_hash: String,

    /// Hash computed from the file now (if it could be read)
    pub actual_hash: Option<String>,

    pub published: PublishedVersion,
}

impl VerificationResult {
    fn pass(file_path: String, hash: String, published: PublishedVersion) -> Self {
        Self {
            passed: true,
            message: "Snapshot integrity verified successfully".to_owned(),
            file_path,
            expected_hash: hash.clone(),
            actual_hash: Some(hash),
            published,
        }
    }

    fn fail(
        file_path: String,
        actual: Option<String>,
        reason: String,
        published: PublishedVersion,
    ) -> Self {
        Self {
            passed: false,
            message: reason,
            file_path,
            expected_hash: published.file_hash.clone(),
            actual_hash: actual,
            published,
        }
    }

    /// Format for terminal display.
    pub fn format_cli(&self) -> String {
        if self.passed {
            let short_hash = self.expected_hash.get(..16).unwrap_or(&self.expected_hash);
            format!(
                "✓ PASS: Snapshot integrity verified\n  \
                View: {} (version {})\n  \
                File: {}\n  \
                Hash: {} ({})\n  \
                Rows: {}, Columns: {}\n  \
                Published: {}",
                self.published.version.extent,
                self.published.version.sequence,
                self.file_path,
                short_hash,
                self.published.hash_algorithm,
                self.published.version.row_count,
                self.published.column_count,
                self.published.published_at.format("%Y-%m-%d %H:%M:%S UTC")
            )
        } else {
            let mut output = format!(
                "✗ FAIL: {}\n  \
                File: {}\n  \
                Expected: {}\n  ",
                self.message, self.file_path, self.expected_hash
            );

            if let Some(actual) = &self.actual_hash {
                output.push_str(&format!("Actual:   {actual}\n  "));
            }

            output.push_str("Snapshot may have been modified or corrupted");
            output
        }
    }
}

/// Verify a published snapshot using its `.meta.json` file.
///
/// The data file is looked up next to the metadata file, so a copied or moved
/// version directory still verifies.
///
/// # Errors
///
/// Returns an error if the metadata can't be read or parsed. A missing or
/// modified data file is reported as a failed [`VerificationResult`].
pub fn verify_published(meta_path: &Path) -> Result<VerificationResult> {
    let meta_json = fs::read_to_string(meta_path)
        .with_context(|| format!("Failed to read snapshot metadata: {}", meta_path.display()))?;

    let published = PublishedVersion::from_json(&meta_json)
        .context("Failed to parse snapshot metadata (file may be corrupted)")?;

    let meta_dir = meta_path.parent().ok_or_else(|| {
        WarehouseError::InvalidPath("Snapshot metadata has no parent directory".to_owned())
    })?;
    let file_name = published.location.path().file_name().ok_or_else(|| {
        WarehouseError::InvalidPath("Snapshot metadata has no data file name".to_owned())
    })?;
    let data_file_path = meta_dir.join(file_name);
    let display_path = data_file_path.display().to_string();

    if !data_file_path.exists() {
        let reason = format!(
            "Data file not found: {}. Snapshot may have been moved or deleted.",
            file_name.to_string_lossy()
        );
        return Ok(VerificationResult::fail(display_path, None, reason, published));
    }

    let actual_hash = match compute_file_hash(&data_file_path) {
        Ok(hash) => hash,
        Err(e) => {
            let reason = format!("Failed to compute hash: {e}");
            return Ok(VerificationResult::fail(display_path, None, reason, published));
        }
    };

    if actual_hash == published.file_hash {
        Ok(VerificationResult::pass(display_path, actual_hash, published))
    } else {
        Ok(VerificationResult::fail(
            display_path,
            Some(actual_hash),
            "Hash mismatch detected".to_owned(),
            published,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::storage::{SnapshotFormat, VersionStore};
    use polars::prelude::*;
    use tempfile::TempDir;

    fn publish_sample(store: &VersionStore) -> (PublishedVersion, std::path::PathBuf) {
        let keys = Series::new("product_key".into(), vec![1_u64, 2]);
        let numbers = Series::new("product_number".into(), vec!["FR-R92B-58", "HL-U509-R"]);
        let mut df = DataFrame::new(vec![Column::from(keys), Column::from(numbers)]).unwrap();

        let version = store
            .next_version("dim_products", 2, "fp".to_owned(), Vec::new())
            .unwrap();
        let published = store.publish(version, &mut df, SnapshotFormat::Csv).unwrap();
        let meta_path = store
            .base_path()
            .join("dim_products")
            .join(format!("{}.meta.json", published.version.id));
        (published, meta_path)
    }

    #[test]
    fn test_verify_published_pass() {
        let temp_dir = TempDir::new().unwrap();
        let store = VersionStore::new(temp_dir.path().to_path_buf()).unwrap();
        let (_, meta_path) = publish_sample(&store);

        let result = verify_published(&meta_path).unwrap();
        assert!(result.passed);
        assert_eq!(result.expected_hash, result.actual_hash.clone().unwrap());

        let output = result.format_cli();
        assert!(output.contains("✓ PASS"));
        assert!(output.contains("dim_products"));
    }

    #[test]
    fn test_verify_published_detects_modification() {
        let temp_dir = TempDir::new().unwrap();
        let store = VersionStore::new(temp_dir.path().to_path_buf()).unwrap();
        let (published, meta_path) = publish_sample(&store);

        fs::write(published.location.path(), b"product_key,product_number\n9,XX\n").unwrap();

        let result = verify_published(&meta_path).unwrap();
        assert!(!result.passed);
        assert!(result.message.contains("Hash mismatch"));
        assert!(result.format_cli().contains("Actual:"));
    }

    #[test]
    fn test_verify_published_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = VersionStore::new(temp_dir.path().to_path_buf()).unwrap();
        let (published, meta_path) = publish_sample(&store);

        fs::remove_file(published.location.path()).unwrap();

        let result = verify_published(&meta_path).unwrap();
        assert!(!result.passed);
        assert!(result.message.contains("not found"));
        assert!(result.actual_hash.is_none());
    }

    #[test]
    fn test_verify_published_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let meta_path = temp_dir.path().join("bad.meta.json");
        fs::write(&meta_path, b"{ invalid json }").unwrap();

        assert!(verify_published(&meta_path).is_err());
    }
}
