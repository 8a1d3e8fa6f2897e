//! Storage backend for published snapshots

use super::layers::Layer;
use super::version::ExtentVersion;
use crate::integrity::{HASH_ALGORITHM, compute_file_hash, fingerprint_rows};
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File format of a published snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Csv,
    Parquet,
}

impl SnapshotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }

    pub fn parse_format(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Location of snapshot data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataLocation {
    CsvFile(PathBuf),
    ParquetFile(PathBuf),
}

impl DataLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::CsvFile(p) | Self::ParquetFile(p) => p,
        }
    }
}

/// Version record written next to every published snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedVersion {
    pub version: ExtentVersion,
    pub location: DataLocation,
    pub format: SnapshotFormat,
    pub column_count: usize,
    pub hash_algorithm: String,
    /// Hash of the data file as written
    pub file_hash: String,
    pub published_at: DateTime<Utc>,
}

impl PublishedVersion {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize published version")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize published version")
    }
}

/// Directory-backed store of published view snapshots.
///
/// Layout: `<base>/<view>/<version_id>.<csv|parquet>` plus
/// `<base>/<view>/<version_id>.meta.json`.
#[derive(Debug)]
pub struct VersionStore {
    base_path: PathBuf,
}

impl VersionStore {
    pub fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path).context("Failed to create version store directory")?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn view_dir(&self, view: &str) -> PathBuf {
        self.base_path.join(view)
    }

    fn version_data_path(&self, view: &str, version_id: &Uuid, format: SnapshotFormat) -> PathBuf {
        self.view_dir(view)
            .join(format!("{version_id}.{}", format.extension()))
    }

    fn version_metadata_path(&self, view: &str, version_id: &Uuid) -> PathBuf {
        self.view_dir(view).join(format!("{version_id}.meta.json"))
    }

    /// Next version number for `view`, continuing from the latest published one
    pub fn next_version(
        &self,
        view: &str,
        row_count: usize,
        fingerprint: String,
        upstream: Vec<Uuid>,
    ) -> Result<ExtentVersion> {
        let previous = match self.latest(view)? {
            Some(published) => published.version,
            None => {
                let empty: Vec<()> = Vec::new();
                ExtentVersion::initial(view, Layer::Gold, fingerprint_rows(&empty)?)
            }
        };
        Ok(previous.successor(row_count, fingerprint, upstream))
    }

    /// Write `df` as the data of `version` and record its metadata
    pub fn publish(
        &self,
        version: ExtentVersion,
        df: &mut DataFrame,
        format: SnapshotFormat,
    ) -> Result<PublishedVersion> {
        let view_dir = self.view_dir(&version.extent);
        fs::create_dir_all(&view_dir).context("Failed to create view directory")?;

        let dest_path = self.version_data_path(&version.extent, &version.id, format);
        let file = fs::File::create(&dest_path)
            .with_context(|| format!("Failed to create {}", dest_path.display()))?;

        let location = match format {
            SnapshotFormat::Csv => {
                CsvWriter::new(file)
                    .include_header(true)
                    .finish(df)
                    .context("Failed to write CSV snapshot")?;
                DataLocation::CsvFile(dest_path)
            }
            SnapshotFormat::Parquet => {
                ParquetWriter::new(file)
                    .finish(df)
                    .context("Failed to write Parquet snapshot")?;
                DataLocation::ParquetFile(dest_path)
            }
        };

        let file_hash = compute_file_hash(location.path())?;
        let published = PublishedVersion {
            version,
            location,
            format,
            column_count: df.width(),
            hash_algorithm: HASH_ALGORITHM.to_owned(),
            file_hash,
            published_at: Utc::now(),
        };
        self.save_version_metadata(&published)?;

        Ok(published)
    }

    /// Save version metadata, returning the path written
    pub fn save_version_metadata(&self, published: &PublishedVersion) -> Result<PathBuf> {
        let view = &published.version.extent;
        fs::create_dir_all(self.view_dir(view)).context("Failed to create view directory")?;

        let meta_path = self.version_metadata_path(view, &published.version.id);
        fs::write(&meta_path, published.to_json()?)
            .context("Failed to write version metadata")?;

        Ok(meta_path)
    }

    pub fn load_version_metadata(&self, view: &str, version_id: &Uuid) -> Result<PublishedVersion> {
        let meta_path = self.version_metadata_path(view, version_id);
        let json = fs::read_to_string(&meta_path).context("Failed to read version metadata")?;
        PublishedVersion::from_json(&json)
    }

    /// All published versions of `view`, oldest first
    pub fn list_versions(&self, view: &str) -> Result<Vec<PublishedVersion>> {
        let view_dir = self.view_dir(view);
        if !view_dir.exists() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&view_dir).context("Failed to read view directory")? {
            let entry = entry?;
            let file_name = entry.file_name();
            if file_name.to_string_lossy().ends_with(".meta.json") {
                let json = fs::read_to_string(entry.path())
                    .context("Failed to read version metadata")?;
                versions.push(PublishedVersion::from_json(&json)?);
            }
        }

        versions.sort_by_key(|p| p.version.sequence);
        Ok(versions)
    }

    pub fn latest(&self, view: &str) -> Result<Option<PublishedVersion>> {
        Ok(self.list_versions(view)?.pop())
    }

    /// Load the data of a published snapshot
    pub fn load_snapshot(&self, location: &DataLocation) -> Result<DataFrame> {
        match location {
            DataLocation::CsvFile(path) => LazyCsvReader::new(path)
                .with_has_header(true)
                .with_try_parse_dates(true)
                .finish()
                .context("Failed to scan CSV snapshot")?
                .collect()
                .context("Failed to read CSV snapshot"),
            DataLocation::ParquetFile(path) => ParquetReader::new(fs::File::open(path)?)
                .finish()
                .context("Failed to read Parquet snapshot"),
        }
    }

    /// Delete published versions of `view` not listed in `keep_versions`
    pub fn cleanup_versions(&self, view: &str, keep_versions: &[Uuid]) -> Result<usize> {
        let view_dir = self.view_dir(view);
        if !view_dir.exists() {
            return Ok(0);
        }

        let mut deleted = 0usize;
        for entry in fs::read_dir(&view_dir).context("Failed to read view directory")? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name_str = file_name.to_string_lossy();

            // {uuid}.meta.json, {uuid}.csv or {uuid}.parquet
            let stem = file_name_str
                .strip_suffix(".meta.json")
                .or_else(|| file_name_str.strip_suffix(".csv"))
                .or_else(|| file_name_str.strip_suffix(".parquet"));

            if let Some(uuid_str) = stem
                && let Ok(version_id) = Uuid::parse_str(uuid_str)
                && !keep_versions.contains(&version_id)
            {
                fs::remove_file(entry.path())?;
                if file_name_str.ends_with(".meta.json") {
                    deleted += 1;
                }
            }
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_frame() -> Result<DataFrame> {
        let keys = Series::new("customer_key".into(), vec![1_u64, 2, 3]);
        let names = Series::new("first_name".into(), vec!["Jon", "Elizabeth", "Lauren"]);
        Ok(DataFrame::new(vec![Column::from(keys), Column::from(names)])?)
    }

    #[test]
    fn test_storage_creation() -> Result<()> {
        let temp = TempDir::new()?;
        let _store = VersionStore::new(temp.path().join("gold"))?;
        assert!(temp.path().join("gold").exists());
        Ok(())
    }

    #[test]
    fn test_publish_writes_data_and_metadata() -> Result<()> {
        let temp = TempDir::new()?;
        let store = VersionStore::new(temp.path().to_path_buf())?;

        let mut df = sample_frame()?;
        let version = store.next_version("dim_customers", df.height(), "fp".to_owned(), Vec::new())?;
        assert_eq!(version.sequence, 1);

        let published = store.publish(version, &mut df, SnapshotFormat::Csv)?;
        assert!(published.location.path().exists());
        assert_eq!(published.column_count, 2);
        assert_eq!(published.file_hash.len(), 64);

        let reloaded = store.load_version_metadata("dim_customers", &published.version.id)?;
        assert_eq!(reloaded.file_hash, published.file_hash);

        let data = store.load_snapshot(&published.location)?;
        assert_eq!(data.height(), 3);

        let next = store.next_version("dim_customers", 3, "fp".to_owned(), Vec::new())?;
        assert_eq!(next.sequence, 2);
        assert_eq!(next.parent_id, Some(published.version.id));
        Ok(())
    }

    #[test]
    fn test_cleanup_keeps_listed_versions() -> Result<()> {
        let temp = TempDir::new()?;
        let store = VersionStore::new(temp.path().to_path_buf())?;

        let mut df = sample_frame()?;
        let first = store.next_version("dim_products", 3, "a".to_owned(), Vec::new())?;
        let first = store.publish(first, &mut df, SnapshotFormat::Parquet)?;
        let second = store.next_version("dim_products", 3, "b".to_owned(), Vec::new())?;
        let second = store.publish(second, &mut df, SnapshotFormat::Parquet)?;

        let deleted = store.cleanup_versions("dim_products", &[second.version.id])?;
        assert_eq!(deleted, 1);
        assert!(!first.location.path().exists());

        let remaining = store.list_versions("dim_products")?;
        assert_eq!(remaining.len(), 1);
        Ok(())
    }
}
