//! Streaming SHA-256 hashing of files and row sets.

use crate::error::{Result, ResultExt as _};
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{BufReader, Read as _};
use std::path::Path;

/// Buffer size for streaming file reads (8 KB).
const BUFFER_SIZE: usize = 8192;

/// Hash algorithm identifier stored in snapshot metadata.
pub const HASH_ALGORITHM: &str = "SHA-256";

/// Compute the SHA-256 hash of a file using streaming I/O.
///
/// Returns the hash as a lowercase hexadecimal string (64 characters).
///
/// # Errors
///
/// Returns an error if the file can't be opened or read.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    let hash = hasher.finalize();
    Ok(format!("{hash:x}"))
}

/// Fingerprint an ordered set of rows.
///
/// Each row is serialized to JSON and fed to the hasher followed by a newline,
/// so the fingerprint depends on row content and row order only. An empty set
/// hashes to the SHA-256 of the empty string.
pub fn fingerprint_rows<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut hasher = Sha256::new();
    for row in rows {
        let bytes = serde_json::to_vec(row).context("Failed to serialize row for fingerprint")?;
        hasher.update(&bytes);
        hasher.update(b"\n");
    }

    let hash = hasher.finalize();
    Ok(format!("{hash:x}"))
}
