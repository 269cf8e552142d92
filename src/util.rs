use std::fs::{self, File};
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Timestamp safe for file names, e.g. `20240102T030405Z`.
pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Creates the directory holding `path`, if it has one.
pub fn ensure_parent_directory(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display())),
        _ => Ok(()),
    }
}

/// Hex SHA-256 of a workbook, recorded in the inventory to detect changed sources.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open workbook for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("failed to hash workbook: {}", path.display()))?;

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Pretty JSON with a trailing newline; parent directories are created.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_directory(path)?;

    let mut data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize manifest: {}", path.display()))?;
    data.push(b'\n');

    fs::write(path, data).with_context(|| format!("failed to write manifest: {}", path.display()))
}
