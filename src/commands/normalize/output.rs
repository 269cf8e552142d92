use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::normalizer::FinalDataset;
use crate::util::ensure_parent_directory;

pub(super) fn write_dataset_csv(path: &Path, dataset: &FinalDataset) -> Result<()> {
    ensure_parent_directory(path)?;

    let file = File::create(path)
        .with_context(|| format!("failed to create csv file: {}", path.display()))?;
    write_dataset(file, dataset)
        .with_context(|| format!("failed to write csv file: {}", path.display()))
}

/// Writes one header line then one record per dataset row. Missing values
/// are empty fields.
pub(super) fn write_dataset<W: Write>(writer: W, dataset: &FinalDataset) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in &dataset.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
