use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookEntry {
    pub filename: String,
    pub year: u32,
    pub sha256: String,
    /// Whether the year maps to a known sheet layout.
    pub supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub workbook_count: usize,
    pub workbooks: Vec<WorkbookEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizePaths {
    pub data_root: String,
    pub inventory_manifest_path: String,
    pub csv_path: String,
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeCounts {
    pub workbook_count: usize,
    pub selected_year_count: usize,
    pub processed_year_count: usize,
    pub skipped_year_count: usize,
    pub row_count: usize,
    pub unparsed_age_range_count: usize,
    pub db_rows_written: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedYear {
    pub year: u32,
    pub filename: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub paths: NormalizePaths,
    pub counts: NormalizeCounts,
    pub processed_years: Vec<u32>,
    pub skipped_years: Vec<SkippedYear>,
    pub source_hashes: Vec<WorkbookEntry>,
}
