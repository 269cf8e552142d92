use std::path::{Path, PathBuf};

mod output;
mod run;
mod store;
#[cfg(test)]
mod tests;
mod workbook;

pub use run::run;
pub(crate) use store::count_rows;

use output::*;
use store::*;
use workbook::*;

pub fn default_csv_path(data_root: &Path) -> PathBuf {
    data_root.join("output").join("drivers_by_age_sex.csv")
}

pub fn default_db_path(data_root: &Path) -> PathBuf {
    data_root.join("driver_stats.sqlite")
}

pub fn manifests_dir(data_root: &Path) -> PathBuf {
    data_root.join("manifests")
}

/// File name prefix of normalize run manifests inside the manifests dir.
pub const RUN_MANIFEST_PREFIX: &str = "normalize_run_";
