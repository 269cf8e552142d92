use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::inventory;
use crate::commands::normalize::{
    RUN_MANIFEST_PREFIX, count_rows, default_db_path, manifests_dir,
};
use crate::model::{NormalizeRunManifest, WorkbookInventoryManifest};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let inventory_path = inventory::default_manifest_path(&args.data_root);
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.data_root));

    info!(data_root = %args.data_root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: WorkbookInventoryManifest = read_json(&inventory_path)?;
        let unsupported = inventory
            .workbooks
            .iter()
            .filter(|entry| !entry.supported)
            .count();
        let first_year = inventory.workbooks.first().map(|entry| entry.year);
        let last_year = inventory.workbooks.last().map(|entry| entry.year);

        info!(
            generated_at = %inventory.generated_at,
            workbook_count = inventory.workbook_count,
            unsupported,
            first_year = ?first_year,
            last_year = ?last_year,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_run_manifest(&manifests_dir(&args.data_root))? {
        Some(path) => {
            let manifest: NormalizeRunManifest = read_json(&path)?;
            info!(
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                processed_years = manifest.counts.processed_year_count,
                skipped_years = manifest.counts.skipped_year_count,
                rows = manifest.counts.row_count,
                unparsed_age_ranges = manifest.counts.unparsed_age_range_count,
                "loaded latest normalize run manifest"
            );
            for skipped in &manifest.skipped_years {
                warn!(year = skipped.year, reason = %skipped.reason, "year skipped in last run");
            }
        }
        None => warn!("no normalize run manifest found"),
    }

    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let rows = count_rows(&conn, "SELECT COUNT(*) FROM driver_totals").unwrap_or(0);
        let years =
            count_rows(&conn, "SELECT COUNT(DISTINCT year) FROM driver_totals").unwrap_or(0);

        info!(path = %db_path.display(), rows, years, "database status");
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Run manifests carry a compact UTC timestamp, so the last name sorts newest.
fn latest_run_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?
            .path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(RUN_MANIFEST_PREFIX) && name.ends_with(".json"));

        if is_run_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
