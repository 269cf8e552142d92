use std::path::Path;

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{debug, info, warn};

use super::*;
use crate::cli::NormalizeArgs;
use crate::commands::inventory;
use crate::model::{
    NormalizeCounts, NormalizePaths, NormalizeRunManifest, SkippedYear, WorkbookEntry,
    WorkbookInventoryManifest,
};
use crate::normalizer::{
    CombinedYearTable, NormalizeError, RoadType, concat_years, normalize_year,
    resolve_sheet_name,
};
use crate::util::{now_utc_string, read_json, utc_compact_string, write_json_pretty};

pub fn run(args: NormalizeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let data_root = args.data_root.clone();
    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&data_root));
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        manifests_dir(&data_root).join(format!(
            "{RUN_MANIFEST_PREFIX}{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let csv_path = args
        .csv_path
        .clone()
        .unwrap_or_else(|| default_csv_path(&data_root));
    let db_path = (!args.skip_db).then(|| {
        args.db_path
            .clone()
            .unwrap_or_else(|| default_db_path(&data_root))
    });

    info!(data_root = %data_root.display(), run_id = %run_id, "starting normalize");

    let inventory = load_or_refresh_inventory(
        &data_root,
        &inventory_manifest_path,
        args.refresh_inventory,
    )?;

    let selected = select_workbooks(&inventory.workbooks, &args.years);
    if selected.is_empty() {
        bail!(
            "no workbooks selected from {} (requested years: {:?})",
            inventory_manifest_path.display(),
            args.years
        );
    }

    let source_dir = inventory::workbooks_dir(&data_root);
    let mut tables = Vec::<CombinedYearTable>::with_capacity(selected.len());
    let mut skipped_years = Vec::<SkippedYear>::new();

    for entry in &selected {
        let path = source_dir.join(&entry.filename);
        match normalize_workbook(&path, entry.year) {
            Ok(table) => {
                info!(year = entry.year, rows = table.rows.len(), "normalized year");
                tables.push(table);
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(
                    year = entry.year,
                    filename = %entry.filename,
                    reason = %reason,
                    "skipping year"
                );
                skipped_years.push(SkippedYear {
                    year: entry.year,
                    filename: entry.filename.clone(),
                    reason,
                });
            }
        }
    }

    if tables.is_empty() {
        bail!(
            "no year could be normalized ({} skipped)",
            skipped_years.len()
        );
    }

    let processed_years = tables.iter().map(|table| table.year).collect::<Vec<_>>();
    let dataset = concat_years(tables);
    let unparsed_age_range_count = dataset
        .rows
        .iter()
        .filter(|row| row.age_range.is_none())
        .count();
    if dataset.is_empty() {
        warn!("normalized years produced no driver rows");
    }

    write_dataset_csv(&csv_path, &dataset)?;
    info!(path = %csv_path.display(), rows = dataset.len(), "wrote dataset csv");

    let db_rows_written = match &db_path {
        Some(path) => {
            let mut connection = open_store(path)?;
            let written = replace_years(&mut connection, &dataset)?;
            let stored = count_rows(&connection, "SELECT COUNT(*) FROM driver_totals")?;
            info!(path = %path.display(), written, stored, "updated driver store");
            written
        }
        None => 0,
    };

    let manifest = NormalizeRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        paths: NormalizePaths {
            data_root: data_root.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            csv_path: csv_path.display().to_string(),
            db_path: db_path.as_ref().map(|path| path.display().to_string()),
        },
        counts: NormalizeCounts {
            workbook_count: inventory.workbook_count,
            selected_year_count: selected.len(),
            processed_year_count: processed_years.len(),
            skipped_year_count: skipped_years.len(),
            row_count: dataset.len(),
            unparsed_age_range_count,
            db_rows_written,
        },
        processed_years,
        skipped_years,
        source_hashes: selected.into_iter().cloned().collect(),
    };

    write_json_pretty(&run_manifest_path, &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote normalize run manifest");
    info!(
        years = manifest.counts.processed_year_count,
        skipped = manifest.counts.skipped_year_count,
        rows = manifest.counts.row_count,
        "normalize completed"
    );

    Ok(())
}

fn load_or_refresh_inventory(
    data_root: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<WorkbookInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(&inventory::workbooks_dir(data_root))?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            workbook_count = manifest.workbook_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let manifest: WorkbookInventoryManifest = read_json(inventory_manifest_path)?;
    info!(
        path = %inventory_manifest_path.display(),
        workbook_count = manifest.workbook_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

/// Inventory entries to process, in inventory (year) order. An empty
/// `years` filter selects everything.
pub(super) fn select_workbooks<'a>(
    workbooks: &'a [WorkbookEntry],
    years: &[u32],
) -> Vec<&'a WorkbookEntry> {
    for year in years {
        if !workbooks.iter().any(|entry| entry.year == *year) {
            warn!(year, "requested year has no workbook in the inventory");
        }
    }

    workbooks
        .iter()
        .filter(|entry| years.is_empty() || years.contains(&entry.year))
        .collect()
}

fn normalize_workbook(path: &Path, year: u32) -> Result<CombinedYearTable> {
    let interurban_sheet = sheet_for(year, RoadType::Interurban)?;
    let urban_sheet = sheet_for(year, RoadType::Urban)?;

    let mut workbook = Workbook::open(path)?;
    let interurban = workbook.raw_table(interurban_sheet)?;
    let urban = workbook.raw_table(urban_sheet)?;
    debug!(
        year,
        interurban_rows = interurban.height(),
        urban_rows = urban.height(),
        "loaded road-type sheets"
    );

    Ok(normalize_year(year, &interurban, &urban)?)
}

fn sheet_for(year: u32, road: RoadType) -> Result<&'static str, NormalizeError> {
    let sheet = resolve_sheet_name(year, road.is_interurban())
        .ok_or(NormalizeError::UnsupportedYear { year })?;
    debug!(year, road = road.as_str(), sheet, "resolved sheet name");
    Ok(sheet)
}
