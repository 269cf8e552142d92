use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::model::{WorkbookEntry, WorkbookInventoryManifest};
use crate::normalizer::resolve_sheet_name;
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

const WORKBOOK_EXTENSIONS: [&str; 4] = ["xls", "xlsx", "xlsm", "ods"];

pub fn workbooks_dir(data_root: &Path) -> PathBuf {
    data_root.join("workbooks")
}

pub fn default_manifest_path(data_root: &Path) -> PathBuf {
    data_root.join("manifests").join("workbook_inventory.json")
}

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&workbooks_dir(&args.data_root))?;

    if args.dry_run {
        info!(
            workbook_count = manifest.workbook_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.data_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(workbook_count = manifest.workbook_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(source_dir: &Path) -> Result<WorkbookInventoryManifest> {
    let pattern = year_pattern()?;

    let mut paths = discover_workbooks(source_dir)?;
    paths.sort();

    if paths.is_empty() {
        bail!("no workbooks found in {}", source_dir.display());
    }

    let mut seen = BTreeMap::<u32, String>::new();
    let mut workbooks = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let year = parse_year(&filename, &pattern)?;
        if let Some(previous) = seen.insert(year, filename.clone()) {
            bail!("year {year} supplied twice: {previous} and {filename}");
        }

        let supported = resolve_sheet_name(year, true).is_some();
        if !supported {
            warn!(filename = %filename, year, "workbook year has no known sheet layout");
        }

        let sha256 = sha256_file(&path)?;
        workbooks.push(WorkbookEntry {
            filename,
            year,
            sha256,
            supported,
        });
    }

    workbooks.sort_by(|a, b| a.year.cmp(&b.year).then(a.filename.cmp(&b.filename)));

    Ok(WorkbookInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        workbook_count: workbooks.len(),
        workbooks,
    })
}

fn year_pattern() -> Result<Regex> {
    Regex::new(r"(\d{4})\.[A-Za-z]+$").context("failed to compile workbook filename regex")
}

fn discover_workbooks(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut workbooks = Vec::new();

    let entries = fs::read_dir(source_dir)
        .with_context(|| format!("failed to read {}", source_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", source_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        if is_workbook(&path) {
            workbooks.push(path);
        }
    }

    Ok(workbooks)
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Publication year: the four digits right before the file extension.
fn parse_year(filename: &str, pattern: &Regex) -> Result<u32> {
    let captures = pattern
        .captures(filename)
        .with_context(|| format!("filename does not end with a four-digit year: {filename}"))?;

    captures
        .get(1)
        .map(|m| m.as_str())
        .context("missing year capture")?
        .parse::<u32>()
        .with_context(|| format!("invalid year in filename: {filename}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_year_reads_digits_before_extension() {
        let pattern = year_pattern().unwrap();

        assert_eq!(
            parse_year("Anuario_conductores_2017.xlsx", &pattern).unwrap(),
            2017
        );
        assert_eq!(parse_year("tablas-1998.XLS", &pattern).unwrap(), 1998);
        assert_eq!(parse_year("2003 resumen 2004.xls", &pattern).unwrap(), 2004);
    }

    #[test]
    fn parse_year_rejects_names_without_trailing_year() {
        let pattern = year_pattern().unwrap();

        assert!(parse_year("conductores.xlsx", &pattern).is_err());
        assert!(parse_year("2015_conductores.xlsx", &pattern).is_err());
    }

    #[test]
    fn is_workbook_accepts_spreadsheet_extensions_only() {
        assert!(is_workbook(Path::new("data/2010.xls")));
        assert!(is_workbook(Path::new("data/2016.XLSX")));
        assert!(is_workbook(Path::new("data/2016.ods")));
        assert!(!is_workbook(Path::new("data/2016.csv")));
        assert!(!is_workbook(Path::new("data/2016")));
    }
}
