use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};

use crate::normalizer::{Cell, RawYearTable};

/// An open workbook of one publication year.
pub(super) struct Workbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl Workbook {
    pub(super) fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path)
            .map_err(|err| anyhow!("failed to open workbook {}: {err}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub(super) fn raw_table(&mut self, sheet: &str) -> Result<RawYearTable> {
        let names = self.sheets.sheet_names();
        if !names.iter().any(|name| name == sheet) {
            let available = names
                .iter()
                .map(|name| format!("{name:?}"))
                .collect::<Vec<_>>()
                .join(", ");
            bail!(
                "sheet {sheet:?} not found in {} (available: {available})",
                self.path.display()
            );
        }

        let range = self.sheets.worksheet_range(sheet).map_err(|err| {
            anyhow!(
                "failed to read sheet {sheet:?} in {}: {err}",
                self.path.display()
            )
        })?;

        Ok(range_to_table(&range))
    }
}

/// Converts a calamine range into a grid whose column 0 is the sheet's
/// column A. Calamine ranges start at the first used cell, so leading empty
/// columns are padded back in.
pub(super) fn range_to_table(range: &Range<Data>) -> RawYearTable {
    let leading_columns = range.start().map(|(_, column)| column as usize).unwrap_or(0);

    let rows = range
        .rows()
        .map(|cells| {
            std::iter::repeat_n(Cell::Empty, leading_columns)
                .chain(cells.iter().map(data_to_cell))
                .collect()
        })
        .collect();

    RawYearTable::new(rows)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::String(text) => Cell::Text(text.clone()),
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Bool(value) => Cell::Text(value.to_string()),
        Data::DateTime(value) => Cell::Number(value.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::Text(text.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}
