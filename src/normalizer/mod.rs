//! Per-year normalization of the "drivers involved in accidents with victims"
//! tables into one long-form dataset.
//!
//! ```text
//!  RawYearTable (inter-urban)     RawYearTable (urban)
//!         │                               │
//!     extract_driver_block            extract_driver_block
//!         │                               │
//!     normalize_sex / drop Total      normalize_sex / drop Total
//!     fill_missing_ages               fill_missing_ages
//!     parse_age_range                 parse_age_range
//!         └──────────► combine_year ◄─────┘
//!                          │
//!                     concat_years
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

mod block;
mod categories;
mod gap_fill;
mod merge;
mod sheets;

pub use block::extract_driver_block;
pub use categories::{normalize_sex, parse_age_range};
pub use gap_fill::{RowGrouping, fill_missing_ages};
pub use merge::{OPEN_END_AGE, combine_year, concat_years, split_age_range};
pub use sheets::{RoadType, resolve_sheet_name};

/// Sex label of the subtotal line closing each age group.
const TOTAL_LABEL: &str = "Total";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("year {year} has no known workbook layout")]
    UnsupportedYear { year: u32 },

    #[error("year {year}: sentinel {sentinel:?} not found in table")]
    MalformedTable { year: u32, sentinel: &'static str },

    #[error(
        "year {year}: inter-urban table has {interurban_rows} rows but urban table has {urban_rows}"
    )]
    MisalignedTables {
        year: u32,
        interurban_rows: usize,
        urban_rows: usize,
    },

    #[error("cannot combine inter-urban year {interurban_year} with urban year {urban_year}")]
    YearMismatch {
        interurban_year: u32,
        urban_year: u32,
    },
}

/// A single spreadsheet cell, reduced to what the pipeline distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric value of the cell; numeric text is accepted.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(text) => text.trim().parse().ok(),
            Cell::Empty => None,
        }
    }

    /// Text rendering used for label columns. Empty cells have no label.
    pub fn as_label(&self) -> Option<String> {
        match self {
            Cell::Text(text) => Some(text.clone()),
            Cell::Number(value) => Some(value.to_string()),
            Cell::Empty => None,
        }
    }
}

/// One worksheet as loaded from a workbook, row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawYearTable {
    rows: Vec<Vec<Cell>>,
}

impl RawYearTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `(row, column)`; positions outside the grid read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// One row of the driver-count block before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRow {
    pub age_label: Option<String>,
    pub sex: String,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedBlock {
    pub year: u32,
    /// Row of the first start-sentinel match in the source table.
    pub start_row: usize,
    /// Row of the last end-sentinel match in the source table.
    pub end_row: usize,
    pub rows: Vec<BlockRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub age_range: Option<String>,
    pub sex: String,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedYearTable {
    pub year: u32,
    pub rows: Vec<NormalizedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CombinedRow {
    pub year: u32,
    #[serde(rename = "AgeRangeCanonical")]
    pub age_range: Option<String>,
    pub start_age: Option<String>,
    pub end_age: Option<u32>,
    pub sex: String,
    pub total_interurban: Option<f64>,
    pub total_urban: Option<f64>,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedYearTable {
    pub year: u32,
    pub rows: Vec<CombinedRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalDataset {
    pub rows: Vec<CombinedRow>,
}

impl FinalDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Runs extraction, sex mapping, Total-row removal, gap filling and age
/// canonicalization over one sheet.
pub fn normalize_year_table(
    table: &RawYearTable,
    year: u32,
) -> Result<NormalizedYearTable, NormalizeError> {
    let block = extract_driver_block(table, year)?;
    debug!(
        year = block.year,
        start_row = block.start_row,
        end_row = block.end_row,
        rows = block.rows.len(),
        "extracted driver block"
    );

    let extracted = block.rows.len();
    let mut rows = block
        .rows
        .into_iter()
        .map(|row| BlockRow {
            sex: normalize_sex(&row.sex).to_string(),
            ..row
        })
        .filter(|row| row.sex != TOTAL_LABEL)
        .collect::<Vec<_>>();
    debug!(year, dropped = extracted - rows.len(), "dropped total rows");

    fill_missing_ages(&mut rows, RowGrouping::for_year(year));

    let rows = rows
        .into_iter()
        .map(|row| NormalizedRow {
            age_range: row.age_label.as_deref().and_then(parse_age_range),
            sex: row.sex,
            total: row.total,
        })
        .collect::<Vec<_>>();

    let unparsed = rows.iter().filter(|row| row.age_range.is_none()).count();
    debug!(year, rows = rows.len(), unparsed, "normalized year table");

    Ok(NormalizedYearTable { year, rows })
}

/// Normalizes both road-type sheets of one year and merges them.
pub fn normalize_year(
    year: u32,
    interurban: &RawYearTable,
    urban: &RawYearTable,
) -> Result<CombinedYearTable, NormalizeError> {
    let interurban = normalize_year_table(interurban, year)?;
    let urban = normalize_year_table(urban, year)?;
    combine_year(&interurban, &urban)
}
