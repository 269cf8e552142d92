use std::ops::RangeInclusive;

use super::{BlockRow, Cell, ExtractedBlock, NormalizeError, RawYearTable};

const AGE_COLUMN: usize = 0;
const SEX_COLUMN: usize = 1;
const TOTAL_COLUMN: usize = 2;

/// Rows kept after the end-sentinel row: the rest of its group and the
/// closing Total line.
const TRAILING_ROWS: usize = 2;

struct BlockSentinels {
    /// Sex-column value of the first row of the block.
    start: &'static str,
    /// Age-column label of the last age group.
    end: &'static str,
}

static SENTINELS: [(RangeInclusive<u32>, BlockSentinels); 2] = [
    (
        2015..=2019,
        BlockSentinels {
            start: "HOMBRE",
            end: "SE DESCONOCE",
        },
    ),
    (
        1998..=2014,
        BlockSentinels {
            start: "V",
            end: "NO ESPECIFICADA",
        },
    ),
];

fn sentinels_for(year: u32) -> Option<&'static BlockSentinels> {
    SENTINELS
        .iter()
        .find(|(years, _)| years.contains(&year))
        .map(|(_, sentinels)| sentinels)
}

fn matches_sentinel(cell: &Cell, sentinel: &str) -> bool {
    cell.as_text()
        .is_some_and(|text| text.to_uppercase() == sentinel)
}

/// Slices the per-age/per-sex driver counts out of one year's sheet.
///
/// The block starts at the first row whose sex column holds the start
/// sentinel and ends two rows after the last row whose age column holds the
/// end sentinel. Only the first three columns are kept.
pub fn extract_driver_block(
    table: &RawYearTable,
    year: u32,
) -> Result<ExtractedBlock, NormalizeError> {
    let sentinels = sentinels_for(year).ok_or(NormalizeError::UnsupportedYear { year })?;

    let start_row = (0..table.height())
        .find(|&row| matches_sentinel(table.cell(row, SEX_COLUMN), sentinels.start))
        .ok_or(NormalizeError::MalformedTable {
            year,
            sentinel: sentinels.start,
        })?;

    let end_row = (0..table.height())
        .rev()
        .find(|&row| matches_sentinel(table.cell(row, AGE_COLUMN), sentinels.end))
        .filter(|&row| row >= start_row)
        .ok_or(NormalizeError::MalformedTable {
            year,
            sentinel: sentinels.end,
        })?;

    let stop = (end_row + TRAILING_ROWS + 1).min(table.height());
    let rows = (start_row..stop)
        .map(|row| BlockRow {
            age_label: table.cell(row, AGE_COLUMN).as_label(),
            sex: table.cell(row, SEX_COLUMN).as_label().unwrap_or_default(),
            total: table.cell(row, TOTAL_COLUMN).as_number(),
        })
        .collect();

    Ok(ExtractedBlock {
        year,
        start_row,
        end_row,
        rows,
    })
}
