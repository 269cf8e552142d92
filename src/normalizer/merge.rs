use tracing::debug;

use super::{
    CombinedRow, CombinedYearTable, FinalDataset, NormalizeError, NormalizedYearTable,
};

/// `EndAge` of an open-ended bracket such as "75-".
pub const OPEN_END_AGE: u32 = 999;

/// Splits a canonical `start-end` range. Missing ranges split into missing
/// bounds.
pub fn split_age_range(range: Option<&str>) -> (Option<String>, Option<u32>) {
    let Some((start, end)) = range.and_then(|value| value.split_once('-')) else {
        return (None, None);
    };

    let end = if end.is_empty() {
        Some(OPEN_END_AGE)
    } else {
        end.parse().ok()
    };

    (Some(start.to_string()), end)
}

/// Joins one year's inter-urban and urban tables row by row.
///
/// Rows are matched by position; both tables must list the same age
/// brackets and sexes in the same order.
pub fn combine_year(
    interurban: &NormalizedYearTable,
    urban: &NormalizedYearTable,
) -> Result<CombinedYearTable, NormalizeError> {
    if interurban.year != urban.year {
        return Err(NormalizeError::YearMismatch {
            interurban_year: interurban.year,
            urban_year: urban.year,
        });
    }
    if interurban.rows.len() != urban.rows.len() {
        return Err(NormalizeError::MisalignedTables {
            year: interurban.year,
            interurban_rows: interurban.rows.len(),
            urban_rows: urban.rows.len(),
        });
    }

    let rows = interurban
        .rows
        .iter()
        .zip(&urban.rows)
        .map(|(inter, urb)| {
            let (start_age, end_age) = split_age_range(inter.age_range.as_deref());
            let total = inter.total.zip(urb.total).map(|(a, b)| a + b);

            CombinedRow {
                year: interurban.year,
                age_range: inter.age_range.clone(),
                start_age,
                end_age,
                sex: inter.sex.clone(),
                total_interurban: inter.total,
                total_urban: urb.total,
                total,
            }
        })
        .collect::<Vec<_>>();

    debug!(year = interurban.year, rows = rows.len(), "combined road types");

    Ok(CombinedYearTable {
        year: interurban.year,
        rows,
    })
}

/// Appends every year's rows in the order given. No sorting, no dedup.
pub fn concat_years<I>(tables: I) -> FinalDataset
where
    I: IntoIterator<Item = CombinedYearTable>,
{
    let rows = tables
        .into_iter()
        .flat_map(|table| table.rows)
        .collect();

    FinalDataset { rows }
}
