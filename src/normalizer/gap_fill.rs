use super::BlockRow;

/// How many consecutive rows share one printed age label.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowGrouping {
    /// Hombre, Mujer.
    Pairs,
    /// Three sex lines per age bracket.
    Triples,
}

impl RowGrouping {
    pub const FIRST_TRIPLES_YEAR: u32 = 2006;

    pub fn for_year(year: u32) -> Self {
        if year >= Self::FIRST_TRIPLES_YEAR {
            Self::Triples
        } else {
            Self::Pairs
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::Pairs => 2,
            Self::Triples => 3,
        }
    }
}

/// Copies each group's age label from its first row onto the other rows of
/// the group. `rows[0]` must start a group.
pub fn fill_missing_ages(rows: &mut [BlockRow], grouping: RowGrouping) {
    for group in rows.chunks_mut(grouping.size()) {
        let Some((first, rest)) = group.split_first_mut() else {
            continue;
        };
        for row in rest {
            row.age_label = first.age_label.clone();
        }
    }
}
