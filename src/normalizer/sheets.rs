use std::ops::RangeInclusive;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RoadType {
    Interurban,
    Urban,
}

impl RoadType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interurban => "interurban",
            Self::Urban => "urban",
        }
    }

    pub fn is_interurban(self) -> bool {
        self == Self::Interurban
    }
}

/// Sheet names per publication layout: (years, inter-urban sheet, urban sheet).
/// Names are matched verbatim against the workbooks, trailing spaces included.
const SHEET_NAMES: [(RangeInclusive<u32>, &str, &str); 5] = [
    (2015..=2019, "TABLA 4.2.I", "TABLA 4.2.U"),
    (2011..=2014, "4.2.I", "4.2.U "),
    (2006..=2010, "4.2.C. ", "4.2.U. "),
    (1999..=2005, "4.2.C.", "4.2.U."),
    (1998..=1998, "4.2 C", "4.2 U"),
];

pub fn resolve_sheet_name(year: u32, is_interurban: bool) -> Option<&'static str> {
    SHEET_NAMES
        .iter()
        .find(|(years, _, _)| years.contains(&year))
        .map(|(_, interurban, urban)| if is_interurban { *interurban } else { *urban })
}
