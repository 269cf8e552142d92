use calamine::{Data, Range};
use rusqlite::Connection;

use super::run::select_workbooks;
use super::*;
use crate::model::WorkbookEntry;
use crate::normalizer::{
    Cell, CombinedRow, CombinedYearTable, FinalDataset, NormalizedRow, NormalizedYearTable,
    combine_year, concat_years,
};

fn combined(year: u32, rows: Vec<(Option<&str>, &str, f64, f64)>) -> CombinedYearTable {
    let table = |interurban: bool| NormalizedYearTable {
        year,
        rows: rows
            .iter()
            .map(|(age, sex, inter, urb)| NormalizedRow {
                age_range: age.map(ToOwned::to_owned),
                sex: sex.to_string(),
                total: Some(if interurban { *inter } else { *urb }),
            })
            .collect(),
    };

    combine_year(&table(true), &table(false)).unwrap()
}

fn memory_store() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    ensure_schema(&connection).unwrap();
    connection
}

fn entry(filename: &str, year: u32) -> WorkbookEntry {
    WorkbookEntry {
        filename: filename.to_string(),
        year,
        sha256: String::new(),
        supported: true,
    }
}

#[test]
fn write_dataset_emits_header_and_empty_missing_fields() {
    let dataset = concat_years(vec![
        combined(2010, vec![(Some("18-20"), "Hombre", 100.0, 50.0)]),
        combined(2004, vec![(None, "Mujer", 3.0, 1.0)]),
    ]);

    let mut buffer = Vec::new();
    write_dataset(&mut buffer, &dataset).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let lines = text.lines().collect::<Vec<_>>();

    assert_eq!(
        lines[0],
        "Year,AgeRangeCanonical,StartAge,EndAge,Sex,TotalInterurban,TotalUrban,Total"
    );
    assert_eq!(lines[1], "2010,18-20,18,20,Hombre,100.0,50.0,150.0");
    assert_eq!(lines[2], "2004,,,,Mujer,3.0,1.0,4.0");
    assert_eq!(lines.len(), 3);
}

#[test]
fn write_dataset_marks_open_ended_ranges() {
    let dataset = concat_years(vec![combined(2017, vec![(Some("75-"), "Desconocido", 2.0, 0.0)])]);

    let mut buffer = Vec::new();
    write_dataset(&mut buffer, &dataset).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    assert!(text.starts_with("Year,AgeRangeCanonical,StartAge,EndAge,Sex,"));
    assert!(text.contains("2017,75-,75,999,Desconocido,2.0,0.0,2.0"));
}

#[test]
fn replace_years_overwrites_previous_rows_of_same_year() {
    let mut connection = memory_store();

    let first = concat_years(vec![
        combined(
            2015,
            vec![
                (Some("0-17"), "Hombre", 1.0, 2.0),
                (Some("0-17"), "Mujer", 3.0, 4.0),
            ],
        ),
        combined(2016, vec![(Some("0-17"), "Hombre", 5.0, 6.0)]),
    ]);
    assert_eq!(replace_years(&mut connection, &first).unwrap(), 3);

    let rerun = concat_years(vec![combined(
        2015,
        vec![(Some("0-17"), "Hombre", 10.0, 20.0)],
    )]);
    assert_eq!(replace_years(&mut connection, &rerun).unwrap(), 1);

    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM driver_totals").unwrap(),
        2
    );
    let total: f64 = connection
        .query_row(
            "SELECT total FROM driver_totals WHERE year = 2015 AND row_idx = 0",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(total, 30.0);
}

#[test]
fn count_rows_reports_rows_and_distinct_years() {
    let mut connection = memory_store();
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM driver_totals").unwrap(),
        0
    );

    let dataset = concat_years(vec![
        combined(
            2008,
            vec![
                (Some("0-17"), "Hombre", 1.0, 1.0),
                (Some("0-17"), "Mujer", 1.0, 1.0),
            ],
        ),
        combined(2009, vec![(Some("0-17"), "Hombre", 1.0, 1.0)]),
    ]);
    replace_years(&mut connection, &dataset).unwrap();

    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM driver_totals").unwrap(),
        3
    );
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(DISTINCT year) FROM driver_totals").unwrap(),
        2
    );
}

#[test]
fn replace_years_stores_missing_values_as_null() {
    let mut connection = memory_store();
    let dataset = FinalDataset {
        rows: vec![CombinedRow {
            year: 2001,
            age_range: None,
            start_age: None,
            end_age: None,
            sex: "Hombre".to_string(),
            total_interurban: Some(1.0),
            total_urban: None,
            total: None,
        }],
    };

    replace_years(&mut connection, &dataset).unwrap();

    let (age_range, end_age, total): (Option<String>, Option<i64>, Option<f64>) = connection
        .query_row(
            "SELECT age_range, end_age, total FROM driver_totals WHERE year = 2001",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(age_range, None);
    assert_eq!(end_age, None);
    assert_eq!(total, None);
}

#[test]
fn ensure_schema_records_schema_version() {
    let connection = memory_store();

    let version: String = connection
        .query_row(
            "SELECT value FROM metadata WHERE key = 'db_schema_version'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(version, DB_SCHEMA_VERSION);
}

#[test]
fn range_to_table_pads_leading_empty_columns() {
    let mut range = Range::new((3, 1), (4, 3));
    range.set_value((3, 1), Data::String("Hasta 17 años".to_string()));
    range.set_value((3, 2), Data::String("V".to_string()));
    range.set_value((3, 3), Data::Float(12.0));
    range.set_value((4, 2), Data::String("M".to_string()));
    range.set_value((4, 3), Data::Int(7));

    let table = range_to_table(&range);

    assert_eq!(table.height(), 2);
    assert_eq!(table.cell(0, 0), &Cell::Empty);
    assert_eq!(table.cell(0, 1), &Cell::Text("Hasta 17 años".to_string()));
    assert_eq!(table.cell(0, 2), &Cell::Text("V".to_string()));
    assert_eq!(table.cell(0, 3), &Cell::Number(12.0));
    assert_eq!(table.cell(1, 1), &Cell::Empty);
    assert_eq!(table.cell(1, 3), &Cell::Number(7.0));
}

#[test]
fn select_workbooks_filters_by_requested_years() {
    let workbooks = vec![
        entry("conductores_2003.xls", 2003),
        entry("conductores_2010.xls", 2010),
        entry("conductores_2017.xlsx", 2017),
    ];

    let all = select_workbooks(&workbooks, &[]);
    assert_eq!(all.len(), 3);

    let picked = select_workbooks(&workbooks, &[2017, 2003, 1990]);
    let years = picked.iter().map(|entry| entry.year).collect::<Vec<_>>();
    assert_eq!(years, vec![2003, 2017]);
}

#[test]
fn default_paths_live_under_data_root() {
    let root = std::path::Path::new("data");

    assert_eq!(
        default_csv_path(root),
        root.join("output").join("drivers_by_age_sex.csv")
    );
    assert_eq!(default_db_path(root), root.join("driver_stats.sqlite"));
}
