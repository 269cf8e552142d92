use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::normalizer::FinalDataset;
use crate::util::{ensure_parent_directory, now_utc_string};

pub(super) const DB_SCHEMA_VERSION: &str = "0.1.0";

pub(super) fn open_store(db_path: &Path) -> Result<Connection> {
    ensure_parent_directory(db_path)?;

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub(super) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS driver_totals (
          year INTEGER NOT NULL,
          row_idx INTEGER NOT NULL,
          age_range TEXT,
          start_age TEXT,
          end_age INTEGER,
          sex TEXT NOT NULL,
          total_interurban REAL,
          total_urban REAL,
          total REAL,
          PRIMARY KEY (year, row_idx)
        );

        CREATE INDEX IF NOT EXISTS idx_driver_totals_sex ON driver_totals(sex);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

/// Replaces the stored rows of every year present in `dataset`. Row order
/// within a year is kept in `row_idx`.
pub(super) fn replace_years(connection: &mut Connection, dataset: &FinalDataset) -> Result<usize> {
    let tx = connection.transaction()?;

    {
        let mut delete = tx.prepare("DELETE FROM driver_totals WHERE year = ?1")?;
        let mut insert = tx.prepare(
            "
            INSERT INTO driver_totals(
              year, row_idx, age_range, start_age, end_age, sex,
              total_interurban, total_urban, total
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )?;

        let mut current_year = None;
        let mut row_idx = 0_i64;
        for row in &dataset.rows {
            if current_year != Some(row.year) {
                delete.execute([row.year])?;
                current_year = Some(row.year);
                row_idx = 0;
            }

            insert.execute(params![
                row.year,
                row_idx,
                &row.age_range,
                &row.start_age,
                row.end_age,
                &row.sex,
                row.total_interurban,
                row.total_urban,
                row.total
            ])?;
            row_idx += 1;
        }
    }

    tx.commit()?;
    Ok(dataset.len())
}

/// Runs a single-value `COUNT` query.
pub(crate) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
