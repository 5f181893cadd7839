//! Fixture tables
//!
//! Fixtures are written as CSV with the columns `Home Team`, `Away Team` and
//! `Game Code`, one file per division and round.

use crate::error::Result;
use crate::league::planner::DivisionFixture;
use crate::types::FixtureRow;
use anyhow::Context;
use std::io;
use std::path::{Path, PathBuf};

/// `"<Division> Round <label> Fixtures <season>.csv"`
pub fn fixture_file_name(division: &str, round_label: &str, season: &str) -> String {
    format!("{} Round {} Fixtures {}.csv", division, round_label, season)
}

/// Serialize rows as CSV, header first
pub fn write_fixture_csv<W: io::Write>(writer: W, rows: &[FixtureRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one division's fixture into `dir`, returning the file path
pub fn write_division_fixture(
    dir: &Path,
    fixture: &DivisionFixture,
    season: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(fixture_file_name(
        &fixture.division,
        &fixture.round_label,
        season,
    ));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_fixture_csv(file, &fixture.rows)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

/// Read a fixture table back
pub fn read_fixture_csv(path: &Path) -> Result<Vec<FixtureRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open fixture table {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: FixtureRow =
            record.with_context(|| format!("Malformed row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}
