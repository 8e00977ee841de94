//! JSON Export
//!
//! Writes the records behind a page table, untouched.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::core::Table;

/// Write raw records to a JSON file; returns the number of records
pub fn write_records(path: &Path, table: &Table) -> Result<usize, Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&table.raw)?;

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    Ok(table.raw.len())
}
