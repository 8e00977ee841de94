//! CSV Export
//!
//! Writes the visible columns of a page table.

use std::path::Path;

use crate::core::Table;

/// Write a table to a CSV file; returns the number of data rows
pub fn write_table(path: &Path, table: &Table) -> Result<usize, Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)?;

    // Write header
    wtr.write_record(&table.headers)?;

    // Write data rows
    for row in &table.rows {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(table.rows.len())
}
