//! Export Module
//!
//! Writes the active page's table to disk.
//!
//! - 'e' exports the visible columns as CSV
//! - 'E' exports the raw records as JSON
//! - Files are saved under the data dir's `exports/`

mod csv_export;
mod json_export;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config;
use crate::core::{Action, ExportFormat, NotifyLevel, Table};

pub use csv_export::write_table as write_csv;
pub use json_export::write_records as write_json;

/// Get the export directory path, creating it if needed
fn get_export_dir() -> std::io::Result<PathBuf> {
    let export_dir = config::export_dir();
    fs::create_dir_all(&export_dir)?;
    Ok(export_dir)
}

/// Generate a timestamped filename
pub fn generate_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, extension)
}

/// Export a page table, reporting the outcome as a notification
pub fn export_table(table: Option<Table>, format: ExportFormat) -> Action {
    let Some(table) = table else {
        return Action::Notify(
            "Nothing to export on this page".to_string(),
            NotifyLevel::Warn,
        );
    };
    if table.rows.is_empty() && table.raw.is_empty() {
        return Action::Notify(
            format!("No {} rows to export", table.name),
            NotifyLevel::Warn,
        );
    }

    let export_dir = match get_export_dir() {
        Ok(dir) => dir,
        Err(e) => {
            return Action::Notify(
                format!("Failed to create export directory: {}", e),
                NotifyLevel::Error,
            )
        }
    };
    export_to(&export_dir, &table, format)
}

/// Write into an explicit directory
pub fn export_to(dir: &Path, table: &Table, format: ExportFormat) -> Action {
    let extension = match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Json => "json",
    };
    let filename = generate_filename(&table.name, extension);
    let path = dir.join(&filename);

    let written = match format {
        ExportFormat::Csv => csv_export::write_table(&path, table),
        ExportFormat::Json => json_export::write_records(&path, table),
    };
    match written {
        Ok(count) => {
            tracing::info!(path = %path.display(), count, "exported table");
            Action::Notify(
                format!("Exported {} rows to {}", count, path.display()),
                NotifyLevel::Info,
            )
        }
        Err(e) => Action::Notify(format!("Export failed: {}", e), NotifyLevel::Error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        Table {
            name: "approvals".to_string(),
            headers: vec!["ID".to_string(), "Topic".to_string()],
            rows: vec![
                vec!["7".to_string(), "Spring, sale".to_string()],
                vec!["8".to_string(), "Launch".to_string()],
            ],
            raw: vec![json!({"id": 7}), json!({"id": 8})],
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("socdash-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_generate_filename() {
        let name = generate_filename("calendar", "csv");
        assert!(name.starts_with("calendar-"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn test_csv_export_quotes_fields() {
        let dir = scratch_dir("csv");
        let path = dir.join("out.csv");
        assert_eq!(write_csv(&path, &sample()).unwrap(), 2);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "ID,Topic\n7,\"Spring, sale\"\n8,Launch\n");
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_json_export_writes_raw_records() {
        let dir = scratch_dir("json");
        let path = dir.join("out.json");
        assert_eq!(write_json(&path, &sample()).unwrap(), 2);
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, json!([{"id": 7}, {"id": 8}]));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_export_without_table_warns() {
        assert!(matches!(
            export_table(None, ExportFormat::Csv),
            Action::Notify(_, NotifyLevel::Warn)
        ));
    }
}
