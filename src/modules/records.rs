//! Record tables shared by the list-style pages
//!
//! Backend payloads stay as `serde_json::Value`; a page only declares which
//! fields feed which column.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table as RataTable, TableState, Wrap};
use ratatui::Frame;
use serde_json::Value;

use crate::core::{Action, NotifyLevel, Table};

/// One table column: header, candidate fields (first non-empty wins), width %
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub fields: &'static [&'static str],
    pub width: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RecordTable {
    columns: &'static [Column],
    rows: Vec<Value>,
    selected: usize,
    state: LoadState,
}

impl RecordTable {
    pub fn new(columns: &'static [Column]) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            selected: 0,
            state: LoadState::Idle,
        }
    }

    pub fn mark_loading(&mut self) {
        self.state = LoadState::Loading;
    }

    pub fn set_rows(&mut self, rows: Vec<Value>) {
        self.rows = rows;
        self.state = LoadState::Loaded;
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    /// Keep whatever rows were already shown
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.state = LoadState::Failed(message.into());
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&Value> {
        self.rows.get(self.selected)
    }

    /// Selected record's id, as text
    pub fn selected_id(&self) -> Option<String> {
        self.selected_row()
            .map(|row| field_text(row, &["id", "entry_id", "alert_id"]))
            .filter(|id| !id.is_empty())
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Up/Down/j/k/Home/End. Returns whether the key was used.
    pub fn handle_nav_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.rows.len().saturating_sub(1)
            }
            _ => return false,
        }
        true
    }

    /// Copy the selected record as pretty JSON
    pub fn copy_selected(&self) -> Action {
        match self.selected_row() {
            Some(row) => Action::Copy(serde_json::to_string_pretty(row).unwrap_or_default()),
            None => Action::Notify("Nothing selected".to_string(), NotifyLevel::Warn),
        }
    }

    pub fn to_table(&self, name: &str) -> Table {
        Table {
            name: name.to_string(),
            headers: self.columns.iter().map(|c| c.title.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| self.columns.iter().map(|c| field_text(row, c.fields)).collect())
                .collect(),
            raw: self.rows.clone(),
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, title: &str, empty_text: &str) {
        let status = match &self.state {
            LoadState::Loading => " (loading…)".to_string(),
            LoadState::Failed(_) => " (stale)".to_string(),
            _ => format!(" ({})", self.rows.len()),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{title}{status}"))
            .border_style(Style::default().fg(Color::Cyan));

        if self.rows.is_empty() {
            let text = match &self.state {
                LoadState::Idle | LoadState::Loading => "Loading…".to_string(),
                LoadState::Failed(err) => format!("Failed to load: {err}"),
                LoadState::Loaded => empty_text.to_string(),
            };
            let paragraph = Paragraph::new(Line::from(Span::styled(
                text,
                Style::default().fg(Color::DarkGray),
            )))
            .block(block)
            .wrap(Wrap { trim: true });
            f.render_widget(paragraph, area);
            return;
        }

        let header = Row::new(self.columns.iter().map(|c| c.title)).style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
        let rows = self.rows.iter().map(|row| {
            Row::new(
                self.columns
                    .iter()
                    .map(|c| field_text(row, c.fields))
                    .collect::<Vec<_>>(),
            )
        });
        let widths: Vec<Constraint> = self
            .columns
            .iter()
            .map(|c| Constraint::Percentage(c.width))
            .collect();

        let table = RataTable::new(rows, widths)
            .header(header)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("› ");

        let mut state = TableState::default().with_selected(Some(self.selected));
        f.render_stateful_widget(table, area, &mut state);
    }
}

/// Rows of a list payload: a bare array, or an array under one of `keys`
pub fn extract_rows(value: &Value, keys: &[&str]) -> Vec<Value> {
    if let Some(items) = value.as_array() {
        return items.clone();
    }
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

/// Text of the first present, non-null field
pub fn field_text(row: &Value, fields: &[&str]) -> String {
    fields
        .iter()
        .filter_map(|field| row.get(*field))
        .find(|value| !value.is_null())
        .map(scalar_text)
        .unwrap_or_default()
}

/// Timestamp of the first parseable field. Zoned values are compared in UTC.
pub fn record_time(row: &Value, fields: &[&str]) -> Option<NaiveDateTime> {
    fields
        .iter()
        .filter_map(|field| row.get(*field).and_then(Value::as_str))
        .find_map(parse_time)
}

fn parse_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Stable sort, newest first; rows without a usable time go last
pub fn sort_newest_first(rows: &mut [Value], fields: &[&str]) {
    rows.sort_by_cached_key(|row| std::cmp::Reverse(record_time(row, fields)));
}

pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Top-level scalar (and scalar-array) fields of an object, in key order
pub fn key_values(value: &Value) -> Vec<(String, String)> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_object())
        .filter(|(_, v)| match v {
            Value::Array(items) => items.iter().all(|i| !i.is_object() && !i.is_array()),
            _ => true,
        })
        .map(|(k, v)| (humanize(k), scalar_text(v)))
        .collect()
}

/// `scheduled_time` → `Scheduled time`
pub fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub fn render_key_values(f: &mut Frame, area: Rect, title: &str, pairs: &[(String, String)]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(Style::default().fg(Color::DarkGray));
    let lines: Vec<Line> = if pairs.is_empty() {
        vec![Line::from(Span::styled(
            "No data",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        pairs
            .iter()
            .map(|(k, v)| {
                Line::from(vec![
                    Span::styled(format!("{k}: "), Style::default().fg(Color::DarkGray)),
                    Span::raw(v.clone()),
                ])
            })
            .collect()
    };
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    const COLUMNS: &[Column] = &[
        Column {
            title: "ID",
            fields: &["id"],
            width: 20,
        },
        Column {
            title: "Topic",
            fields: &["topic", "title"],
            width: 80,
        },
    ];

    #[test]
    fn test_extract_rows_shapes() {
        assert_eq!(extract_rows(&json!([1, 2]), &["alerts"]).len(), 2);
        assert_eq!(
            extract_rows(&json!({"alerts": [{"id": 1}]}), &["alerts", "data"]).len(),
            1
        );
        assert_eq!(
            extract_rows(&json!({"data": [{"id": 1}, {"id": 2}]}), &["alerts", "data"]).len(),
            2
        );
        assert!(extract_rows(&json!({"count": 3}), &["alerts"]).is_empty());
    }

    #[test]
    fn test_field_text_fallbacks() {
        let row = json!({"topic": null, "title": "Launch", "rate": 4.256, "tags": ["a", "b"], "ok": true});
        assert_eq!(field_text(&row, &["topic", "title"]), "Launch");
        assert_eq!(field_text(&row, &["rate"]), "4.26");
        assert_eq!(field_text(&row, &["tags"]), "a, b");
        assert_eq!(field_text(&row, &["ok"]), "yes");
        assert_eq!(field_text(&row, &["missing"]), "");
    }

    #[test]
    fn test_selection_and_export() {
        let mut table = RecordTable::new(COLUMNS);
        table.set_rows(vec![
            json!({"id": 1, "topic": "Spring"}),
            json!({"id": 2, "title": "Summer"}),
        ]);
        assert!(table.handle_nav_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)));
        assert!(table.handle_nav_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)));
        assert_eq!(table.selected_id().as_deref(), Some("2"));

        table.set_rows(vec![json!({"id": 9})]);
        assert_eq!(table.selected_index(), 0);

        table.set_error("timeout");
        assert_eq!(table.len(), 1);
        let exported = table.to_table("calendar");
        assert_eq!(exported.headers, vec!["ID", "Topic"]);
        assert_eq!(exported.rows, vec![vec!["9".to_string(), String::new()]]);
    }

    #[test]
    fn test_key_values_and_humanize() {
        let pairs = key_values(&json!({"scheduled_time": "09:00", "nested": {"a": 1}, "enabled": false}));
        assert_eq!(
            pairs,
            vec![
                ("Enabled".to_string(), "no".to_string()),
                ("Scheduled time".to_string(), "09:00".to_string())
            ]
        );
    }

    #[test]
    fn test_record_time_formats() {
        let at = |text: &str| record_time(&json!({"timestamp": text}), &["timestamp"]);
        assert_eq!(at("2024-06-01T10:00:00+02:00"), at("2024-06-01T08:00:00"));
        assert_eq!(at("2024-06-01 08:00:00.250"), at("2024-06-01T08:00:00.250"));
        assert!(at("2024-06-01 08:00:00") < at("2024-06-01 08:00:00.250"));
        assert!(at("2024-06-01") < at("2024-06-01T00:00:01Z"));
        assert_eq!(at("yesterday"), None);
        // Falls through to the next field
        let row = json!({"timestamp": null, "created_at": "2024-01-01"});
        assert!(record_time(&row, &["timestamp", "created_at"]).is_some());
    }

    #[test]
    fn test_sort_newest_first_keeps_undated_last() {
        let mut rows = vec![
            json!({"id": "undated"}),
            json!({"id": "old", "created_at": "2023-12-31"}),
            json!({"id": "new", "timestamp": "2024-06-01T09:00:00Z"}),
            json!({"id": "junk", "timestamp": "n/a"}),
        ];
        sort_newest_first(&mut rows, &["timestamp", "created_at"]);
        let ids: Vec<_> = rows.iter().map(|r| field_text(r, &["id"])).collect();
        assert_eq!(ids, vec!["new", "old", "undated", "junk"]);
    }
}
