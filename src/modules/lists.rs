//! Read-only list pages: one table fed by one or more endpoints

use std::collections::BTreeMap;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::Frame;
use serde_json::Value;

use super::records::{extract_rows, field_text, sort_newest_first, Column, RecordTable};
use crate::core::{Action, Context, NotifyLevel, PageModule, Table};
use crate::infrastructure::api::{endpoints, ApiResult, Request};

/// One list endpoint, with the keys its rows may be wrapped in
#[derive(Debug, Clone, Copy)]
pub struct Source {
    pub path: &'static str,
    pub collection_keys: &'static [&'static str],
}

/// Client-side match on one field, case-insensitive. Rows without the field
/// count as `fallback`.
#[derive(Debug, Clone)]
pub struct RowFilter {
    pub fields: &'static [&'static str],
    pub fallback: &'static str,
    pub value: Option<String>,
}

impl RowFilter {
    pub fn matches(&self, row: &Value) -> bool {
        let Some(wanted) = &self.value else {
            return true;
        };
        let mut actual = field_text(row, self.fields).to_lowercase();
        if actual.is_empty() {
            actual = self.fallback.to_string();
        }
        actual == wanted.to_lowercase()
    }
}

pub struct ListPage {
    name: &'static str,
    title: &'static str,
    empty_text: &'static str,
    sources: &'static [Source],
    table: RecordTable,
    received: BTreeMap<&'static str, Vec<Value>>,
    /// Every row of the last load, before filtering
    loaded: Vec<Value>,
    filter: Option<RowFilter>,
    newest_first: Option<&'static [&'static str]>,
}

impl ListPage {
    pub fn new(
        name: &'static str,
        title: &'static str,
        empty_text: &'static str,
        sources: &'static [Source],
        columns: &'static [Column],
    ) -> Self {
        Self {
            name,
            title,
            empty_text,
            sources,
            table: RecordTable::new(columns),
            received: BTreeMap::new(),
            loaded: Vec::new(),
            filter: None,
            newest_first: None,
        }
    }

    /// Order merged rows by the first parseable time field, newest first
    pub fn with_newest_first(mut self, fields: &'static [&'static str]) -> Self {
        self.newest_first = Some(fields);
        self
    }

    pub fn with_filter(mut self, fields: &'static [&'static str], fallback: &'static str) -> Self {
        self.filter = Some(RowFilter {
            fields,
            fallback,
            value: None,
        });
        self
    }

    pub fn filter_value(&self) -> Option<&str> {
        self.filter.as_ref().and_then(|f| f.value.as_deref())
    }

    /// Re-filter the loaded rows; `None` shows everything
    pub fn set_filter(&mut self, value: Option<String>) {
        if let Some(filter) = self.filter.as_mut() {
            filter.value = value;
        }
        if self.table.is_loaded() {
            self.show_loaded();
        }
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn fetch(&mut self, ctx: &mut Context) {
        self.received.clear();
        self.table.mark_loading();
        for source in self.sources {
            ctx.request(source.path, Request::get(source.path));
        }
    }

    /// Load the first source from another path (a query or a narrowed
    /// endpoint) with the same row handling
    pub fn fetch_at(&mut self, path: impl Into<String>, ctx: &mut Context) {
        let Some(source) = self.sources.first() else {
            return;
        };
        self.received.clear();
        self.table.mark_loading();
        ctx.request(source.path, Request::get(path));
    }

    /// Merge a source's rows. Rows are shown once every source has answered;
    /// with several sources a failed one counts as empty.
    pub fn accept(&mut self, key: &str, result: ApiResult, ctx: &mut Context) -> bool {
        let Some(source) = self.sources.iter().find(|s| s.path == key) else {
            return false;
        };
        match result {
            Ok(body) => {
                self.received
                    .insert(source.path, extract_rows(&body, source.collection_keys));
            }
            Err(err) if self.sources.len() == 1 => {
                self.table.set_error(err.to_string());
                ctx.notify(
                    format!("Failed to load {}: {}", self.name, err),
                    NotifyLevel::Error,
                );
                return true;
            }
            Err(err) => {
                tracing::warn!(page = self.name, source = source.path, error = %err, "list source failed");
                self.received.insert(source.path, Vec::new());
            }
        }

        if self.received.len() == self.sources.len() {
            let mut rows: Vec<Value> = self
                .sources
                .iter()
                .filter_map(|s| self.received.remove(s.path))
                .flatten()
                .collect();
            if let Some(fields) = self.newest_first {
                sort_newest_first(&mut rows, fields);
            }
            self.loaded = rows;
            self.show_loaded();
        }
        true
    }

    fn show_loaded(&mut self) {
        let rows = match &self.filter {
            Some(filter) => self
                .loaded
                .iter()
                .filter(|row| filter.matches(row))
                .cloned()
                .collect(),
            None => self.loaded.clone(),
        };
        self.table.set_rows(rows);
    }

    pub fn handle_list_key(&mut self, key: KeyEvent) -> Action {
        if self.table.handle_nav_key(key) {
            return Action::None;
        }
        match key.code {
            KeyCode::Char('y') => self.table.copy_selected(),
            _ => Action::None,
        }
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        match self.filter_value() {
            Some(value) => self.draw_titled(f, area, &format!("{} · {}", self.title, value)),
            None => self.draw_titled(f, area, self.title),
        }
    }

    pub fn draw_titled(&self, f: &mut Frame, area: Rect, title: &str) {
        self.table.render(f, area, title, self.empty_text);
    }
}

impl PageModule for ListPage {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn on_response(&mut self, key: &str, result: ApiResult, ctx: &mut Context) -> Result<()> {
        self.accept(key, result, ctx);
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, _ctx: &mut Context) -> Action {
        self.handle_list_key(key)
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &Context) {
        self.draw(frame, area);
    }

    fn export_table(&self) -> Option<Table> {
        Some(self.table.to_table(self.name))
    }
}

const TRACKING_SOURCES: &[Source] = &[Source {
    path: endpoints::TRACKING,
    collection_keys: &["posts", "tracking", "data"],
}];

const TRACKING_COLUMNS: &[Column] = &[
    Column { title: "Post", fields: &["media_id", "post_id", "id"], width: 20 },
    Column { title: "Topic", fields: &["topic", "caption"], width: 35 },
    Column { title: "Kind", fields: &["post_kind", "media_type"], width: 12 },
    Column { title: "Published", fields: &["published_at", "posted_at", "created_at"], width: 20 },
    Column { title: "Status", fields: &["tracking_status", "status"], width: 13 },
];

const TASK_SOURCES: &[Source] = &[Source {
    path: endpoints::AGENT_TASKS,
    collection_keys: &["tasks", "data"],
}];

const TASK_COLUMNS: &[Column] = &[
    Column { title: "Task", fields: &["id", "task_id"], width: 15 },
    Column { title: "Type", fields: &["type", "task_type", "agent"], width: 15 },
    Column { title: "Status", fields: &["status"], width: 12 },
    Column { title: "Started", fields: &["created_at", "started_at"], width: 20 },
    Column { title: "Detail", fields: &["description", "message", "result"], width: 38 },
];

const LOG_SOURCES: &[Source] = &[
    Source {
        path: endpoints::ERRORS,
        collection_keys: &["errors", "data"],
    },
    Source {
        path: endpoints::ERROR_LOGS,
        collection_keys: &["logs", "errors", "data"],
    },
];

const LOG_COLUMNS: &[Column] = &[
    Column { title: "Time", fields: &["timestamp", "created_at", "time"], width: 20 },
    Column { title: "Level", fields: &["level", "severity", "error_type"], width: 12 },
    Column { title: "Source", fields: &["source", "module", "component"], width: 15 },
    Column { title: "Message", fields: &["message", "error", "detail"], width: 53 },
];

pub fn tracking() -> ListPage {
    ListPage::new(
        "tracking",
        "Post Tracking",
        "No tracked posts",
        TRACKING_SOURCES,
        TRACKING_COLUMNS,
    )
}

pub fn tasks() -> ListPage {
    ListPage::new("tasks", "Agent Tasks", "No tasks", TASK_SOURCES, TASK_COLUMNS)
}

pub fn logs() -> ListPage {
    ListPage::new("logs", "Error Logs", "No errors logged", LOG_SOURCES, LOG_COLUMNS)
        .with_newest_first(&["timestamp", "created_at"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api::ApiError;
    use serde_json::json;

    #[test]
    fn test_fetch_requests_every_source() {
        let mut page = logs();
        let mut ctx = Context::new();
        page.fetch(&mut ctx);
        let paths: Vec<_> = ctx.take_outbox().into_iter().map(|o| o.request.path).collect();
        assert_eq!(paths, vec![endpoints::ERRORS, endpoints::ERROR_LOGS]);
    }

    #[test]
    fn test_failed_source_counts_as_empty() {
        let mut page = logs();
        let mut ctx = Context::new();
        page.fetch(&mut ctx);

        page.accept(endpoints::ERROR_LOGS, Err(ApiError::Timeout), &mut ctx);
        assert!(page.table().is_empty());
        page.accept(
            endpoints::ERRORS,
            Ok(json!({"errors": [{"message": "boom"}, {"message": "bang"}]})),
            &mut ctx,
        );
        assert_eq!(page.table().len(), 2);
        assert!(ctx.take_notices().is_empty());
    }

    #[test]
    fn test_single_source_failure_notifies_and_keeps_rows() {
        let mut page = tasks();
        let mut ctx = Context::new();
        page.fetch(&mut ctx);
        page.accept(endpoints::AGENT_TASKS, Ok(json!([{"id": 1}])), &mut ctx);

        page.fetch(&mut ctx);
        page.accept(
            endpoints::AGENT_TASKS,
            Err(ApiError::Network("refused".into())),
            &mut ctx,
        );
        assert_eq!(page.table().len(), 1);
        let notices = ctx.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].text.starts_with("Failed to load tasks"));
    }

    #[test]
    fn test_logs_merge_newest_first() {
        let mut page = logs();
        let mut ctx = Context::new();
        page.fetch(&mut ctx);

        page.accept(
            endpoints::ERRORS,
            Ok(json!([{"timestamp": "2024-01-01", "message": "old"}])),
            &mut ctx,
        );
        page.accept(
            endpoints::ERROR_LOGS,
            Ok(json!({"logs": [
                {"message": "undated"},
                {"timestamp": "2024-06-01", "message": "new"},
                {"created_at": "2024-03-15T12:00:00", "message": "middle"}
            ]})),
            &mut ctx,
        );
        let messages: Vec<_> = page
            .table()
            .rows()
            .iter()
            .map(|row| field_text(row, &["message"]))
            .collect();
        assert_eq!(messages, vec!["new", "middle", "old", "undated"]);
    }

    #[test]
    fn test_filter_applies_to_loaded_rows() {
        let mut page = tasks().with_filter(&["status"], "pending");
        let mut ctx = Context::new();
        page.fetch(&mut ctx);
        page.accept(
            endpoints::AGENT_TASKS,
            Ok(json!([{"id": 1, "status": "Failed"}, {"id": 2}, {"id": 3, "status": "done"}])),
            &mut ctx,
        );
        assert_eq!(page.table().len(), 3);

        page.set_filter(Some("pending".to_string()));
        assert_eq!(page.table().selected_id().as_deref(), Some("2"));
        page.set_filter(Some("failed".to_string()));
        assert_eq!(page.table().selected_id().as_deref(), Some("1"));
        page.set_filter(None);
        assert_eq!(page.table().len(), 3);
    }

    #[test]
    fn test_fetch_at_answers_under_source_key() {
        let mut page = tasks();
        let mut ctx = Context::new();
        page.fetch_at("/api/agent/tasks?limit=5", &mut ctx);
        let out = ctx.take_outbox();
        assert_eq!(out[0].key, endpoints::AGENT_TASKS);
        assert_eq!(out[0].request.path, "/api/agent/tasks?limit=5");
        assert!(page.accept(&out[0].key, Ok(json!([{"id": 4}])), &mut ctx));
        assert_eq!(page.table().len(), 1);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut page = tracking();
        let mut ctx = Context::new();
        assert!(!page.accept("/api/other", Ok(json!([])), &mut ctx));
    }
}
