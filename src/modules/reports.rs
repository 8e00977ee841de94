//! Generated reports

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::Frame;
use chrono::{Duration, Local, NaiveDate};
use serde_json::{json, Value};

use super::lists::{ListPage, Source};
use crate::core::{Action, Context, NotifyLevel, PageModule, Table};
use crate::infrastructure::api::{endpoints, ApiResult, Request};
use super::records::Column;

const GENERATE: &str = "generate";

const SOURCES: &[Source] = &[Source {
    path: endpoints::REPORTS,
    collection_keys: &["reports", "data"],
}];

const COLUMNS: &[Column] = &[
    Column { title: "ID", fields: &["id", "report_id"], width: 12 },
    Column { title: "Type", fields: &["report_type", "type"], width: 20 },
    Column { title: "Period", fields: &["period", "date_range", "created_at"], width: 28 },
    Column { title: "Status", fields: &["status"], width: 12 },
    Column { title: "Summary", fields: &["summary", "title"], width: 28 },
];

/// Performance report over the trailing 30 days
pub fn generate_body(today: NaiveDate) -> Value {
    let start = today - Duration::days(30);
    json!({
        "report_type": "performance",
        "start_date": start.format("%Y-%m-%d").to_string(),
        "end_date": today.format("%Y-%m-%d").to_string(),
    })
}

pub struct ReportsPage {
    list: ListPage,
    generating: bool,
}

impl ReportsPage {
    pub fn new() -> Self {
        Self {
            list: ListPage::new("reports", "Reports", "No reports yet", SOURCES, COLUMNS),
            generating: false,
        }
    }
}

impl Default for ReportsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl PageModule for ReportsPage {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        self.list.fetch(ctx);
        Ok(())
    }

    fn on_page_inactive(&mut self, _ctx: &mut Context) -> Result<()> {
        self.generating = false;
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Context) -> Result<()> {
        self.list.fetch(ctx);
        Ok(())
    }

    fn on_response(&mut self, key: &str, result: ApiResult, ctx: &mut Context) -> Result<()> {
        if key != GENERATE {
            self.list.accept(key, result, ctx);
            return Ok(());
        }
        self.generating = false;
        match result {
            Ok(_) => {
                ctx.notify("Report generated", NotifyLevel::Info);
                self.list.fetch(ctx);
            }
            Err(err) => ctx.notify(format!("Failed to generate report: {err}"), NotifyLevel::Error),
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Char('g') if self.generating => {
                Action::Notify("Report generation already running".to_string(), NotifyLevel::Warn)
            }
            KeyCode::Char('g') => {
                self.generating = true;
                ctx.request(
                    GENERATE,
                    Request::post_json(
                        endpoints::REPORTS_GENERATE,
                        generate_body(Local::now().date_naive()),
                    ),
                );
                Action::Notify("Generating report...".to_string(), NotifyLevel::Info)
            }
            _ => self.list.handle_list_key(key),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &Context) {
        self.list.draw(frame, area);
    }

    fn export_table(&self) -> Option<Table> {
        Some(self.list.table().to_table("reports"))
    }
}
