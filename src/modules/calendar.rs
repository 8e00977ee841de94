//! Content calendar: scheduled entries, status and date filters, deletion
//! and the per-entry workflow trigger

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::Frame;

use super::lists::{ListPage, Source};
use super::records::{field_text, Column};
use crate::core::{Action, Context, NotifyLevel, PageModule, PromptKind, Table};
use crate::infrastructure::api::{endpoints, ApiResult, Request};

const START_WORKFLOW: &str = "start_workflow";
const DELETE: &str = "delete";

const STATUS_FILTERS: &[Option<&str>] = &[
    None,
    Some("pending"),
    Some("processing"),
    Some("awaiting approval"),
    Some("posted"),
    Some("failed"),
];

const SOURCES: &[Source] = &[Source {
    path: endpoints::CALENDAR,
    collection_keys: &["entries", "calendar", "data"],
}];

const COLUMNS: &[Column] = &[
    Column { title: "ID", fields: &["id", "entry_id"], width: 8 },
    Column { title: "Date", fields: &["date", "scheduled_date"], width: 14 },
    Column { title: "Time", fields: &["time", "scheduled_time"], width: 10 },
    Column { title: "Platform", fields: &["platform", "post_type"], width: 14 },
    Column { title: "Topic", fields: &["topic", "title"], width: 40 },
    Column { title: "Status", fields: &["status"], width: 14 },
];

pub struct CalendarPage {
    list: ListPage,
    /// Server-side narrowing to one day
    date: Option<NaiveDate>,
    /// Entry that one more `X` deletes
    confirm_delete: Option<String>,
}

impl CalendarPage {
    pub fn new() -> Self {
        Self {
            list: ListPage::new(
                "calendar",
                "Content Calendar",
                "No scheduled entries",
                SOURCES,
                COLUMNS,
            )
            .with_filter(&["status"], "pending"),
            date: None,
            confirm_delete: None,
        }
    }

    fn fetch(&mut self, ctx: &mut Context) {
        match self.date {
            Some(date) => self
                .list
                .fetch_at(endpoints::calendar_by_date(&date.to_string()), ctx),
            None => self.list.fetch(ctx),
        }
    }

    fn cycle_status(&mut self) -> Action {
        let current = self.list.filter_value();
        let idx = STATUS_FILTERS
            .iter()
            .position(|f| *f == current)
            .unwrap_or(0);
        let next = STATUS_FILTERS[(idx + 1) % STATUS_FILTERS.len()];
        self.list.set_filter(next.map(str::to_string));
        Action::Notify(
            format!("Showing {} entries", next.unwrap_or("all")),
            NotifyLevel::Info,
        )
    }

    fn delete_selected(&mut self, ctx: &mut Context) -> Action {
        let Some(id) = self.list.table().selected_id() else {
            return Action::Notify("No entry selected".to_string(), NotifyLevel::Warn);
        };
        if self.confirm_delete.as_deref() != Some(id.as_str()) {
            let text = format!("Press X again to delete entry {id}");
            self.confirm_delete = Some(id);
            return Action::Notify(text, NotifyLevel::Warn);
        }
        self.confirm_delete = None;
        ctx.request(DELETE, Request::delete(endpoints::calendar_entry(&id)));
        Action::Notify(format!("Deleting entry {id}..."), NotifyLevel::Info)
    }

    fn heading(&self) -> String {
        let mut title = "Content Calendar".to_string();
        if let Some(date) = self.date {
            title.push_str(&format!(" · {date}"));
        }
        if let Some(status) = self.list.filter_value() {
            title.push_str(&format!(" · {status}"));
        }
        title
    }

    fn start_workflow(&self, ctx: &mut Context) -> Action {
        let Some(id) = self.list.table().selected_id() else {
            return Action::Notify("No entry selected".to_string(), NotifyLevel::Warn);
        };
        ctx.request(
            START_WORKFLOW,
            Request::post(endpoints::workflow_start_by_id(&id)),
        );
        Action::Notify(format!("Starting workflow for entry {id}..."), NotifyLevel::Info)
    }
}

impl Default for CalendarPage {
    fn default() -> Self {
        Self::new()
    }
}

impl PageModule for CalendarPage {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn on_page_inactive(&mut self, _ctx: &mut Context) -> Result<()> {
        self.confirm_delete = None;
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn on_response(&mut self, key: &str, result: ApiResult, ctx: &mut Context) -> Result<()> {
        if key == DELETE {
            match result {
                Ok(_) => {
                    ctx.notify("Entry deleted successfully", NotifyLevel::Info);
                    self.fetch(ctx);
                }
                Err(err) => ctx.notify(format!("Failed to delete: {err}"), NotifyLevel::Error),
            }
            return Ok(());
        }
        if key != START_WORKFLOW {
            self.list.accept(key, result, ctx);
            return Ok(());
        }
        match result {
            Ok(body) => {
                let session = field_text(&body, &["session_id", "id"]);
                let text = if session.is_empty() {
                    "Workflow started".to_string()
                } else {
                    format!("Workflow started (session {session})")
                };
                ctx.notify(text, NotifyLevel::Info);
                self.fetch(ctx);
            }
            Err(err) => ctx.notify(format!("Failed to start workflow: {err}"), NotifyLevel::Error),
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        if key.code != KeyCode::Char('X') {
            self.confirm_delete = None;
        }
        match key.code {
            KeyCode::Char('w') => self.start_workflow(ctx),
            KeyCode::Char('f') => self.cycle_status(),
            KeyCode::Char('/') => {
                Action::OpenPrompt(PromptKind::Page("Date (YYYY-MM-DD, empty clears)"))
            }
            KeyCode::Char('X') => self.delete_selected(ctx),
            _ => self.list.handle_list_key(key),
        }
    }

    fn on_input(&mut self, text: &str, ctx: &mut Context) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            self.date = None;
        } else {
            match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                Ok(date) => self.date = Some(date),
                Err(_) => {
                    ctx.notify(format!("Not a date: {text}"), NotifyLevel::Warn);
                    return Ok(());
                }
            }
        }
        self.fetch(ctx);
        Ok(())
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &Context) {
        self.list.draw_titled(frame, area, &self.heading());
    }

    fn export_table(&self) -> Option<Table> {
        Some(self.list.table().to_table("calendar"))
    }
}
