//! Dashboard module - overview panels for the default page

use std::collections::BTreeMap;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use serde_json::Value;

use super::records::{extract_rows, key_values, render_key_values, Column, RecordTable};
use crate::core::{parse_readiness, Action, Context, NotifyLevel, PageId, PageModule, Table};
use crate::infrastructure::api::{endpoints, ApiResult, Request};

const TODAY: &str = "today";
const TRACKING: &str = "tracking";
const PENDING: &str = "pending";
const METRICS: &str = "metrics";
const READY: &str = "ready";
const SCHEDULER: &str = "scheduler";
const TRIGGER: &str = "trigger";

const TODAY_COLUMNS: &[Column] = &[
    Column { title: "Time", fields: &["time", "scheduled_time"], width: 15 },
    Column { title: "Platform", fields: &["platform", "post_type"], width: 20 },
    Column { title: "Topic", fields: &["topic", "title"], width: 45 },
    Column { title: "Status", fields: &["status"], width: 20 },
];

/// Headline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub scheduled_today: usize,
    pub published: usize,
    pub pending: usize,
    pub workflows: u64,
}

pub struct Dashboard {
    stats: Stats,
    today: RecordTable,
    readiness: Option<BTreeMap<String, bool>>,
    scheduler: Option<Value>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            stats: Stats::default(),
            today: RecordTable::new(TODAY_COLUMNS),
            readiness: None,
            scheduler: None,
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    fn fetch(&mut self, ctx: &mut Context) {
        self.today.mark_loading();
        ctx.request(TODAY, Request::get(endpoints::CALENDAR_TODAY));
        ctx.request(TRACKING, Request::get(endpoints::TRACKING));
        ctx.request(PENDING, Request::get(endpoints::APPROVALS_PENDING));
        ctx.request(METRICS, Request::get(endpoints::METRICS));
        ctx.request(READY, Request::get(endpoints::HEALTH_READY));
        ctx.request(SCHEDULER, Request::get(endpoints::SCHEDULER_STATUS));
    }

    fn render_stats(&self, f: &mut Frame, area: Rect, ctx: &Context) {
        let label = Style::default().fg(Color::DarkGray);
        let value = Style::default()
            .fg(Color::LightCyan)
            .add_modifier(Modifier::BOLD);
        // The header badge may be fresher than the last dashboard fetch
        let pending = ctx.pending_approvals.unwrap_or(self.stats.pending);
        let lines = vec![
            Line::from(vec![
                Span::styled("Scheduled today   ", label),
                Span::styled(self.stats.scheduled_today.to_string(), value),
            ]),
            Line::from(vec![
                Span::styled("Published         ", label),
                Span::styled(self.stats.published.to_string(), value),
            ]),
            Line::from(vec![
                Span::styled("Pending approval  ", label),
                Span::styled(pending.to_string(), value),
            ]),
            Line::from(vec![
                Span::styled("Workflows run     ", label),
                Span::styled(self.stats.workflows.to_string(), value),
            ]),
            Line::from(""),
            Line::from(Span::styled("t trigger scheduler · p approvals", label)),
        ];
        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Overview")
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(panel, area);
    }

    fn render_readiness(&self, f: &mut Frame, area: Rect) {
        let lines: Vec<Line> = match &self.readiness {
            None => vec![Line::from(Span::styled(
                "Checking…",
                Style::default().fg(Color::DarkGray),
            ))],
            Some(checks) if checks.is_empty() => vec![Line::from(Span::styled(
                "No readiness checks reported",
                Style::default().fg(Color::DarkGray),
            ))],
            Some(checks) => checks
                .iter()
                .map(|(name, ok)| {
                    let (icon, color) = if *ok { ("●", Color::Green) } else { ("○", Color::Red) };
                    Line::from(vec![
                        Span::styled(format!("{icon} "), Style::default().fg(color)),
                        Span::raw(name.clone()),
                    ])
                })
                .collect(),
        };
        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Readiness")
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(panel, area);
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

fn row_count(result: &ApiResult, keys: &[&str]) -> usize {
    result
        .as_ref()
        .map(|body| extract_rows(body, keys).len())
        .unwrap_or(0)
}

impl PageModule for Dashboard {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn on_response(&mut self, key: &str, result: ApiResult, ctx: &mut Context) -> Result<()> {
        // Counter sources fall back to zero, like the rest of the overview
        match key {
            TODAY => {
                self.stats.scheduled_today = row_count(&result, &["entries", "posts", "data"]);
                match result {
                    Ok(body) => self.today.set_rows(extract_rows(&body, &["entries", "posts", "data"])),
                    Err(err) => self.today.set_error(err.to_string()),
                }
            }
            TRACKING => self.stats.published = row_count(&result, &["posts", "tracking", "data"]),
            PENDING => {
                self.stats.pending = row_count(&result, &["pending", "entries", "data"]);
                if result.is_ok() {
                    ctx.pending_approvals = Some(self.stats.pending);
                }
            }
            METRICS => {
                self.stats.workflows = result
                    .ok()
                    .and_then(|m| m.get("total_workflows").and_then(Value::as_u64))
                    .unwrap_or(0);
            }
            READY => {
                self.readiness = Some(match result {
                    Ok(body) => parse_readiness(&body),
                    Err(err) => {
                        tracing::warn!(error = %err, "readiness probe failed");
                        BTreeMap::new()
                    }
                });
            }
            SCHEDULER => self.scheduler = result.ok(),
            TRIGGER => match result {
                Ok(_) => {
                    ctx.notify("Scheduler triggered", NotifyLevel::Info);
                    ctx.request(SCHEDULER, Request::get(endpoints::SCHEDULER_STATUS));
                }
                Err(err) => {
                    ctx.notify(format!("Failed to trigger scheduler: {err}"), NotifyLevel::Error)
                }
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        if self.today.handle_nav_key(key) {
            return Action::None;
        }
        match key.code {
            KeyCode::Char('t') => {
                ctx.request(TRIGGER, Request::post(endpoints::SCHEDULER_TRIGGER));
                Action::Notify("Triggering scheduler...".to_string(), NotifyLevel::Info)
            }
            KeyCode::Char('p') => Action::Navigate(PageId::Approvals),
            KeyCode::Char('y') => self.today.copy_selected(),
            _ => Action::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        // 2x2 grid
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let top_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);

        let bottom_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(chunks[1]);

        self.render_stats(frame, top_chunks[0], ctx);
        self.render_readiness(frame, top_chunks[1]);
        let scheduler = self.scheduler.as_ref().map(key_values).unwrap_or_default();
        render_key_values(frame, bottom_chunks[0], "Scheduler", &scheduler);
        self.today
            .render(frame, bottom_chunks[1], "Today's Posts", "Nothing scheduled today");
    }

    fn export_table(&self) -> Option<Table> {
        Some(self.today.to_table("today"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api::ApiError;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    #[test]
    fn test_counters_tolerate_failures() {
        let mut dash = Dashboard::new();
        let mut ctx = Context::new();
        dash.on_page_active(&mut ctx).unwrap();
        assert_eq!(ctx.take_outbox().len(), 6);

        dash.on_response(TODAY, Ok(json!([{"topic": "a"}, {"topic": "b"}])), &mut ctx)
            .unwrap();
        dash.on_response(TRACKING, Err(ApiError::Timeout), &mut ctx).unwrap();
        dash.on_response(PENDING, Ok(json!([{"id": 1}])), &mut ctx).unwrap();
        dash.on_response(METRICS, Ok(json!({"total_workflows": 9})), &mut ctx).unwrap();

        assert_eq!(
            dash.stats(),
            Stats {
                scheduled_today: 2,
                published: 0,
                pending: 1,
                workflows: 9
            }
        );
        assert_eq!(ctx.pending_approvals, Some(1));
        assert!(ctx.take_notices().is_empty());
    }

    #[test]
    fn test_keys() {
        let mut dash = Dashboard::new();
        let mut ctx = Context::new();
        assert_eq!(
            dash.handle_key(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::NONE), &mut ctx),
            Action::Navigate(PageId::Approvals)
        );
        dash.handle_key(KeyEvent::new(KeyCode::Char('t'), KeyModifiers::NONE), &mut ctx);
        let out = ctx.take_outbox();
        assert_eq!(out[0].request.path, endpoints::SCHEDULER_TRIGGER);
    }
}
