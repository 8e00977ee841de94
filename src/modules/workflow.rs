//! Workflow runs: trigger the daily workflow and follow its session.
//!
//! The run itself is app-level (`Context::workflow`); this page shows it and
//! polls the session status.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use serde_json::Value;

use super::records::{field_text, key_values, render_key_values};
use crate::core::{Action, Command, Context, NotifyLevel, PageModule};
use crate::infrastructure::api::{endpoints, ApiResult, Request};

const STATUS: &str = "status";

#[derive(Default)]
pub struct WorkflowPage {
    status: Option<Value>,
}

impl WorkflowPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_status(&mut self, ctx: &mut Context) -> Action {
        match ctx.workflow.session_id.clone() {
            Some(id) => {
                ctx.request(STATUS, Request::get(endpoints::workflow_status(&id)));
                Action::Notify("Checking status...".to_string(), NotifyLevel::Info)
            }
            None => Action::Notify(
                "No workflow session yet; press r to run the daily workflow".to_string(),
                NotifyLevel::Warn,
            ),
        }
    }
}

impl PageModule for WorkflowPage {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        if let Some(id) = ctx.workflow.session_id.clone() {
            ctx.request(STATUS, Request::get(endpoints::workflow_status(&id)));
        }
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Context) -> Result<()> {
        self.on_page_active(ctx)
    }

    fn on_response(&mut self, key: &str, result: ApiResult, ctx: &mut Context) -> Result<()> {
        if key == STATUS {
            match result {
                Ok(body) => self.status = Some(body),
                Err(err) => ctx.notify(format!("Failed to get status: {err}"), NotifyLevel::Error),
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Char('r') => Action::Execute(Command::RunDaily),
            KeyCode::Char('s') => self.check_status(ctx),
            _ => Action::None,
        }
    }

    fn render(&self, f: &mut Frame, area: Rect, ctx: &Context) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(5)])
            .split(area);

        let run = &ctx.workflow;
        let latest = self.status.as_ref().or(run.result.as_ref());
        let (state, color) = match latest.map(|s| field_text(s, &["status"])) {
            _ if run.running => ("running".to_string(), Color::Yellow),
            Some(s) if s == "completed" || s == "success" => (s, Color::Green),
            Some(s) if s == "failed" || s == "error" => (s, Color::Red),
            Some(s) if !s.is_empty() => (s, Color::Cyan),
            _ => ("idle".to_string(), Color::DarkGray),
        };
        let step = latest
            .map(|s| field_text(s, &["current_step"]))
            .unwrap_or_default();
        let lines = vec![
            Line::from(vec![
                Span::styled("Session: ", Style::default().fg(Color::DarkGray)),
                Span::raw(run.session_id.clone().unwrap_or_else(|| "N/A".to_string())),
            ]),
            Line::from(vec![
                Span::styled("Status:  ", Style::default().fg(Color::DarkGray)),
                Span::styled(state, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(if step.is_empty() { String::new() } else { format!("  ({step})") }),
            ]),
            Line::from(Span::styled(
                "r run daily · s check status",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let header = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Workflow")
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(header, chunks[0]);

        let detail = latest.map(key_values).unwrap_or_default();
        render_key_values(f, chunks[1], "Last Result", &detail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_run_key_defers_to_app_command() {
        let mut page = WorkflowPage::new();
        let mut ctx = Context::new();
        assert_eq!(page.handle_key(key('r'), &mut ctx), Action::Execute(Command::RunDaily));
        assert!(!ctx.has_outgoing());
    }

    #[test]
    fn test_status_follows_shared_session() {
        let mut page = WorkflowPage::new();
        let mut ctx = Context::new();

        let before = page.handle_key(key('s'), &mut ctx);
        assert!(matches!(before, Action::Notify(_, NotifyLevel::Warn)));
        page.on_page_active(&mut ctx).unwrap();
        assert!(!ctx.has_outgoing());

        ctx.workflow.session_id = Some("abc".to_string());
        page.on_page_active(&mut ctx).unwrap();
        assert_eq!(ctx.take_outbox()[0].request.path, "/api/workflow/status/abc");

        page.handle_key(key('s'), &mut ctx);
        let out = ctx.take_outbox();
        assert_eq!(out[0].key, STATUS);
        page.on_response(STATUS, Ok(json!({"status": "completed"})), &mut ctx)
            .unwrap();
        assert_eq!(page.status, Some(json!({"status": "completed"})));
    }
}
