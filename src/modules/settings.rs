//! Settings: connection details and read-only backend configuration

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use serde_json::Value;

use super::records::{humanize, key_values, render_key_values, scalar_text};
use crate::core::{Action, Context, PageModule, PromptKind};
use crate::infrastructure::api::{endpoints, ApiResult, Request};

const CONFIG: &str = "config";
const SCHEDULER: &str = "scheduler";
const DB_STATS: &str = "db_stats";
const LIVE: &str = "live";

/// Scalars one level down, as `Calendar total` style labels
pub fn nested_pairs(value: &Value) -> Vec<(String, String)> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };
    let mut pairs = Vec::new();
    for (section, inner) in map {
        match inner.as_object() {
            Some(fields) => {
                for (field, v) in fields.iter().filter(|(_, v)| !v.is_object() && !v.is_array()) {
                    pairs.push((format!("{} {}", humanize(section), field.replace('_', " ")), scalar_text(v)));
                }
            }
            None if !inner.is_array() => pairs.push((humanize(section), scalar_text(inner))),
            None => {}
        }
    }
    pairs
}

#[derive(Default)]
pub struct SettingsPage {
    config: Option<Value>,
    scheduler: Option<Value>,
    db_stats: Option<Value>,
    live: Option<bool>,
}

impl SettingsPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn fetch(&mut self, ctx: &mut Context) {
        ctx.request(CONFIG, Request::get(endpoints::CONFIG));
        ctx.request(SCHEDULER, Request::get(endpoints::SCHEDULER_STATUS));
        ctx.request(DB_STATS, Request::get(endpoints::DB_STATS));
        ctx.request(LIVE, Request::get(endpoints::HEALTH_LIVE));
    }
}

impl PageModule for SettingsPage {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn on_response(&mut self, key: &str, result: ApiResult, _ctx: &mut Context) -> Result<()> {
        // Each panel degrades on its own
        if let Err(err) = &result {
            tracing::warn!(panel = key, error = %err, "settings panel unavailable");
        }
        match key {
            CONFIG => self.config = result.ok(),
            SCHEDULER => self.scheduler = result.ok(),
            DB_STATS => self.db_stats = result.ok(),
            LIVE => self.live = Some(result.is_ok()),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, _ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Char('u') => Action::OpenPrompt(PromptKind::BaseUrl),
            KeyCode::Char('k') => Action::OpenPrompt(PromptKind::ApiKey),
            _ => Action::None,
        }
    }

    fn render(&self, f: &mut Frame, area: Rect, ctx: &Context) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(5)])
            .split(area);
        let label = Style::default().fg(Color::DarkGray);

        let live = match self.live {
            Some(true) => Span::styled("reachable", Style::default().fg(Color::Green)),
            Some(false) => Span::styled("unreachable", Style::default().fg(Color::Red)),
            None => Span::styled("…", label),
        };
        let connection = Paragraph::new(vec![
            Line::from(vec![Span::styled("API base URL: ", label), Span::raw(ctx.api_base.clone())]),
            Line::from(vec![
                Span::styled("API key:      ", label),
                Span::raw(if ctx.api_key_set { "configured" } else { "not set" }),
            ]),
            Line::from(vec![Span::styled("Liveness:     ", label), live]),
            Line::from(Span::styled("u edit URL · k edit key", label)),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Connection")
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(connection, rows[0]);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ])
            .split(rows[1]);
        let config = self.config.as_ref().map(key_values).unwrap_or_default();
        let scheduler = self.scheduler.as_ref().map(key_values).unwrap_or_default();
        let db = self.db_stats.as_ref().map(nested_pairs).unwrap_or_default();
        render_key_values(f, panels[0], "Backend Config", &config);
        render_key_values(f, panels[1], "Scheduler", &scheduler);
        render_key_values(f, panels[2], "Database", &db);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api::ApiError;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    #[test]
    fn test_nested_pairs() {
        let pairs = nested_pairs(&json!({
            "calendar": {"total": 12, "by_status": {"draft": 2}},
            "size_mb": 3,
        }));
        assert_eq!(
            pairs,
            vec![
                ("Calendar total".to_string(), "12".to_string()),
                ("Size mb".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_edit_keys_open_prompts() {
        let mut page = SettingsPage::new();
        let mut ctx = Context::new();
        assert_eq!(
            page.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::NONE), &mut ctx),
            Action::OpenPrompt(PromptKind::BaseUrl)
        );
        assert_eq!(
            page.handle_key(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE), &mut ctx),
            Action::OpenPrompt(PromptKind::ApiKey)
        );
    }

    #[test]
    fn test_failed_panel_does_not_notify() {
        let mut page = SettingsPage::new();
        let mut ctx = Context::new();
        page.on_response(LIVE, Err(ApiError::Timeout), &mut ctx).unwrap();
        page.on_response(CONFIG, Ok(json!({"model": "x"})), &mut ctx).unwrap();
        assert_eq!(page.live, Some(false));
        assert!(page.config.is_some());
        assert!(ctx.take_notices().is_empty());
    }
}
