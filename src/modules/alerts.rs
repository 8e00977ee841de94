//! Alerts (the notification bell), filterable by type and status

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::Frame;
use serde_json::Value;

use super::lists::{ListPage, Source};
use super::records::Column;
use crate::core::{Action, Context, NotifyLevel, PageModule, Table};
use crate::infrastructure::api::{endpoints, ApiResult, Request};

const DISMISS: &str = "dismiss";
const DISMISS_ALL: &str = "dismiss_all";

const SOURCES: &[Source] = &[Source {
    path: endpoints::ALERTS,
    collection_keys: &["alerts", "data"],
}];

const COLUMNS: &[Column] = &[
    Column { title: "ID", fields: &["id", "alert_id"], width: 8 },
    Column { title: "Type", fields: &["alert_type", "type"], width: 16 },
    Column { title: "Severity", fields: &["severity", "level"], width: 10 },
    Column { title: "Message", fields: &["message", "title"], width: 46 },
    Column { title: "Created", fields: &["created_at", "timestamp"], width: 20 },
];

/// `active_count` of `/api/alerts/count` (or `count`)
pub fn parse_alert_count(body: &Value) -> Option<usize> {
    ["active_count", "count"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_u64))
        .map(|n| n as usize)
}

const TYPES: &[Option<&str>] = &[None, Some("error"), Some("warning"), Some("info"), Some("success")];
const STATUSES: &[Option<&str>] = &[Some("active"), Some("dismissed"), None];

/// Next entry after `current`, wrapping
fn cycle(options: &[Option<&'static str>], current: Option<&'static str>) -> Option<&'static str> {
    let idx = options.iter().position(|o| *o == current).unwrap_or(0);
    options[(idx + 1) % options.len()]
}

pub struct AlertsPage {
    list: ListPage,
    alert_type: Option<&'static str>,
    status: Option<&'static str>,
}

impl AlertsPage {
    pub fn new() -> Self {
        Self {
            list: ListPage::new("alerts", "Alerts", "No alerts", SOURCES, COLUMNS),
            alert_type: None,
            status: Some("active"),
        }
    }

    fn fetch(&mut self, ctx: &mut Context) {
        self.list
            .fetch_at(endpoints::alerts(self.alert_type, self.status), ctx);
    }

    /// Only the unfiltered active list matches the bell count
    fn is_default_filter(&self) -> bool {
        self.alert_type.is_none() && self.status == Some("active")
    }

    fn title(&self) -> String {
        format!(
            "Alerts · type: {} · status: {}",
            self.alert_type.unwrap_or("all"),
            self.status.unwrap_or("all")
        )
    }
}

impl Default for AlertsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl PageModule for AlertsPage {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn on_response(&mut self, key: &str, result: ApiResult, ctx: &mut Context) -> Result<()> {
        match key {
            DISMISS | DISMISS_ALL => {
                match result {
                    Ok(_) => {
                        let text = if key == DISMISS { "Alert dismissed" } else { "All alerts dismissed" };
                        ctx.notify(text, NotifyLevel::Info);
                        self.fetch(ctx);
                    }
                    Err(err) => ctx.notify(format!("Failed to dismiss: {err}"), NotifyLevel::Error),
                }
            }
            _ => {
                let ok = result.is_ok();
                self.list.accept(key, result, ctx);
                if ok && self.is_default_filter() {
                    ctx.active_alerts = Some(self.list.table().len());
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Char('d') => match self.list.table().selected_id() {
                Some(id) => {
                    ctx.request(DISMISS, Request::post(endpoints::alert_dismiss(&id)));
                    Action::None
                }
                None => Action::Notify("No alert selected".to_string(), NotifyLevel::Warn),
            },
            KeyCode::Char('D') if self.list.table().is_empty() => {
                Action::Notify("No alerts to dismiss".to_string(), NotifyLevel::Warn)
            }
            KeyCode::Char('D') => {
                ctx.request(DISMISS_ALL, Request::post(endpoints::ALERTS_DISMISS_ALL));
                Action::None
            }
            KeyCode::Char('t') => {
                self.alert_type = cycle(TYPES, self.alert_type);
                self.fetch(ctx);
                Action::None
            }
            KeyCode::Char('s') => {
                self.status = cycle(STATUSES, self.status);
                self.fetch(ctx);
                Action::None
            }
            _ => self.list.handle_list_key(key),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &Context) {
        self.list.draw_titled(frame, area, &self.title());
    }

    fn export_table(&self) -> Option<Table> {
        Some(self.list.table().to_table("alerts"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    #[test]
    fn test_parse_alert_count() {
        assert_eq!(parse_alert_count(&json!({"active_count": 4})), Some(4));
        assert_eq!(parse_alert_count(&json!({"count": 1})), Some(1));
        assert_eq!(parse_alert_count(&json!({})), None);
    }

    #[test]
    fn test_dismiss_selected_then_refetch() {
        let mut page = AlertsPage::new();
        let mut ctx = Context::new();
        page.on_page_active(&mut ctx).unwrap();
        let load = ctx.take_outbox();
        assert_eq!(load[0].request.path, "/api/alerts?status=active");
        page.on_response(
            endpoints::ALERTS,
            Ok(json!({"alerts": [{"id": 31, "message": "quota"}]})),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(ctx.active_alerts, Some(1));

        page.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE), &mut ctx);
        let out = ctx.take_outbox();
        assert_eq!(out[0].request.path, "/api/alerts/31/dismiss");

        page.on_response(DISMISS, Ok(json!({"ok": true})), &mut ctx).unwrap();
        let refetch = ctx.take_outbox();
        assert_eq!(refetch[0].request.path, "/api/alerts?status=active");
    }

    #[test]
    fn test_type_and_status_filters() {
        let mut page = AlertsPage::new();
        let mut ctx = Context::new();
        ctx.active_alerts = Some(4);
        let press = |page: &mut AlertsPage, ctx: &mut Context, c: char| {
            page.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), ctx);
            ctx.take_outbox().remove(0)
        };

        let typed = press(&mut page, &mut ctx, 't');
        assert_eq!(typed.request.path, "/api/alerts?alert_type=error&status=active");
        assert_eq!(typed.key, endpoints::ALERTS);

        let dismissed = press(&mut page, &mut ctx, 's');
        assert_eq!(dismissed.request.path, "/api/alerts?alert_type=error&status=dismissed");
        // A filtered list leaves the bell count alone
        page.on_response(endpoints::ALERTS, Ok(json!([{"id": 1}])), &mut ctx)
            .unwrap();
        assert_eq!(ctx.active_alerts, Some(4));
        assert_eq!(page.title(), "Alerts · type: error · status: dismissed");

        let all = press(&mut page, &mut ctx, 's');
        assert_eq!(all.request.path, "/api/alerts?alert_type=error");
        for _ in 0..4 {
            press(&mut page, &mut ctx, 't');
        }
        let back = press(&mut page, &mut ctx, 's');
        assert_eq!(back.request.path, "/api/alerts?status=active");
    }
}
