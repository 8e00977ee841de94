//! Analytics report: backend-computed summary, recommendations, best times

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use serde_json::Value;

use super::records::{extract_rows, field_text, key_values, render_key_values};
use crate::core::{Action, Context, NotifyLevel, PageModule, Table};
use crate::infrastructure::api::{endpoints, ApiResult, Request};

const REPORT: &str = "report";
const BEST_TIMES: &str = "best_times";

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub label: String,
    pub engagement: f64,
}

/// Slots of `/api/analytics/best-times`, best first as the backend sends them
pub fn parse_best_times(body: &Value) -> Vec<Slot> {
    extract_rows(body, &["best_times", "time_slots"])
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let label = match slot.get("hour").and_then(Value::as_u64) {
                Some(hour) => format!("{:02}:00", hour),
                None => {
                    let text = field_text(slot, &["day_of_week", "label"]);
                    if text.is_empty() {
                        format!("Slot {}", i + 1)
                    } else {
                        text
                    }
                }
            };
            let engagement = ["avg_engagement_rate", "engagement_rate", "count"]
                .iter()
                .find_map(|k| slot.get(*k).and_then(Value::as_f64))
                .unwrap_or(0.0);
            Slot { label, engagement }
        })
        .collect()
}

#[derive(Default)]
pub struct AnalyticsPage {
    report: Option<Value>,
    slots: Vec<Slot>,
}

impl AnalyticsPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn fetch(&mut self, ctx: &mut Context) {
        ctx.request(REPORT, Request::get(endpoints::ANALYTICS_REPORT));
        ctx.request(BEST_TIMES, Request::get(endpoints::ANALYTICS_BEST_TIMES));
    }

    fn recommendations(&self) -> Vec<Line<'static>> {
        let recs = self
            .report
            .as_ref()
            .map(|r| extract_rows(r, &["recommendations"]))
            .unwrap_or_default();
        if recs.is_empty() {
            return vec![Line::from(Span::styled(
                "Publish content to generate recommendations",
                Style::default().fg(Color::DarkGray),
            ))];
        }
        recs.iter()
            .map(|rec| {
                let priority = field_text(rec, &["priority"]);
                let color = match priority.as_str() {
                    "high" => Color::Red,
                    "medium" => Color::Yellow,
                    _ => Color::Green,
                };
                Line::from(vec![
                    Span::styled(format!("[{:<6}] ", priority), Style::default().fg(color)),
                    Span::styled(
                        field_text(rec, &["title"]),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("  {}", field_text(rec, &["description"]))),
                ])
            })
            .collect()
    }
}

impl PageModule for AnalyticsPage {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Context) -> Result<()> {
        self.fetch(ctx);
        Ok(())
    }

    fn on_response(&mut self, key: &str, result: ApiResult, ctx: &mut Context) -> Result<()> {
        match (key, result) {
            (REPORT, Ok(body)) => self.report = Some(body),
            (REPORT, Err(err)) => {
                ctx.notify(format!("Failed to load analytics: {err}"), NotifyLevel::Error)
            }
            (BEST_TIMES, Ok(body)) => self.slots = parse_best_times(&body),
            (BEST_TIMES, Err(err)) => tracing::warn!(error = %err, "best times unavailable"),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, _key: KeyEvent, _ctx: &mut Context) -> Action {
        Action::None
    }

    fn render(&self, f: &mut Frame, area: Rect, _ctx: &Context) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[0]);

        let summary = self
            .report
            .as_ref()
            .and_then(|r| r.get("summary"))
            .map(key_values)
            .unwrap_or_default();
        render_key_values(f, top[0], "Summary", &summary);

        let max = self.slots.iter().map(|s| s.engagement).fold(1.0_f64, f64::max);
        let slot_lines: Vec<Line> = if self.slots.is_empty() {
            vec![Line::from(Span::styled(
                "No posting time data available yet",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.slots
                .iter()
                .enumerate()
                .map(|(i, slot)| {
                    let width = ((slot.engagement / max) * 20.0).round() as usize;
                    let style = if i == 0 {
                        Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    Line::from(vec![
                        Span::styled(format!("{:<10}", slot.label), style),
                        Span::styled("█".repeat(width), Style::default().fg(Color::Cyan)),
                        Span::raw(format!(" {:.2}", slot.engagement)),
                    ])
                })
                .collect()
        };
        let best = Paragraph::new(slot_lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Best Times")
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(best, top[1]);

        let recs = Paragraph::new(self.recommendations())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Recommendations")
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(recs, rows[1]);
    }

    fn export_table(&self) -> Option<Table> {
        Some(Table {
            name: "best-times".to_string(),
            headers: vec!["Slot".to_string(), "Engagement".to_string()],
            rows: self
                .slots
                .iter()
                .map(|s| vec![s.label.clone(), format!("{:.2}", s.engagement)])
                .collect(),
            raw: self
                .slots
                .iter()
                .map(|s| serde_json::json!({"slot": s.label, "engagement": s.engagement}))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_best_times_labels() {
        let slots = parse_best_times(&json!({"best_times": [
            {"hour": 9, "avg_engagement_rate": 4.5},
            {"day_of_week": "Friday", "count": 3},
            {}
        ]}));
        assert_eq!(slots[0], Slot { label: "09:00".into(), engagement: 4.5 });
        assert_eq!(slots[1], Slot { label: "Friday".into(), engagement: 3.0 });
        assert_eq!(slots[2].label, "Slot 3");
    }

    #[test]
    fn test_report_failure_notifies() {
        let mut page = AnalyticsPage::new();
        let mut ctx = Context::new();
        page.on_page_active(&mut ctx).unwrap();
        assert_eq!(ctx.take_outbox().len(), 2);
        page.on_response(
            REPORT,
            Err(crate::infrastructure::api::ApiError::Status { status: 500, body: String::new() }),
            &mut ctx,
        )
        .unwrap();
        let notices = ctx.take_notices();
        assert_eq!(notices[0].text, "Failed to load analytics: HTTP error! status: 500");
    }
}
