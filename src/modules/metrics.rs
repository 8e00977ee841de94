//! Engagement metrics: backend summary, per-post table and totals

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use serde_json::Value;

use super::lists::{ListPage, Source};
use super::records::{key_values, render_key_values, Column};
use crate::core::{Action, Context, NotifyLevel, PageModule, Table};
use crate::infrastructure::api::{endpoints, ApiResult, Request};
use crate::ui::widgets::MiniSparkline;

const SUMMARY: &str = "summary";
const REFRESH: &str = "refresh_metrics";

const SOURCES: &[Source] = &[Source {
    path: endpoints::METRICS_POSTS,
    collection_keys: &["posts", "data"],
}];

const COLUMNS: &[Column] = &[
    Column { title: "Post", fields: &["media_id", "id"], width: 22 },
    Column { title: "Type", fields: &["media_type", "post_kind"], width: 14 },
    Column { title: "Reach", fields: &["reach"], width: 12 },
    Column { title: "Likes", fields: &["likes", "like_count"], width: 12 },
    Column { title: "Comments", fields: &["comments", "comments_count"], width: 12 },
    Column { title: "Saved", fields: &["saved", "saved_count"], width: 12 },
    Column { title: "Engagement", fields: &["engagement_rate"], width: 16 },
];

/// Sums over the post list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub views: u64,
    pub reach: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub saved: u64,
}

fn count(post: &Value, fields: &[&str]) -> u64 {
    fields
        .iter()
        .filter_map(|f| post.get(*f))
        .find_map(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0)
}

impl Totals {
    pub fn from_posts(posts: &[Value]) -> Self {
        posts.iter().fold(Self::default(), |mut t, post| {
            t.views += count(post, &["views", "impressions"]);
            t.reach += count(post, &["reach"]);
            t.likes += count(post, &["likes", "like_count"]);
            t.comments += count(post, &["comments", "comments_count"]);
            t.shares += count(post, &["shares", "shares_count"]);
            t.saved += count(post, &["saved", "saved_count"]);
            t
        })
    }
}

pub fn likes_series(posts: &[Value]) -> Vec<u64> {
    posts.iter().map(|p| count(p, &["likes", "like_count"])).collect()
}

pub struct MetricsPage {
    posts: ListPage,
    summary: Option<Value>,
}

impl MetricsPage {
    pub fn new() -> Self {
        Self {
            posts: ListPage::new("metrics", "Post Metrics", "No metrics yet", SOURCES, COLUMNS),
            summary: None,
        }
    }

    fn fetch(&mut self, ctx: &mut Context) {
        ctx.request(SUMMARY, Request::get(endpoints::METRICS));
        self.posts.fetch(ctx);
    }

    pub fn totals(&self) -> Totals {
        Totals::from_posts(self.posts.table().rows())
    }
}

impl Default for MetricsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl PageModule for MetricsPage {
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
            // The summary is optional; the page still works from the post list
            SUMMARY => match result {
                Ok(body) => self.summary = Some(body),
                Err(err) => tracing::warn!(error = %err, "metrics summary unavailable"),
            },
            REFRESH => match result {
                Ok(_) => {
                    ctx.notify("Metrics refresh initiated", NotifyLevel::Info);
                    self.fetch(ctx);
                }
                Err(err) => ctx.notify(format!("Failed to refresh metrics: {err}"), NotifyLevel::Error),
            },
            _ => {
                self.posts.accept(key, result, ctx);
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Char('m') => {
                ctx.request(REFRESH, Request::post(endpoints::METRICS_REFRESH));
                Action::Notify("Refreshing metrics from the platform...".to_string(), NotifyLevel::Info)
            }
            _ => self.posts.handle_list_key(key),
        }
    }

    fn render(&self, f: &mut Frame, area: Rect, _ctx: &Context) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Length(7), Constraint::Min(5)])
            .split(area);

        let t = self.totals();
        let label = Style::default().fg(Color::DarkGray);
        let totals = Line::from(vec![
            Span::styled("Views ", label),
            Span::raw(format!("{}  ", t.views)),
            Span::styled("Reach ", label),
            Span::raw(format!("{}  ", t.reach)),
            Span::styled("Likes ", label),
            Span::raw(format!("{}  ", t.likes)),
            Span::styled("Comments ", label),
            Span::raw(format!("{}  ", t.comments)),
            Span::styled("Shares ", label),
            Span::raw(format!("{}  ", t.shares)),
            Span::styled("Saved ", label),
            Span::raw(t.saved.to_string()),
        ]);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Totals")
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(chunks[0]);
        f.render_widget(block, chunks[0]);
        f.render_widget(Paragraph::new(totals), Rect { height: 1, ..inner });
        if inner.height > 1 {
            let series = likes_series(self.posts.table().rows());
            let spark_area = Rect {
                y: inner.y + 1,
                height: 1,
                ..inner
            };
            f.render_widget(MiniSparkline::new(&series), spark_area);
        }

        let pairs = self.summary.as_ref().map(key_values).unwrap_or_default();
        render_key_values(f, chunks[1], "Summary", &pairs);
        self.posts.draw(f, chunks[2]);
    }

    fn export_table(&self) -> Option<Table> {
        Some(self.posts.table().to_table("metrics"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api::ApiError;
    use serde_json::json;

    #[test]
    fn test_totals_use_field_fallbacks() {
        let posts = vec![
            json!({"likes": 10, "reach": 100, "impressions": 150}),
            json!({"like_count": 5, "reach": 40, "views": 60, "comments_count": 2, "saved": 1.0}),
        ];
        let totals = Totals::from_posts(&posts);
        assert_eq!(totals.likes, 15);
        assert_eq!(totals.reach, 140);
        assert_eq!(totals.views, 210);
        assert_eq!(totals.comments, 2);
        assert_eq!(totals.saved, 1);
        assert_eq!(likes_series(&posts), vec![10, 5]);
    }

    #[test]
    fn test_summary_failure_keeps_posts() {
        let mut page = MetricsPage::new();
        let mut ctx = Context::new();
        page.on_page_active(&mut ctx).unwrap();
        assert_eq!(ctx.take_outbox().len(), 2);

        page.on_response(SUMMARY, Err(ApiError::Timeout), &mut ctx).unwrap();
        page.on_response(endpoints::METRICS_POSTS, Ok(json!([{"likes": 3}])), &mut ctx)
            .unwrap();
        assert_eq!(page.totals().likes, 3);
        assert!(ctx.take_notices().is_empty());
    }
}
