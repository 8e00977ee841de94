//! Approval queue: pending posts awaiting a human decision

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::Frame;
use serde_json::{json, Value};

use super::lists::{ListPage, Source};
use super::records::{field_text, Column};
use crate::core::{Action, Context, NotifyLevel, PageModule, PromptKind, Table};
use crate::infrastructure::api::{endpoints, ApiResult, Request};

const DECIDE: &str = "decide";
const REVISE: &str = "revise";

const SOURCES: &[Source] = &[Source {
    path: endpoints::APPROVALS_PENDING,
    collection_keys: &["pending", "entries", "data"],
}];

const COLUMNS: &[Column] = &[
    Column { title: "ID", fields: &["id", "entry_id"], width: 8 },
    Column { title: "Date", fields: &["date", "scheduled_date"], width: 14 },
    Column { title: "Platform", fields: &["platform", "post_type"], width: 12 },
    Column { title: "Topic", fields: &["topic", "title"], width: 26 },
    Column { title: "Caption", fields: &["caption", "generated_caption"], width: 40 },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { feedback: String },
    /// Regenerate the content with this feedback
    Revise { feedback: String },
}

/// Body of `POST /api/approval/action`. Numeric ids are sent as numbers.
pub fn decision_request(entry_id: &str, decision: &Decision) -> Request {
    let id = entry_id
        .trim()
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(entry_id.trim()));
    let body = match decision {
        Decision::Approve => json!({
            "entry_id": id,
            "action": "approve",
            "publish_immediately": true,
        }),
        Decision::Reject { feedback } => json!({
            "entry_id": id,
            "action": "reject",
            "feedback": feedback,
        }),
        Decision::Revise { feedback } => json!({
            "entry_id": id,
            "action": "revise",
            "feedback": feedback,
        }),
    };
    Request::post_json(endpoints::APPROVAL_ACTION, body)
}

/// Status text for a revise response
pub fn revision_notice(body: &Value) -> String {
    if body.get("new_caption").is_some_and(|c| !c.is_null()) {
        return "Content revised successfully! Review the new version.".to_string();
    }
    let message = field_text(body, &["message"]);
    if message.is_empty() {
        "Revision request submitted".to_string()
    } else {
        message
    }
}

pub struct ApprovalsPage {
    list: ListPage,
    /// Entry the open feedback prompt is for
    revising: Option<String>,
}

impl ApprovalsPage {
    pub fn new() -> Self {
        Self {
            list: ListPage::new(
                "approvals",
                "Pending Approvals",
                "Nothing waiting for approval",
                SOURCES,
                COLUMNS,
            ),
            revising: None,
        }
    }
}

impl Default for ApprovalsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl PageModule for ApprovalsPage {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        self.list.fetch(ctx);
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Context) -> Result<()> {
        self.list.fetch(ctx);
        Ok(())
    }

    fn on_response(&mut self, key: &str, result: ApiResult, ctx: &mut Context) -> Result<()> {
        if key == DECIDE {
            match result {
                Ok(_) => {
                    ctx.notify("Approval decision recorded", NotifyLevel::Info);
                    self.list.fetch(ctx);
                }
                Err(err) => ctx.notify(format!("Approval action failed: {err}"), NotifyLevel::Error),
            }
            return Ok(());
        }
        if key == REVISE {
            match result {
                Ok(body) => {
                    ctx.notify(revision_notice(&body), NotifyLevel::Info);
                    self.list.fetch(ctx);
                }
                Err(err) => ctx.notify(format!("Failed to submit revision: {err}"), NotifyLevel::Error),
            }
            return Ok(());
        }

        let ok = result.is_ok();
        self.list.accept(key, result, ctx);
        if ok {
            ctx.pending_approvals = Some(self.list.table().len());
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Char('a') => match self.list.table().selected_id() {
                Some(id) => {
                    ctx.request(DECIDE, decision_request(&id, &Decision::Approve));
                    Action::Notify(format!("Approving entry {id}..."), NotifyLevel::Info)
                }
                None => Action::Notify("No entry selected".to_string(), NotifyLevel::Warn),
            },
            // Prefill the command line so feedback can be typed
            KeyCode::Char('x') => match self.list.table().selected_id() {
                Some(id) => Action::OpenCommand(Some(format!("reject {id} "))),
                None => Action::Notify("No entry selected".to_string(), NotifyLevel::Warn),
            },
            KeyCode::Char('v') => match self.list.table().selected_id() {
                Some(id) => {
                    self.revising = Some(id);
                    Action::OpenPrompt(PromptKind::Page("Revision feedback"))
                }
                None => Action::Notify("No entry selected".to_string(), NotifyLevel::Warn),
            },
            _ => self.list.handle_list_key(key),
        }
    }

    fn on_input(&mut self, text: &str, ctx: &mut Context) -> Result<()> {
        let Some(id) = self.revising.take() else {
            return Ok(());
        };
        let feedback = text.trim();
        if feedback.is_empty() {
            ctx.notify("Please provide revision feedback", NotifyLevel::Warn);
            return Ok(());
        }
        ctx.request(
            REVISE,
            decision_request(
                &id,
                &Decision::Revise {
                    feedback: feedback.to_string(),
                },
            ),
        );
        ctx.notify("Revising content with your feedback...", NotifyLevel::Info);
        Ok(())
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &Context) {
        self.list.draw(frame, area);
    }

    fn export_table(&self) -> Option<Table> {
        Some(self.list.table().to_table("approvals"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_decision_bodies() {
        let approve = decision_request("42", &Decision::Approve);
        assert_eq!(approve.path, endpoints::APPROVAL_ACTION);
        assert_eq!(
            approve.body,
            Some(json!({"entry_id": 42, "action": "approve", "publish_immediately": true}))
        );

        let reject = decision_request(
            "abc",
            &Decision::Reject {
                feedback: "off brand".into(),
            },
        );
        assert_eq!(
            reject.body,
            Some(json!({"entry_id": "abc", "action": "reject", "feedback": "off brand"}))
        );
    }

    #[test]
    fn test_load_updates_badge_and_keys() {
        let mut page = ApprovalsPage::new();
        let mut ctx = Context::new();
        page.on_page_active(&mut ctx).unwrap();
        ctx.take_outbox();
        page.on_response(
            endpoints::APPROVALS_PENDING,
            Ok(json!({"pending": [{"id": 5}, {"id": 6}]})),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(ctx.pending_approvals, Some(2));

        let reject = page.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE), &mut ctx);
        assert_eq!(reject, Action::OpenCommand(Some("reject 5 ".to_string())));

        page.handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE), &mut ctx);
        let out = ctx.take_outbox();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, DECIDE);
    }

    #[test]
    fn test_revision_prompt_sends_feedback() {
        let mut page = ApprovalsPage::new();
        let mut ctx = Context::new();
        page.on_page_active(&mut ctx).unwrap();
        ctx.take_outbox();
        page.on_response(endpoints::APPROVALS_PENDING, Ok(json!([{"id": 8}])), &mut ctx)
            .unwrap();

        let action = page.handle_key(KeyEvent::new(KeyCode::Char('v'), KeyModifiers::NONE), &mut ctx);
        assert_eq!(action, Action::OpenPrompt(PromptKind::Page("Revision feedback")));
        page.on_input("  punchier hook  ", &mut ctx).unwrap();
        let out = ctx.take_outbox();
        assert_eq!(out[0].key, REVISE);
        assert_eq!(
            out[0].request.body,
            Some(json!({"entry_id": 8, "action": "revise", "feedback": "punchier hook"}))
        );

        page.on_response(REVISE, Ok(json!({"new_caption": "Fresh take"})), &mut ctx)
            .unwrap();
        let notices = ctx.take_notices();
        assert_eq!(
            notices.last().map(|n| n.text.as_str()),
            Some("Content revised successfully! Review the new version.")
        );
        // The queue reloads
        assert_eq!(ctx.take_outbox()[0].request.path, endpoints::APPROVALS_PENDING);
    }

    #[test]
    fn test_empty_revision_feedback_warns() {
        let mut page = ApprovalsPage::new();
        let mut ctx = Context::new();
        page.on_response(endpoints::APPROVALS_PENDING, Ok(json!([{"id": 8}])), &mut ctx)
            .unwrap();
        page.handle_key(KeyEvent::new(KeyCode::Char('v'), KeyModifiers::NONE), &mut ctx);
        page.on_input("   ", &mut ctx).unwrap();
        assert!(!ctx.has_outgoing());
        let notices = ctx.take_notices();
        assert_eq!(notices[0].level, NotifyLevel::Warn);
        // A second submit without reopening the prompt does nothing
        page.on_input("late", &mut ctx).unwrap();
        assert!(!ctx.has_outgoing());
    }

    #[test]
    fn test_revision_notice_fallbacks() {
        assert_eq!(revision_notice(&json!({"message": "Queued"})), "Queued");
        assert_eq!(revision_notice(&json!({})), "Revision request submitted");
    }
}
