//! Shared context passed to modules

use serde_json::Value;

use super::{HealthState, NotifyLevel, PageId};
use crate::infrastructure::api::Request;

/// Which module activation a request was made from.
///
/// Responses are only delivered back while the same activation is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub page: PageId,
    pub epoch: u64,
}

/// A request queued by a module or the app, not yet handed to the runtime
#[derive(Debug, Clone)]
pub struct Outgoing {
    /// `None` for app-level (cross-cutting) requests
    pub origin: Option<Origin>,
    /// Handler key echoed back with the response
    pub key: String,
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub level: NotifyLevel,
}

/// The daily workflow run. It is started app-side, so its session survives
/// leaving the workflow page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowRun {
    pub session_id: Option<String>,
    pub running: bool,
    /// Body of the last run-daily response
    pub result: Option<Value>,
}

/// Shared context available to all modules
#[derive(Debug, Default)]
pub struct Context {
    /// Header health indicator
    pub health: HealthState,

    /// Pending approval count for the header badge
    pub pending_approvals: Option<usize>,

    /// Active alert count for the notification badge
    pub active_alerts: Option<usize>,

    /// Backend base address for display
    pub api_base: String,

    /// Whether an API key is configured
    pub api_key_set: bool,

    pub workflow: WorkflowRun,

    origin: Option<Origin>,
    outbox: Vec<Outgoing>,
    notices: Vec<Notice>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a backend request; the response comes back to the caller's
    /// `on_response` with the same key
    pub fn request(&mut self, key: impl Into<String>, request: Request) {
        self.outbox.push(Outgoing {
            origin: self.origin.clone(),
            key: key.into(),
            request,
        });
    }

    pub fn notify(&mut self, text: impl Into<String>, level: NotifyLevel) {
        self.notices.push(Notice {
            text: text.into(),
            level,
        });
    }

    /// Origin that requests are currently tagged with
    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub(crate) fn enter(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }

    pub(crate) fn leave(&mut self) {
        self.origin = None;
    }

    pub fn take_outbox(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.outbox)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outbox.is_empty()
    }
}
