//! Application state: router, shared context, input modes and the request
//! ledger that pairs runtime results with whoever asked for them

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::{self, ApiSettings, Config};
use crate::core::{
    parse_command, Action, Command, Context, ExportFormat, Fault, HealthState, NotifyLevel,
    Origin, PageId, PromptKind, Router,
};
use crate::infrastructure::api::{endpoints, ApiResult, Request};
use crate::infrastructure::runtime::{Batch, Job, RuntimeEvent, Tick};
use crate::modules::alerts::parse_alert_count;
use crate::modules::approvals::{decision_request, revision_notice, Decision};
use crate::modules::{export, records, register_all};

const STATUS_TTL: Duration = Duration::from_secs(4);
const ERROR_STATUS_TTL: Duration = Duration::from_secs(8);

// Keys of app-level requests
const PROBE_HEALTH: &str = "probe.health";
const APPROVALS_COUNT: &str = "approvals.count";
const ALERTS_COUNT: &str = "alerts.count";
const COMMAND_APPROVE: &str = "command.approve";
const COMMAND_REJECT: &str = "command.reject";
const COMMAND_REVISE: &str = "command.revise";
const COMMAND_DISMISS: &str = "command.dismiss";
const COMMAND_DISMISS_ALL: &str = "command.dismiss_all";
const COMMAND_RUN_DAILY: &str = "command.run_daily";
const COMMAND_TRIGGER: &str = "command.trigger";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
    Prompt(PromptKind),
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: NotifyLevel,
    pub since: Instant,
}

/// Who a dispatched request belongs to
#[derive(Debug, Clone)]
struct Ticket {
    origin: Option<Origin>,
    key: String,
}

pub struct App {
    pub router: Router,
    pub ctx: Context,
    pub settings: ApiSettings,
    pub config: Config,
    /// Write settings edits back to config.toml
    pub persist_config: bool,

    pub input_mode: InputMode,
    pub command: CommandBar,
    pub status: Option<StatusMessage>,
    pub help_open: bool,
    pub should_quit: bool,

    faults: Rc<RefCell<Vec<Fault>>>,
    tickets: HashMap<u64, Ticket>,
    next_ticket: u64,
    next_batch: u64,
    batches: Vec<Batch>,
    backend_swap: Option<ApiSettings>,
}

impl App {
    pub fn new(settings: ApiSettings, config: Config) -> Self {
        let faults: Rc<RefCell<Vec<Fault>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = faults.clone();
        let mut router = Router::new().with_fault_hook(move |fault: &Fault| {
            tracing::error!(page = %fault.page, hook = %fault.hook, error = %fault.message, "page module failed");
            sink.borrow_mut().push(fault.clone());
        });
        register_all(&mut router);

        let mut ctx = Context::new();
        ctx.api_base = settings.base_url.clone();
        ctx.api_key_set = settings.api_key.is_some();

        Self {
            router,
            ctx,
            settings,
            config,
            persist_config: false,
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            status: None,
            help_open: false,
            should_quit: false,
            faults,
            tickets: HashMap::new(),
            next_ticket: 1,
            next_batch: 1,
            batches: Vec::new(),
            backend_swap: None,
        }
    }

    /// Follow the initial location (empty means dashboard) and load the
    /// header badges
    pub fn start(&mut self, initial: Option<&str>) {
        self.router.seed_location(initial.unwrap_or(""));
        self.router.follow_location(&mut self.ctx);
        self.ctx
            .request(APPROVALS_COUNT, Request::get(endpoints::APPROVALS_PENDING));
        self.ctx
            .request(ALERTS_COUNT, Request::get(endpoints::ALERTS_COUNT));
        self.collect(false);
    }

    pub fn navigate(&mut self, page: PageId) {
        self.router.navigate_to(page, &mut self.ctx);
    }

    /// Called after every draw: run a queued activation, then flush what it
    /// produced
    pub fn on_frame(&mut self) {
        self.router.settle(&mut self.ctx);
        self.collect(false);
        self.expire_status();
    }

    /// Turn queued requests into one batch and surface notices and faults
    pub fn collect(&mut self, announce: bool) {
        let outgoing = self.ctx.take_outbox();
        if !outgoing.is_empty() {
            let jobs = outgoing
                .into_iter()
                .map(|out| {
                    let ticket = self.next_ticket;
                    self.next_ticket += 1;
                    self.tickets.insert(
                        ticket,
                        Ticket {
                            origin: out.origin,
                            key: out.key,
                        },
                    );
                    Job {
                        ticket,
                        request: out.request,
                    }
                })
                .collect();
            let id = self.next_batch;
            self.next_batch += 1;
            self.batches.push(Batch { id, jobs, announce });
        }

        for notice in self.ctx.take_notices() {
            self.set_status(notice.text, notice.level);
        }
        let faults: Vec<Fault> = self.faults.borrow_mut().drain(..).collect();
        for fault in faults {
            self.set_status(fault.to_string(), NotifyLevel::Error);
        }
    }

    pub fn take_batches(&mut self) -> Vec<Batch> {
        std::mem::take(&mut self.batches)
    }

    /// Hand queued batches to `send`. A batch that can't be sent gives up its
    /// tickets, since no result will ever come back for them.
    pub fn dispatch_batches(&mut self, mut send: impl FnMut(Batch) -> anyhow::Result<()>) {
        for batch in self.take_batches() {
            let tickets: Vec<u64> = batch.jobs.iter().map(|job| job.ticket).collect();
            let id = batch.id;
            if let Err(err) = send(batch) {
                tracing::warn!(batch = id, jobs = tickets.len(), error = %err, "batch not dispatched");
                self.release_tickets(&tickets);
                self.set_status(err.to_string(), NotifyLevel::Error);
            }
        }
    }

    /// Settings the runtime should switch its backend to
    pub fn take_backend_swap(&mut self) -> Option<ApiSettings> {
        self.backend_swap.take()
    }

    pub fn in_flight(&self) -> usize {
        self.tickets.len()
    }

    /// Forget tickets of a batch that never reached the runtime
    pub fn release_tickets(&mut self, tickets: &[u64]) {
        for ticket in tickets {
            if let Some(Ticket { key, .. }) = self.tickets.remove(ticket) {
                if key == COMMAND_RUN_DAILY {
                    self.ctx.workflow.running = false;
                }
            }
        }
    }

    pub fn apply_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Fetched { ticket, result } => {
                let Some(Ticket { origin, key }) = self.tickets.remove(&ticket) else {
                    tracing::debug!(ticket, "result for unknown ticket");
                    return;
                };
                match origin {
                    Some(origin) => {
                        self.router.deliver(&origin, &key, result, &mut self.ctx);
                    }
                    None => self.on_app_response(&key, result),
                }
            }
            RuntimeEvent::BatchSettled {
                succeeded,
                failed,
                announce,
                ..
            } => {
                if announce {
                    let level = if failed > 0 {
                        NotifyLevel::Warn
                    } else {
                        NotifyLevel::Info
                    };
                    self.set_status(format!("Refreshed: {succeeded} ok, {failed} failed"), level);
                }
            }
            RuntimeEvent::Health(state) => self.ctx.health = state,
            RuntimeEvent::Tick(tick) => self.on_tick(tick),
            RuntimeEvent::Error { message } => self.set_status(message, NotifyLevel::Error),
        }
        self.collect(false);
    }

    /// Refresh-loop tick, acting on the page that is current right now
    fn on_tick(&mut self, tick: Tick) {
        match tick {
            Tick::Warmup => {
                self.ctx
                    .request(ALERTS_COUNT, Request::get(endpoints::ALERTS_COUNT));
            }
            Tick::Interval(n) => {
                tracing::debug!(tick = n, page = %self.router.current(), "interval refresh");
                self.router.refresh_active(&mut self.ctx);
                self.ctx
                    .request(APPROVALS_COUNT, Request::get(endpoints::APPROVALS_PENDING));
                self.ctx
                    .request(ALERTS_COUNT, Request::get(endpoints::ALERTS_COUNT));
            }
        }
    }

    /// Manual "refresh all": one announced batch
    pub fn refresh_all(&mut self) {
        self.set_status("Refreshing all data...", NotifyLevel::Info);
        self.ctx
            .request(PROBE_HEALTH, Request::get(endpoints::HEALTH));
        self.router.refresh_active(&mut self.ctx);
        self.ctx
            .request(APPROVALS_COUNT, Request::get(endpoints::APPROVALS_PENDING));
        self.ctx
            .request(ALERTS_COUNT, Request::get(endpoints::ALERTS_COUNT));
        self.collect(true);
    }

    fn on_app_response(&mut self, key: &str, result: ApiResult) {
        match key {
            PROBE_HEALTH => self.ctx.health = HealthState::from_probe(&result),
            APPROVALS_COUNT => match result {
                Ok(body) => {
                    let pending = records::extract_rows(&body, &["pending", "entries", "data"]);
                    self.ctx.pending_approvals = Some(pending.len());
                }
                Err(err) => tracing::warn!(error = %err, "approval count unavailable"),
            },
            ALERTS_COUNT => match result {
                Ok(body) => self.ctx.active_alerts = parse_alert_count(&body),
                Err(err) => tracing::warn!(error = %err, "alert count unavailable"),
            },
            COMMAND_RUN_DAILY => self.on_daily_run(result),
            COMMAND_REVISE => match result {
                Ok(body) => {
                    self.set_status(revision_notice(&body), NotifyLevel::Info);
                    self.refresh_if_current(PageId::Approvals);
                }
                Err(err) => {
                    self.set_status(format!("Failed to submit revision: {err}"), NotifyLevel::Error)
                }
            },
            _ => self.on_command_response(key, result),
        }
    }

    fn refresh_if_current(&mut self, page: PageId) {
        if *self.router.current() == page {
            self.router.refresh_active(&mut self.ctx);
        }
    }

    fn on_daily_run(&mut self, result: ApiResult) {
        self.ctx.workflow.running = false;
        match result {
            Ok(body) => {
                let session = records::field_text(&body, &["session_id"]);
                if !session.is_empty() {
                    tracing::info!(session = %session, "daily workflow started");
                    self.ctx.workflow.session_id = Some(session);
                }
                self.ctx.workflow.result = Some(body);
                self.set_status("Daily workflow started!", NotifyLevel::Info);
                self.refresh_if_current(PageId::Workflow);
            }
            Err(err) => {
                self.set_status(format!("Failed to run daily workflow: {err}"), NotifyLevel::Error)
            }
        }
    }

    fn on_command_response(&mut self, key: &str, result: ApiResult) {
        let (done, failed, page) = match key {
            COMMAND_APPROVE => ("Post approved", "Approval failed", PageId::Approvals),
            COMMAND_REJECT => ("Post rejected", "Rejection failed", PageId::Approvals),
            COMMAND_DISMISS => ("Alert dismissed", "Failed to dismiss", PageId::Alerts),
            COMMAND_DISMISS_ALL => ("All alerts dismissed", "Failed to dismiss", PageId::Alerts),
            COMMAND_TRIGGER => ("Scheduler triggered", "Failed to trigger scheduler", PageId::Dashboard),
            other => {
                tracing::debug!(key = other, "unhandled app response");
                return;
            }
        };
        match result {
            Ok(_) => {
                self.set_status(done, NotifyLevel::Info);
                self.refresh_if_current(page.clone());
                if page == PageId::Approvals {
                    self.ctx
                        .request(APPROVALS_COUNT, Request::get(endpoints::APPROVALS_PENDING));
                }
                if page == PageId::Alerts {
                    self.ctx
                        .request(ALERTS_COUNT, Request::get(endpoints::ALERTS_COUNT));
                }
            }
            Err(err) => self.set_status(format!("{failed}: {err}"), NotifyLevel::Error),
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: NotifyLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, NotifyLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    fn expire_status(&mut self) {
        if let Some(status) = self.status.as_ref() {
            let ttl = match status.level {
                NotifyLevel::Error => ERROR_STATUS_TTL,
                _ => STATUS_TTL,
            };
            if status.since.elapsed() > ttl {
                self.status = None;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.help_open {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
                self.help_open = false;
            }
            return;
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Command => self.handle_command_key(key),
            InputMode::Prompt(kind) => self.handle_prompt_key(key, kind),
        }
        self.collect(false);
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let action = match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => Action::Quit,
            KeyCode::Char('r') if ctrl => Action::RefreshAll,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('?') => {
                self.help_open = true;
                Action::None
            }
            KeyCode::Char(':') => Action::OpenCommand(None),
            KeyCode::Char('R') => Action::RefreshAll,
            KeyCode::Tab => Action::Navigate(self.router.current().cycle(true)),
            KeyCode::BackTab => Action::Navigate(self.router.current().cycle(false)),
            KeyCode::Char('[') | KeyCode::Backspace => Action::Back,
            KeyCode::Char(']') => Action::Forward,
            KeyCode::Char('n') => Action::Navigate(PageId::Alerts),
            KeyCode::Char('e') => Action::Export(ExportFormat::Csv),
            KeyCode::Char('E') => Action::Export(ExportFormat::Json),
            KeyCode::Char(c) if c.is_ascii_digit() => match PageId::from_shortcut(c) {
                Some(page) => Action::Navigate(page),
                None => Action::None,
            },
            _ => self.router.handle_key(key, &mut self.ctx),
        };
        self.apply_action(action);
    }

    fn handle_command_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.exit_command(),
            KeyCode::Enter => self.apply_command(),
            KeyCode::Up => {
                if let Some(last) = self.command.last.clone() {
                    self.command.input = last;
                }
            }
            KeyCode::Backspace => {
                self.command.input.pop();
            }
            KeyCode::Char(ch) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return;
                }
                self.command.input.push(ch);
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent, kind: PromptKind) {
        match key.code {
            KeyCode::Esc => self.exit_prompt(),
            KeyCode::Enter => self.apply_prompt(kind),
            KeyCode::Backspace => {
                self.command.input.pop();
            }
            KeyCode::Char(ch) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return;
                }
                self.command.input.push(ch);
            }
            _ => {}
        }
    }

    pub fn enter_command(&mut self, prefill: Option<String>) {
        self.input_mode = InputMode::Command;
        self.command.input = prefill.unwrap_or_default();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn enter_prompt(&mut self, kind: PromptKind) {
        self.input_mode = InputMode::Prompt(kind);
        self.command.input = match kind {
            PromptKind::BaseUrl => self.settings.base_url.clone(),
            PromptKind::ApiKey | PromptKind::Page(_) => String::new(),
        };
    }

    pub fn exit_prompt(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        if input.is_empty() {
            self.exit_command();
            return;
        }
        let cmd = parse_command(&input);
        self.command.last = Some(input);
        self.exit_command();
        let action = self.execute_command(&cmd);
        self.apply_action(action);
    }

    pub fn apply_prompt(&mut self, kind: PromptKind) {
        let input = self.command.input.trim().to_string();
        self.exit_prompt();
        match kind {
            PromptKind::BaseUrl if input.is_empty() => {
                self.set_status("Base URL cannot be empty", NotifyLevel::Warn)
            }
            PromptKind::BaseUrl => self.update_settings(Some(input), None),
            // An empty key clears it
            PromptKind::ApiKey => self.update_settings(None, Some(input)),
            PromptKind::Page(_) => {
                self.router.submit_input(&input, &mut self.ctx);
            }
        }
    }

    fn update_settings(&mut self, base_url: Option<String>, api_key: Option<String>) {
        if let Some(url) = base_url {
            self.settings.base_url = config::normalize_base_url(&url);
            self.config.api_base_url = Some(self.settings.base_url.clone());
        }
        if let Some(key) = api_key {
            let key = Some(key).filter(|k| !k.is_empty());
            self.settings.api_key = key.clone();
            self.config.api_key = key;
        }
        self.ctx.api_base = self.settings.base_url.clone();
        self.ctx.api_key_set = self.settings.api_key.is_some();
        self.ctx.health = HealthState::Unknown;
        self.backend_swap = Some(self.settings.clone());
        tracing::info!(base_url = %self.settings.base_url, key = %self.settings.masked_key(), "backend settings changed");

        let saved = if self.persist_config {
            match config::save(&self.config) {
                Ok(path) => format!(", saved to {}", path.display()),
                Err(err) => {
                    tracing::warn!(error = %format!("{err:#}"), "config not saved");
                    format!(", not saved: {err}")
                }
            }
        } else {
            String::new()
        };
        self.set_status(
            format!("Backend set to {}{}", self.settings.base_url, saved),
            NotifyLevel::Info,
        );
        self.ctx
            .request(PROBE_HEALTH, Request::get(endpoints::HEALTH));
        self.router.refresh_active(&mut self.ctx);
    }

    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Go(page) => Action::Navigate(page.clone()),
            Command::Back => Action::Back,
            Command::Forward => Action::Forward,
            Command::Refresh => Action::RefreshAll,
            Command::Url(url) => {
                self.update_settings(Some(url.clone()), None);
                Action::None
            }
            Command::Key(key) => {
                self.update_settings(None, Some(key.clone()));
                Action::None
            }
            Command::Approve(id) => {
                self.ctx
                    .request(COMMAND_APPROVE, decision_request(id, &Decision::Approve));
                Action::Notify(format!("Approving entry {id}..."), NotifyLevel::Info)
            }
            Command::Reject { id, feedback } => {
                self.ctx.request(
                    COMMAND_REJECT,
                    decision_request(
                        id,
                        &Decision::Reject {
                            feedback: feedback.clone(),
                        },
                    ),
                );
                Action::Notify(format!("Rejecting entry {id}..."), NotifyLevel::Info)
            }
            Command::Revise { id, feedback } => {
                self.ctx.request(
                    COMMAND_REVISE,
                    decision_request(
                        id,
                        &Decision::Revise {
                            feedback: feedback.clone(),
                        },
                    ),
                );
                Action::Notify(format!("Revising entry {id}..."), NotifyLevel::Info)
            }
            Command::Dismiss(id) => {
                self.ctx
                    .request(COMMAND_DISMISS, Request::post(endpoints::alert_dismiss(id)));
                Action::None
            }
            Command::DismissAll => {
                self.ctx
                    .request(COMMAND_DISMISS_ALL, Request::post(endpoints::ALERTS_DISMISS_ALL));
                Action::None
            }
            Command::RunDaily if self.ctx.workflow.running => {
                Action::Notify("Daily workflow already running".to_string(), NotifyLevel::Warn)
            }
            Command::RunDaily => {
                self.ctx.workflow.running = true;
                self.ctx
                    .request(COMMAND_RUN_DAILY, Request::post(endpoints::WORKFLOW_RUN_DAILY));
                Action::Notify("Running daily workflow...".to_string(), NotifyLevel::Info)
            }
            Command::Trigger => {
                self.ctx
                    .request(COMMAND_TRIGGER, Request::post(endpoints::SCHEDULER_TRIGGER));
                Action::Notify("Triggering scheduler...".to_string(), NotifyLevel::Info)
            }
            Command::Export => Action::Export(ExportFormat::Csv),
            Command::Help => {
                self.help_open = true;
                Action::None
            }
            Command::Quit => Action::Quit,
            Command::Unknown(s) => {
                Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn)
            }
        }
    }

    /// Apply an action returned by a command or module
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Navigate(page) => self.navigate(page),
            Action::Back => {
                if !self.router.back(&mut self.ctx) {
                    self.set_status("No earlier page", NotifyLevel::Info);
                }
            }
            Action::Forward => {
                if !self.router.forward(&mut self.ctx) {
                    self.set_status("No later page", NotifyLevel::Info);
                }
            }
            Action::Copy(text) => match copy_to_clipboard(&text) {
                Ok(()) => self.set_status("Copied to clipboard", NotifyLevel::Info),
                Err(err) => self.set_status(format!("Clipboard unavailable: {err}"), NotifyLevel::Warn),
            },
            Action::Notify(text, level) => self.set_status(text, level),
            Action::OpenCommand(prefill) => self.enter_command(prefill),
            Action::OpenPrompt(kind) => self.enter_prompt(kind),
            Action::Execute(cmd) => {
                let next = self.execute_command(&cmd);
                self.apply_action(next);
            }
            Action::RefreshAll => self.refresh_all(),
            Action::Export(format) => {
                let table = self.router.current_module().and_then(|m| m.export_table());
                let outcome = export::export_table(table, format);
                self.apply_action(outcome);
            }
            Action::Quit => self.should_quit = true,
        }
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app() -> App {
        let settings = ApiSettings {
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
        };
        App::new(settings, Config::default())
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_start_defaults_to_dashboard() {
        let mut app = app();
        app.start(None);
        assert_eq!(*app.router.current(), PageId::Dashboard);
        assert_eq!(app.router.location().fragment(), "dashboard");
        assert!(app.router.has_pending_activation());

        let badges = app.take_batches();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].jobs.len(), 2);

        app.on_frame();
        let activation = app.take_batches();
        assert_eq!(activation.len(), 1);
        assert!(!activation[0].announce);
    }

    #[test]
    fn test_refresh_all_is_one_announced_batch() {
        let mut app = app();
        app.start(Some("calendar"));
        app.on_frame();
        app.take_batches();

        press(&mut app, KeyCode::Char('R'));
        assert_eq!(app.status_text(), Some(("Refreshing all data...", NotifyLevel::Info)));
        let batches = app.take_batches();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].announce);
        let paths: Vec<_> = batches[0].jobs.iter().map(|j| j.request.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                endpoints::HEALTH,
                endpoints::CALENDAR,
                endpoints::APPROVALS_PENDING,
                endpoints::ALERTS_COUNT
            ]
        );

        app.apply_event(RuntimeEvent::BatchSettled {
            id: batches[0].id,
            succeeded: 3,
            failed: 1,
            announce: true,
        });
        assert_eq!(app.status_text(), Some(("Refreshed: 3 ok, 1 failed", NotifyLevel::Warn)));
    }

    #[test]
    fn test_app_level_responses_update_badges() {
        let mut app = app();
        app.start(None);
        let batch = app.take_batches().remove(0);
        for job in batch.jobs {
            let result = if job.request.path == endpoints::ALERTS_COUNT {
                Ok(json!({"active_count": 3}))
            } else {
                Ok(json!([{"id": 1}, {"id": 2}]))
            };
            app.apply_event(RuntimeEvent::Fetched {
                ticket: job.ticket,
                result,
            });
        }
        assert_eq!(app.ctx.active_alerts, Some(3));
        assert_eq!(app.ctx.pending_approvals, Some(2));
        assert_eq!(app.in_flight(), 0);
    }

    #[test]
    fn test_command_line_navigation_and_unknown() {
        let mut app = app();
        app.start(None);
        app.on_frame();

        press(&mut app, KeyCode::Char(':'));
        for c in "go reports".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(*app.router.current(), PageId::Reports);
        assert_eq!(app.input_mode, InputMode::Normal);

        app.enter_command(Some("frobnicate".to_string()));
        app.apply_command();
        assert!(matches!(app.status_text(), Some((_, NotifyLevel::Warn))));
    }

    #[test]
    fn test_url_command_swaps_backend() {
        let mut app = app();
        app.start(None);
        app.on_frame();
        app.take_batches();

        let action = app.execute_command(&Command::Url("agent.example.com/".to_string()));
        assert_eq!(action, Action::None);
        assert_eq!(app.ctx.api_base, "http://agent.example.com");
        let swap = app.take_backend_swap().unwrap();
        assert_eq!(swap.base_url, "http://agent.example.com");
        assert_eq!(app.config.api_base_url.as_deref(), Some("http://agent.example.com"));
        assert!(app.take_backend_swap().is_none());
    }

    #[test]
    fn test_failed_dispatch_releases_tickets() {
        let mut app = app();
        app.start(Some("calendar"));
        app.on_frame();
        app.execute_command(&Command::RunDaily);
        app.collect(false);
        assert!(app.ctx.workflow.running);
        assert_eq!(app.in_flight(), 4);

        let mut sent = 0;
        app.dispatch_batches(|_| {
            sent += 1;
            if sent == 1 {
                Ok(())
            } else {
                Err(anyhow::anyhow!("Worker channel closed"))
            }
        });
        // Only the badge batch (two requests) reached the runtime
        assert_eq!(app.in_flight(), 2);
        assert!(!app.ctx.workflow.running);
        assert_eq!(app.status_text(), Some(("Worker channel closed", NotifyLevel::Error)));
        assert!(app.take_batches().is_empty());
    }

    #[test]
    fn test_module_fault_reaches_status_line() {
        struct Broken;
        impl crate::core::PageModule for Broken {
            fn on_page_active(&mut self, _ctx: &mut Context) -> anyhow::Result<()> {
                anyhow::bail!("no data")
            }
        }

        let mut app = app();
        app.router.register(PageId::Tasks, Box::new(Broken));
        app.start(Some("tasks"));
        app.on_frame();
        let (text, level) = app.status_text().unwrap();
        assert_eq!(level, NotifyLevel::Error);
        assert_eq!(text, "error in tasks.on_page_active(): no data");
    }
}
