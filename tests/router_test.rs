//! Router lifecycle tests: deferred activation, fault isolation, history and
//! stale-response handling

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Result};
use serde_json::json;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use socdash::core::{Action, Context, Fault, Hook, PageId, PageModule, Router};
use socdash::infrastructure::api::{ApiResult, Request};

type Log = Rc<RefCell<Vec<String>>>;

/// Module that records every lifecycle call it receives
struct Recorder {
    name: &'static str,
    log: Log,
    fail_activate: bool,
    fail_deactivate: bool,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_activate: false,
            fail_deactivate: false,
        }
    }

    fn push(&self, event: &str) {
        self.log.borrow_mut().push(format!("{}-{}", self.name, event));
    }
}

impl PageModule for Recorder {
    fn on_page_active(&mut self, ctx: &mut Context) -> Result<()> {
        self.push("active");
        ctx.request("load", Request::get(format!("/api/{}", self.name)));
        if self.fail_activate {
            bail!("boom");
        }
        Ok(())
    }

    fn on_page_inactive(&mut self, _ctx: &mut Context) -> Result<()> {
        self.push("inactive");
        if self.fail_deactivate {
            bail!("teardown failed");
        }
        Ok(())
    }

    fn on_response(&mut self, key: &str, _result: ApiResult, _ctx: &mut Context) -> Result<()> {
        self.push(&format!("response:{key}"));
        Ok(())
    }
}

fn router_with(log: &Log, faults: &Rc<RefCell<Vec<Fault>>>) -> Router {
    let sink = faults.clone();
    let mut router = Router::new().with_fault_hook(move |fault| sink.borrow_mut().push(fault.clone()));
    router.register(PageId::Calendar, Box::new(Recorder::new("calendar", log)));
    router.register(PageId::Approvals, Box::new(Recorder::new("approvals", log)));
    router
}

fn fixture() -> (Router, Context, Log, Rc<RefCell<Vec<Fault>>>) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let faults = Rc::new(RefCell::new(Vec::new()));
    let router = router_with(&log, &faults);
    (router, Context::new(), log, faults)
}

#[test]
fn test_only_last_of_rapid_navigations_activates() {
    let (mut router, mut ctx, log, _) = fixture();

    router.navigate_to(PageId::Calendar, &mut ctx);
    router.navigate_to(PageId::Approvals, &mut ctx);
    assert!(log.borrow().is_empty());

    assert!(router.settle(&mut ctx));
    assert_eq!(*log.borrow(), vec!["approvals-active".to_string()]);
    assert_eq!(router.current(), &PageId::Approvals);
    assert_eq!(router.header(), ("Pending Approvals", "Home / Approvals"));
    assert!(!router.settle(&mut ctx));
}

#[test]
fn test_outgoing_deactivates_before_incoming_activates() {
    let (mut router, mut ctx, log, _) = fixture();

    router.navigate_to(PageId::Calendar, &mut ctx);
    router.settle(&mut ctx);
    router.navigate_to(PageId::Approvals, &mut ctx);
    router.settle(&mut ctx);

    assert_eq!(
        *log.borrow(),
        vec!["calendar-active", "calendar-inactive", "approvals-active"]
    );
    let calendar = router.lifecycle(&PageId::Calendar).unwrap();
    assert!(calendar.initialized && !calendar.active);
}

#[test]
fn test_exactly_one_section_visible() {
    let (mut router, mut ctx, _, _) = fixture();

    for page in [PageId::Calendar, PageId::Tasks, PageId::Approvals] {
        router.navigate_to(page.clone(), &mut ctx);
        router.settle(&mut ctx);
        assert_eq!(router.visible_sections(), vec![page]);
    }
}

#[test]
fn test_same_page_twice_keeps_visible_state() {
    let (mut router, mut ctx, _, _) = fixture();

    router.navigate_to(PageId::Calendar, &mut ctx);
    router.settle(&mut ctx);
    let before = (router.visible_sections(), router.header());

    router.navigate_to(PageId::Calendar, &mut ctx);
    router.settle(&mut ctx);
    assert_eq!((router.visible_sections(), router.header()), before);
    assert!(router.lifecycle(&PageId::Calendar).unwrap().active);
}

#[test]
fn test_failing_activate_is_reported_once_and_navigation_continues() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let faults = Rc::new(RefCell::new(Vec::new()));
    let mut router = router_with(&log, &faults);
    let mut failing = Recorder::new("tasks", &log);
    failing.fail_activate = true;
    failing.fail_deactivate = true;
    router.register(PageId::Tasks, Box::new(failing));
    let mut ctx = Context::new();

    router.navigate_to(PageId::Tasks, &mut ctx);
    router.settle(&mut ctx);
    assert_eq!(faults.borrow().len(), 1);
    assert_eq!(faults.borrow()[0].hook, Hook::Activate);
    assert_eq!(
        faults.borrow()[0].to_string(),
        "error in tasks.on_page_active(): boom"
    );
    assert!(router.is_visible(&PageId::Tasks));

    router.navigate_to(PageId::Calendar, &mut ctx);
    router.settle(&mut ctx);
    assert_eq!(faults.borrow().len(), 2);
    assert_eq!(faults.borrow()[1].hook, Hook::Deactivate);
    assert_eq!(router.current(), &PageId::Calendar);
    assert!(log.borrow().ends_with(&["calendar-active".to_string()]));
}

#[test]
fn test_unknown_page_shows_no_section() {
    let (mut router, mut ctx, log, faults) = fixture();

    router.navigate_to(PageId::Calendar, &mut ctx);
    router.settle(&mut ctx);
    router.navigate_to(PageId::from("nowhere"), &mut ctx);
    router.settle(&mut ctx);

    assert!(router.visible_sections().is_empty());
    assert_eq!(router.header(), ("Dashboard", "Home"));
    assert_eq!(router.location().fragment(), "nowhere");
    assert!(router.current_module().is_none());
    assert!(faults.borrow().is_empty());
    assert_eq!(log.borrow().last().map(String::as_str), Some("calendar-inactive"));
}

#[test]
fn test_page_without_module_still_becomes_visible() {
    let (mut router, mut ctx, log, _) = fixture();

    router.navigate_to(PageId::Reports, &mut ctx);
    router.settle(&mut ctx);
    assert_eq!(router.visible_sections(), vec![PageId::Reports]);
    assert!(log.borrow().is_empty());
    assert!(!router.refresh_active(&mut ctx));
}

#[test]
fn test_back_and_forward_follow_history() {
    let (mut router, mut ctx, _, _) = fixture();

    router.seed_location("");
    router.follow_location(&mut ctx);
    router.settle(&mut ctx);
    assert_eq!(router.current(), &PageId::Dashboard);

    router.navigate_to(PageId::Calendar, &mut ctx);
    router.settle(&mut ctx);
    router.navigate_to(PageId::Approvals, &mut ctx);
    router.settle(&mut ctx);

    assert!(router.back(&mut ctx));
    router.settle(&mut ctx);
    assert_eq!(router.current(), &PageId::Calendar);

    assert!(router.forward(&mut ctx));
    router.settle(&mut ctx);
    assert_eq!(router.current(), &PageId::Approvals);
    assert!(!router.forward(&mut ctx));
}

#[test]
fn test_response_after_navigation_is_dropped() {
    let (mut router, mut ctx, log, _) = fixture();

    router.navigate_to(PageId::Calendar, &mut ctx);
    router.settle(&mut ctx);
    let first = ctx.take_outbox().remove(0);
    let origin = first.origin.clone().unwrap();
    assert_eq!(origin.page, PageId::Calendar);

    router.navigate_to(PageId::Approvals, &mut ctx);
    router.settle(&mut ctx);
    router.navigate_to(PageId::Calendar, &mut ctx);
    router.settle(&mut ctx);

    // Issued by the first activation; the page has been re-activated since
    assert!(!router.deliver(&origin, &first.key, Ok(json!([])), &mut ctx));

    let fresh = ctx
        .take_outbox()
        .into_iter()
        .rev()
        .find(|out| out.origin.as_ref().map(|o| &o.page) == Some(&PageId::Calendar))
        .unwrap();
    assert!(router.deliver(fresh.origin.as_ref().unwrap(), &fresh.key, Ok(json!([])), &mut ctx));
    assert_eq!(log.borrow().last().map(String::as_str), Some("calendar-response:load"));
}

/// Indexes into data it never loaded
struct Panicky {
    rows: Vec<String>,
}

impl PageModule for Panicky {
    fn on_page_active(&mut self, _ctx: &mut Context) -> Result<()> {
        let _ = self.rows[0].len();
        Ok(())
    }

    fn handle_key(&mut self, _key: KeyEvent, _ctx: &mut Context) -> Action {
        let _ = self.rows[1].len();
        Action::Quit
    }
}

#[test]
fn test_panicking_hooks_become_faults() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let faults = Rc::new(RefCell::new(Vec::new()));
    let mut router = router_with(&log, &faults);
    router.register(PageId::Tasks, Box::new(Panicky { rows: Vec::new() }));
    let mut ctx = Context::new();

    router.navigate_to(PageId::Tasks, &mut ctx);
    assert!(router.settle(&mut ctx));
    assert_eq!(faults.borrow().len(), 1);
    assert_eq!(faults.borrow()[0].hook, Hook::Activate);
    assert!(faults.borrow()[0].message.starts_with("panicked: index out of bounds"));
    assert!(router.is_visible(&PageId::Tasks));

    let action = router.handle_key(KeyEvent::new(KeyCode::Char('z'), KeyModifiers::NONE), &mut ctx);
    assert_eq!(action, Action::None);
    assert_eq!(faults.borrow()[1].hook, Hook::Key);

    // Requests made after a caught panic carry no stale origin
    ctx.request("badge", Request::get("/api/alerts/count"));
    assert!(ctx.take_outbox()[0].origin.is_none());

    router.navigate_to(PageId::Calendar, &mut ctx);
    router.settle(&mut ctx);
    assert_eq!(router.current(), &PageId::Calendar);
    assert_eq!(*log.borrow(), vec!["calendar-active".to_string()]);
}

struct A;

impl PageModule for A {}

#[test]
fn test_default_module_then_recorder() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let faults = Rc::new(RefCell::new(Vec::new()));
    let sink = faults.clone();
    let mut router = Router::new().with_fault_hook(move |fault| sink.borrow_mut().push(fault.clone()));
    let (a, b) = (PageId::from("A"), PageId::from("B"));
    router.register(a.clone(), Box::new(A));
    router.register(b.clone(), Box::new(Recorder::new("B", &log)));
    let mut ctx = Context::new();

    router.navigate_to(a.clone(), &mut ctx);
    router.settle(&mut ctx);
    assert_eq!(router.current(), &a);
    router.navigate_to(b.clone(), &mut ctx);
    router.settle(&mut ctx);

    assert_eq!(*log.borrow(), vec!["B-active".to_string()]);
    assert_eq!(router.current(), &b);
    assert_eq!(router.visible_sections(), vec![b]);
    assert!(faults.borrow().is_empty());
}
