//! Page router and module lifecycle manager
//!
//! Navigation runs in two steps. `navigate_to` deactivates the outgoing
//! module, switches the visible section and updates the location and header
//! synchronously. Activation of the incoming module is queued and runs in
//! `settle`, which the event loop calls after the new page has been drawn.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::Frame;

use super::{Action, Context, Location, Origin, PageId, PageModule};
use crate::infrastructure::api::ApiResult;

/// Lifecycle hook that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Init,
    Activate,
    Deactivate,
    Refresh,
    Response,
    Key,
    Input,
    Render,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hook::Init => "init()",
            Hook::Activate => "on_page_active()",
            Hook::Deactivate => "on_page_inactive()",
            Hook::Refresh => "refresh()",
            Hook::Response => "on_response()",
            Hook::Key => "handle_key()",
            Hook::Input => "on_input()",
            Hook::Render => "render()",
        };
        f.write_str(name)
    }
}

/// A module callback failure, isolated to one page
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error in {page}.{hook}: {message}")]
pub struct Fault {
    pub page: PageId,
    pub hook: Hook,
    pub message: String,
}

pub type FaultHook = Box<dyn FnMut(&Fault)>;

/// Snapshot of a registered module's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleState {
    pub initialized: bool,
    pub active: bool,
    pub epoch: u64,
}

struct Slot {
    module: Box<dyn PageModule>,
    initialized: bool,
    active: bool,
    epoch: u64,
}

pub struct Router {
    slots: HashMap<PageId, Slot>,
    /// Section visibility; at most one entry is true
    sections: BTreeMap<PageId, bool>,
    current: PageId,
    pending: Option<PageId>,
    location: Location,
    title: &'static str,
    breadcrumb: &'static str,
    epochs: u64,
    on_fault: FaultHook,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            sections: PageId::KNOWN.iter().map(|page| (page.clone(), false)).collect(),
            current: PageId::Dashboard,
            pending: None,
            location: Location::default(),
            title: PageId::Dashboard.title(),
            breadcrumb: "Home",
            epochs: 0,
            on_fault: Box::new(log_fault),
        }
    }

    /// Replace the fault reporter (default: `tracing::error!`)
    pub fn with_fault_hook(mut self, hook: impl FnMut(&Fault) + 'static) -> Self {
        self.on_fault = Box::new(hook);
        self
    }

    /// Register a module for a page, replacing any previous one
    pub fn register(
        &mut self,
        page: PageId,
        module: Box<dyn PageModule>,
    ) -> Option<Box<dyn PageModule>> {
        self.sections.entry(page.clone()).or_insert(false);
        let previous = self.slots.insert(
            page,
            Slot {
                module,
                initialized: false,
                active: false,
                epoch: 0,
            },
        );
        previous.map(|slot| slot.module)
    }

    pub fn is_registered(&self, page: &PageId) -> bool {
        self.slots.contains_key(page)
    }

    pub fn current(&self) -> &PageId {
        &self.current
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Header title and breadcrumb for the current page
    pub fn header(&self) -> (&'static str, &'static str) {
        (self.title, self.breadcrumb)
    }

    pub fn has_pending_activation(&self) -> bool {
        self.pending.is_some()
    }

    pub fn lifecycle(&self, page: &PageId) -> Option<LifecycleState> {
        self.slots.get(page).map(|slot| LifecycleState {
            initialized: slot.initialized,
            active: slot.active,
            epoch: slot.epoch,
        })
    }

    pub fn is_visible(&self, page: &PageId) -> bool {
        self.sections.get(page).copied().unwrap_or(false)
    }

    pub fn visible_sections(&self) -> Vec<PageId> {
        self.sections
            .iter()
            .filter(|(_, visible)| **visible)
            .map(|(page, _)| page.clone())
            .collect()
    }

    /// Module for the current page, if one is registered
    pub fn current_module(&self) -> Option<&dyn PageModule> {
        self.slots.get(&self.current).map(|slot| slot.module.as_ref())
    }

    /// Draw the current module if its section is visible. Returns false when
    /// there is nothing to draw. A panic comes back as the fault instead of
    /// unwinding through the frame; drawing runs every frame, so it is not
    /// sent to the fault hook.
    pub fn render_active(&self, f: &mut Frame, area: Rect, ctx: &Context) -> Result<bool, Fault> {
        let Some(module) = self.current_module() else {
            return Ok(false);
        };
        if !self.is_visible(&self.current) {
            return Ok(false);
        }
        guarded(|| {
            module.render(f, area, ctx);
            Ok(true)
        })
        .map_err(|err| Fault {
            page: self.current.clone(),
            hook: Hook::Render,
            message: format!("{err:#}"),
        })
    }

    pub fn navigate_to(&mut self, page: PageId, ctx: &mut Context) {
        tracing::debug!(from = %self.current, to = %page, "navigating");

        // An activation that never ran leaves its module inactive, so there
        // is nothing to undo for it.
        self.pending = None;
        self.deactivate_current(ctx);

        self.current = page.clone();
        self.location.set(page.as_str());
        self.show_only(&page);
        self.title = page.title();
        self.breadcrumb = page.breadcrumb();
        self.pending = Some(page);
    }

    /// Run the queued activation, if any. Returns true if one was pending.
    pub fn settle(&mut self, ctx: &mut Context) -> bool {
        let Some(page) = self.pending.take() else {
            return false;
        };
        self.epochs += 1;
        let epoch = self.epochs;
        let Some(slot) = self.slots.get_mut(&page) else {
            return true;
        };

        slot.active = true;
        slot.epoch = epoch;
        ctx.enter(Origin {
            page: page.clone(),
            epoch,
        });
        let mut failure = None;
        if !slot.initialized {
            match guarded(|| slot.module.init(ctx)) {
                Ok(()) => slot.initialized = true,
                Err(err) => failure = Some((Hook::Init, err)),
            }
        }
        if failure.is_none() {
            if let Err(err) = guarded(|| slot.module.on_page_active(ctx)) {
                failure = Some((Hook::Activate, err));
            }
        }
        ctx.leave();

        if let Some((hook, err)) = failure {
            self.report(page, hook, err);
        }
        true
    }

    /// Navigate to whatever the location fragment names (empty means dashboard)
    pub fn follow_location(&mut self, ctx: &mut Context) {
        let fragment = self.location.fragment();
        let page = if fragment.is_empty() {
            self.location.replace(PageId::Dashboard.as_str());
            PageId::Dashboard
        } else {
            PageId::from(fragment)
        };
        self.navigate_to(page, ctx);
    }

    /// Seed the location before the first navigation
    pub fn seed_location(&mut self, fragment: &str) {
        self.location.replace(fragment);
    }

    pub fn back(&mut self, ctx: &mut Context) -> bool {
        match self.location.back().map(PageId::from) {
            Some(page) => {
                self.navigate_to(page, ctx);
                true
            }
            None => false,
        }
    }

    pub fn forward(&mut self, ctx: &mut Context) -> bool {
        match self.location.forward().map(PageId::from) {
            Some(page) => {
                self.navigate_to(page, ctx);
                true
            }
            None => false,
        }
    }

    /// Ask the active module to re-fetch. Returns false if no module is active.
    pub fn refresh_active(&mut self, ctx: &mut Context) -> bool {
        let page = self.current.clone();
        let Some(slot) = self.slots.get_mut(&page) else {
            return false;
        };
        if !slot.active {
            return false;
        }
        ctx.enter(Origin {
            page: page.clone(),
            epoch: slot.epoch,
        });
        let result = guarded(|| slot.module.refresh(ctx));
        ctx.leave();
        if let Err(err) = result {
            self.report(page, Hook::Refresh, err);
        }
        true
    }

    /// Hand a response to the module that asked for it. Responses for an
    /// activation that has since ended are dropped; returns whether the
    /// response was delivered.
    pub fn deliver(
        &mut self,
        origin: &Origin,
        key: &str,
        result: ApiResult,
        ctx: &mut Context,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(&origin.page) else {
            return false;
        };
        if !slot.active || slot.epoch != origin.epoch {
            tracing::debug!(page = %origin.page, key, "dropping stale response");
            return false;
        }
        ctx.enter(origin.clone());
        let outcome = guarded(|| slot.module.on_response(key, result, ctx));
        ctx.leave();
        if let Err(err) = outcome {
            self.report(origin.page.clone(), Hook::Response, err);
        }
        true
    }

    /// Route a key press to the active module
    pub fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        let page = self.current.clone();
        let Some(slot) = self.slots.get_mut(&page) else {
            return Action::None;
        };
        if !slot.active {
            return Action::None;
        }
        ctx.enter(Origin {
            page: page.clone(),
            epoch: slot.epoch,
        });
        let outcome = guarded(|| Ok(slot.module.handle_key(key, ctx)));
        ctx.leave();
        match outcome {
            Ok(action) => action,
            Err(err) => {
                self.report(page, Hook::Key, err);
                Action::None
            }
        }
    }

    /// Hand prompt text to the active module. Returns false if none is active.
    pub fn submit_input(&mut self, text: &str, ctx: &mut Context) -> bool {
        let page = self.current.clone();
        let Some(slot) = self.slots.get_mut(&page) else {
            return false;
        };
        if !slot.active {
            return false;
        }
        ctx.enter(Origin {
            page: page.clone(),
            epoch: slot.epoch,
        });
        let result = guarded(|| slot.module.on_input(text, ctx));
        ctx.leave();
        if let Err(err) = result {
            self.report(page, Hook::Input, err);
        }
        true
    }

    fn deactivate_current(&mut self, ctx: &mut Context) {
        let page = self.current.clone();
        let Some(slot) = self.slots.get_mut(&page) else {
            return;
        };
        if !slot.active {
            return;
        }
        slot.active = false;
        ctx.enter(Origin {
            page: page.clone(),
            epoch: slot.epoch,
        });
        let result = guarded(|| slot.module.on_page_inactive(ctx));
        ctx.leave();
        if let Err(err) = result {
            self.report(page, Hook::Deactivate, err);
        }
    }

    fn show_only(&mut self, page: &PageId) {
        for visible in self.sections.values_mut() {
            *visible = false;
        }
        match self.sections.get_mut(page) {
            Some(visible) => *visible = true,
            None => tracing::warn!(page = %page, "no section for page"),
        }
    }

    fn report(&mut self, page: PageId, hook: Hook, err: anyhow::Error) {
        let fault = Fault {
            page,
            hook,
            message: format!("{err:#}"),
        };
        (self.on_fault)(&fault);
    }
}

/// Run a module hook, turning a panic into an error so it is reported like
/// any other failure
fn guarded<T>(hook: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn log_fault(fault: &Fault) {
    tracing::error!(page = %fault.page, hook = %fault.hook, error = %fault.message, "page module failed");
}
