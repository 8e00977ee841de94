//! Page module trait: the lifecycle contract the router drives

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::Frame;
use serde_json::Value;

use super::{Action, Context};
use crate::infrastructure::api::ApiResult;

/// Tabular snapshot of a page, used by export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Source records, for JSON export
    pub raw: Vec<Value>,
}

/// A page-specific collaborator.
///
/// Every method is optional. The router calls `init` once before the first
/// activation, `on_page_active` each time the page becomes visible and
/// `on_page_inactive` each time it is hidden. Errors and panics are reported
/// by the router and never abort navigation.
pub trait PageModule {
    fn init(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn on_page_active(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn on_page_inactive(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    /// Re-fetch the page's data
    fn refresh(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    /// Response to a request this module queued while active
    fn on_response(&mut self, _key: &str, _result: ApiResult, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    /// Text submitted from a prompt this module opened
    fn on_input(&mut self, _text: &str, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    /// Handle keyboard input
    /// Returns an Action describing what should happen
    fn handle_key(&mut self, _key: KeyEvent, _ctx: &mut Context) -> Action {
        Action::None
    }

    fn render(&self, _frame: &mut Frame, _area: Rect, _ctx: &Context) {}

    fn export_table(&self) -> Option<Table> {
        None
    }
}
