//! Actions that modules can return to communicate with the app

use super::{Command, PageId};

/// Actions returned by modules to communicate state changes
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No action needed
    None,

    /// Navigate to a page
    Navigate(PageId),

    /// Step back through the location history
    Back,

    /// Step forward through the location history
    Forward,

    /// Copy text to the system clipboard
    Copy(String),

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Open the command line with an optional prefix
    OpenCommand(Option<String>),

    /// Open a single-line prompt
    OpenPrompt(PromptKind),

    /// Run a `:` command on the page's behalf
    Execute(Command),

    /// Refresh all data
    RefreshAll,

    /// Export the active page's table
    Export(ExportFormat),

    /// Request quit
    Quit,
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    BaseUrl,
    ApiKey,
    /// Free text answered by the active page's `on_input`
    Page(&'static str),
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::BaseUrl => "API base URL",
            PromptKind::ApiKey => "API key",
            PromptKind::Page(title) => title,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}
