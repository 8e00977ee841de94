//! Page identifiers and the static header tables

use std::fmt;

/// One dashboard section.
///
/// The known set is fixed at startup; anything else parses to `Other` so that
/// routing stays lenient (an unknown page renders as an empty view).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageId {
    Dashboard,
    Calendar,
    Workflow,
    Tracking,
    Metrics,
    Approvals,
    Tasks,
    Logs,
    Settings,
    Analytics,
    Alerts,
    Reports,
    Other(String),
}

impl PageId {
    /// Sidebar order
    pub const KNOWN: [PageId; 12] = [
        PageId::Dashboard,
        PageId::Calendar,
        PageId::Workflow,
        PageId::Tracking,
        PageId::Metrics,
        PageId::Approvals,
        PageId::Tasks,
        PageId::Logs,
        PageId::Settings,
        PageId::Analytics,
        PageId::Alerts,
        PageId::Reports,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PageId::Dashboard => "dashboard",
            PageId::Calendar => "calendar",
            PageId::Workflow => "workflow",
            PageId::Tracking => "tracking",
            PageId::Metrics => "metrics",
            PageId::Approvals => "approvals",
            PageId::Tasks => "tasks",
            PageId::Logs => "logs",
            PageId::Settings => "settings",
            PageId::Analytics => "analytics",
            PageId::Alerts => "alerts",
            PageId::Reports => "reports",
            PageId::Other(id) => id.as_str(),
        }
    }

    /// Header title; unknown pages fall back to the dashboard label
    pub fn title(&self) -> &'static str {
        match self {
            PageId::Dashboard => "Dashboard",
            PageId::Calendar => "Content Calendar",
            PageId::Workflow => "Workflow Management",
            PageId::Tracking => "Post Tracking",
            PageId::Metrics => "Instagram Metrics",
            PageId::Approvals => "Pending Approvals",
            PageId::Tasks => "Agent Tasks",
            PageId::Logs => "Error Logs",
            PageId::Settings => "Settings",
            PageId::Analytics => "Analytics Insights",
            PageId::Alerts => "Alerts",
            PageId::Reports => "Reports",
            PageId::Other(_) => "Dashboard",
        }
    }

    pub fn breadcrumb(&self) -> &'static str {
        match self {
            PageId::Dashboard => "Home / Dashboard",
            PageId::Calendar => "Home / Calendar",
            PageId::Workflow => "Home / Workflow",
            PageId::Tracking => "Home / Tracking",
            PageId::Metrics => "Home / Metrics",
            PageId::Approvals => "Home / Approvals",
            PageId::Tasks => "Home / Tasks",
            PageId::Logs => "Home / Logs",
            PageId::Settings => "Home / Settings",
            PageId::Analytics => "Home / Analytics Insights",
            PageId::Alerts => "Home / Alerts",
            PageId::Reports => "Home / Reports",
            PageId::Other(_) => "Home",
        }
    }

    /// Short sidebar label
    pub fn label(&self) -> &str {
        match self {
            PageId::Dashboard => "Dashboard",
            PageId::Calendar => "Calendar",
            PageId::Workflow => "Workflow",
            PageId::Tracking => "Tracking",
            PageId::Metrics => "Metrics",
            PageId::Approvals => "Approvals",
            PageId::Tasks => "Tasks",
            PageId::Logs => "Logs",
            PageId::Settings => "Settings",
            PageId::Analytics => "Analytics",
            PageId::Alerts => "Alerts",
            PageId::Reports => "Reports",
            PageId::Other(id) => id.as_str(),
        }
    }

    pub fn shortcut(&self) -> Option<char> {
        match self {
            PageId::Dashboard => Some('1'),
            PageId::Calendar => Some('2'),
            PageId::Workflow => Some('3'),
            PageId::Tracking => Some('4'),
            PageId::Metrics => Some('5'),
            PageId::Approvals => Some('6'),
            PageId::Tasks => Some('7'),
            PageId::Logs => Some('8'),
            PageId::Settings => Some('9'),
            PageId::Analytics => Some('0'),
            PageId::Alerts | PageId::Reports | PageId::Other(_) => None,
        }
    }

    pub fn from_shortcut(c: char) -> Option<PageId> {
        PageId::KNOWN
            .iter()
            .find(|page| page.shortcut() == Some(c))
            .cloned()
    }

    /// Neighbour in sidebar order, wrapping. Unknown pages step from the start.
    pub fn cycle(&self, forward: bool) -> PageId {
        let len = PageId::KNOWN.len();
        let idx = PageId::KNOWN.iter().position(|p| p == self);
        let next = match (idx, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        PageId::KNOWN[next].clone()
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        let value = value.trim();
        PageId::KNOWN
            .iter()
            .find(|page| page.as_str() == value)
            .cloned()
            .unwrap_or_else(|| PageId::Other(value.to_string()))
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
