//! Page modules
//!
//! Each page implements `PageModule` and handles its own:
//! - Data fetching on activation and refresh
//! - Key input processing
//! - Rendering
//!
//! Pages:
//! - dashboard: overview counters, readiness, scheduler, today's posts
//! - calendar, tracking, tasks, logs, reports: record lists
//! - approvals, alerts: record lists with decisions
//! - metrics, analytics: engagement figures
//! - workflow: daily workflow runs
//! - settings: connection and backend configuration

pub mod alerts;
pub mod analytics;
pub mod approvals;
pub mod calendar;
pub mod dashboard;
pub mod export;
pub mod lists;
pub mod metrics;
pub mod records;
pub mod reports;
pub mod settings;
pub mod workflow;

use crate::core::{PageId, Router};

/// Register every built-in page
pub fn register_all(router: &mut Router) {
    router.register(PageId::Dashboard, Box::new(dashboard::Dashboard::new()));
    router.register(PageId::Calendar, Box::new(calendar::CalendarPage::new()));
    router.register(PageId::Workflow, Box::new(workflow::WorkflowPage::new()));
    router.register(PageId::Tracking, Box::new(lists::tracking()));
    router.register(PageId::Metrics, Box::new(metrics::MetricsPage::new()));
    router.register(PageId::Approvals, Box::new(approvals::ApprovalsPage::new()));
    router.register(PageId::Tasks, Box::new(lists::tasks()));
    router.register(PageId::Logs, Box::new(lists::logs()));
    router.register(PageId::Settings, Box::new(settings::SettingsPage::new()));
    router.register(PageId::Analytics, Box::new(analytics::AnalyticsPage::new()));
    router.register(PageId::Alerts, Box::new(alerts::AlertsPage::new()));
    router.register(PageId::Reports, Box::new(reports::ReportsPage::new()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all_covers_known_pages() {
        let mut router = Router::new();
        register_all(&mut router);
        for page in PageId::KNOWN.iter() {
            assert!(router.is_registered(page), "{page} not registered");
        }
    }
}
