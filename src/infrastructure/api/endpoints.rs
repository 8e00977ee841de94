//! Backend endpoint paths

pub const HEALTH: &str = "/health";
pub const HEALTH_LIVE: &str = "/api/health/live";
pub const HEALTH_READY: &str = "/api/health/ready";

pub const CONFIG: &str = "/api/config";
pub const SCHEDULER_STATUS: &str = "/api/scheduler/status";
pub const SCHEDULER_TRIGGER: &str = "/api/scheduler/trigger";
pub const DB_STATS: &str = "/api/db/stats";

pub const CALENDAR: &str = "/api/calendar";
pub const CALENDAR_TODAY: &str = "/api/calendar/today";

pub const WORKFLOW_RUN_DAILY: &str = "/api/workflow/run-daily";

pub const TRACKING: &str = "/api/tracking";

pub const METRICS: &str = "/api/metrics";
pub const METRICS_POSTS: &str = "/api/metrics/posts";
pub const METRICS_REFRESH: &str = "/api/metrics/refresh";

pub const ANALYTICS_REPORT: &str = "/api/analytics/report";
pub const ANALYTICS_BEST_TIMES: &str = "/api/analytics/best-times";

pub const APPROVALS_PENDING: &str = "/api/approval/pending";
pub const APPROVAL_ACTION: &str = "/api/approval/action";

pub const AGENT_TASKS: &str = "/api/agent/tasks";

pub const ERRORS: &str = "/api/errors";
pub const ERROR_LOGS: &str = "/api/logs/errors";

pub const ALERTS: &str = "/api/alerts";
pub const ALERTS_COUNT: &str = "/api/alerts/count";
pub const ALERTS_DISMISS_ALL: &str = "/api/alerts/dismiss-all";

pub const REPORTS: &str = "/api/reports";
pub const REPORTS_GENERATE: &str = "/api/reports/generate";

pub fn calendar_by_date(date: &str) -> String {
    format!("/api/calendar/by-date/{}", date.trim())
}

pub fn calendar_entry(entry_id: &str) -> String {
    format!("/api/calendar/{}", entry_id.trim())
}

pub fn workflow_start_by_id(entry_id: &str) -> String {
    format!("/api/workflow/start-by-id/{}", entry_id.trim())
}

pub fn workflow_status(session_id: &str) -> String {
    format!("/api/workflow/status/{}", session_id.trim())
}

pub fn alert_dismiss(alert_id: &str) -> String {
    format!("/api/alerts/{}/dismiss", alert_id.trim())
}

/// Alert list with optional `alert_type` and `status` query filters
pub fn alerts(alert_type: Option<&str>, status: Option<&str>) -> String {
    let query: Vec<String> = [("alert_type", alert_type), ("status", status)]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| format!("{name}={}", v.trim())))
        .collect();
    if query.is_empty() {
        ALERTS.to_string()
    } else {
        format!("{ALERTS}?{}", query.join("&"))
    }
}
