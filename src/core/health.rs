//! Backend health indicator

use std::collections::BTreeMap;

use serde_json::Value;

use crate::infrastructure::api::ApiResult;

/// Shared health indicator shown in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthState {
    /// No probe has completed yet
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
    Disconnected,
}

impl HealthState {
    /// Map a liveness probe result onto the indicator
    pub fn from_probe(result: &ApiResult) -> Self {
        match result {
            Ok(body) => {
                let status = body.get("status").and_then(Value::as_str).unwrap_or("");
                if status.eq_ignore_ascii_case("healthy") {
                    HealthState::Healthy
                } else {
                    HealthState::Unhealthy
                }
            }
            Err(_) => HealthState::Disconnected,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthState::Unknown => "Connecting…",
            HealthState::Healthy => "System Healthy",
            HealthState::Unhealthy => "Issues Detected",
            HealthState::Disconnected => "Disconnected",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthState::Healthy)
    }
}

/// Readiness probe body as subsystem name → healthy flag.
///
/// Accepts `{"checks": {...}}` or a flat object; values may be booleans,
/// status strings or objects carrying `status`/`healthy`.
pub fn parse_readiness(body: &Value) -> BTreeMap<String, bool> {
    let source = match body.get("checks").and_then(Value::as_object) {
        Some(checks) => checks,
        None => match body.as_object() {
            Some(map) => map,
            None => return BTreeMap::new(),
        },
    };

    source
        .iter()
        .filter(|(name, _)| !matches!(name.as_str(), "status" | "timestamp" | "checks"))
        .filter_map(|(name, value)| readiness_flag(value).map(|flag| (name.clone(), flag)))
        .collect()
}

fn readiness_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => Some(status_is_ok(text)),
        Value::Object(map) => {
            if let Some(flag) = map.get("healthy").and_then(Value::as_bool) {
                return Some(flag);
            }
            map.get("status").and_then(Value::as_str).map(status_is_ok)
        }
        _ => None,
    }
}

fn status_is_ok(text: &str) -> bool {
    matches!(
        text.to_ascii_lowercase().as_str(),
        "ok" | "healthy" | "up" | "ready" | "connected" | "true"
    )
}
