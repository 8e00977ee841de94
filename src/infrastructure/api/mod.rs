//! Backend REST API abstraction
//!
//! Page modules never talk HTTP directly: they describe a [`Request`] and the
//! runtime worker sends it through a [`Backend`]. The production backend is
//! [`HttpBackend`]; tests substitute in-memory implementations.

mod http;
pub mod endpoints;

pub use http::HttpBackend;

use serde_json::Value;

/// Failure of a single backend call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Request timeout")]
    Timeout,
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error! status: {status}{}", body_suffix(.body))]
    Status { status: u16, body: String },
    #[error("Invalid response format: {0}")]
    Malformed(String),
}

fn body_suffix(body: &str) -> String {
    if body.trim().is_empty() {
        String::new()
    } else {
        format!(", message: {}", body.trim())
    }
}

pub type ApiResult = Result<Value, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A backend call described by a page module
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    /// POST with an empty JSON object body, matching what the backend expects
    /// for trigger-style endpoints
    pub fn post(path: impl Into<String>) -> Self {
        Self::post_json(path, Value::Object(Default::default()))
    }

    pub fn post_json(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
        }
    }

    pub fn describe(&self) -> String {
        format!("{} {}", self.method.as_str(), self.path)
    }
}

/// Transport for backend calls
#[async_trait::async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Send a request and decode the JSON response body
    async fn send(&self, request: &Request) -> ApiResult;

    /// Base address for display
    fn base_url(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ApiError::Timeout.to_string(), "Request timeout");
        let err = ApiError::Status {
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP error! status: 500");
        let err = ApiError::Status {
            status: 422,
            body: "bad entry".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error! status: 422, message: bad entry");
    }

    #[test]
    fn test_request_builders() {
        let req = Request::post("/api/scheduler/trigger");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body, Some(serde_json::json!({})));
        assert_eq!(Request::get("/health").describe(), "GET /health");
    }
}
