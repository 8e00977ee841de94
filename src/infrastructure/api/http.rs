//! reqwest-backed [`Backend`]

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use super::{ApiError, ApiResult, Backend, Method, Request};
use crate::config::ApiSettings;

/// Fixed per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "X-API-Key";

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone().filter(|key| !key.trim().is_empty()),
        })
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn send(&self, request: &Request) -> ApiResult {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(Self::method(request.method), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let text = response.text().await.map_err(classify)?;

        if !status.is_success() {
            tracing::warn!(request = %request.describe(), status = status.as_u16(), "backend returned error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        decode_body(&text)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn classify(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Empty bodies decode to `null`; anything else must be JSON
pub(crate) fn decode_body(text: &str) -> ApiResult {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|err| ApiError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(""), Ok(Value::Null));
        assert_eq!(decode_body("  \n"), Ok(Value::Null));
        assert_eq!(
            decode_body(r#"{"status":"healthy"}"#),
            Ok(serde_json::json!({"status": "healthy"}))
        );
        assert!(matches!(decode_body("<html>"), Err(ApiError::Malformed(_))));
    }

    #[test]
    fn test_blank_api_key_is_dropped() {
        let settings = ApiSettings {
            base_url: "http://localhost:8000".to_string(),
            api_key: Some("   ".to_string()),
        };
        let backend = HttpBackend::new(&settings).unwrap();
        assert!(backend.api_key.is_none());
        assert_eq!(backend.base_url(), "http://localhost:8000");
    }
}
