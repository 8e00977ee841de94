//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - The backend REST API seam and its reqwest implementation
//! - Tokio runtime bridge, batch worker and refresh loop

pub mod api;
pub mod runtime;

pub use api::{ApiError, ApiResult, Backend, HttpBackend, Request};
pub use runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent};
