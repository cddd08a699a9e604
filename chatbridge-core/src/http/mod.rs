//! HTTP client module for calls to model APIs
//!
//! This module implements the HTTP layer shared by every remote model:
//! - Connection pooling and client management
//! - JSON and server-sent-event request helpers
//! - Error mapping from status codes and bodies
//! - Request ID generation and correlation

pub mod client;
pub mod error;

pub use client::{EventStream, HttpClient};

use std::time::Duration;
use uuid::Uuid;

/// Header carrying the request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Options for an HTTP request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Overall timeout; `None` uses the client default for JSON calls
    /// and no timeout for streams
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timeout: None,
        }
    }
}

impl RequestOptions {
    /// Create new request options with a generated request ID
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
