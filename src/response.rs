//! Per-action response wrappers
//!
//! An [`ApiResponse`] ties a raw outcome back to the request that produced
//! it and derives validity and cacheability from the outcome itself.

use std::sync::Arc;

use serde_json::Value;

use crate::request::QueuedRequest;

/// Extract the wire error code from a raw outcome
///
/// A missing code counts as success, matching the wire contract where
/// only failures carry a status block.
pub(crate) fn error_code(outcome: &Value) -> i64 {
    outcome["status"]["errorcode"].as_i64().unwrap_or(0)
}

/// One action's outcome, linked to its originating request
#[derive(Debug, Clone)]
pub struct ApiResponse {
    request: Arc<QueuedRequest>,
    raw: Value,
}

impl ApiResponse {
    pub(crate) fn new(request: Arc<QueuedRequest>, raw: Value) -> Self {
        Self { request, raw }
    }

    pub fn request(&self) -> &QueuedRequest {
        &self.request
    }

    /// Raw outcome payload, not the wrapper
    pub fn data(&self) -> &Value {
        &self.raw
    }

    pub(crate) fn into_data(self) -> Value {
        self.raw
    }

    /// An outcome is valid when its wire error code is zero
    pub fn is_valid(&self) -> bool {
        error_code(&self.raw) == 0
    }

    /// Cacheability is declared by the outcome's own metadata
    pub fn is_cacheable(&self) -> bool {
        self.is_valid() && self.raw["cacheable"].as_bool().unwrap_or(false)
    }
}
