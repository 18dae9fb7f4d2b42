//! Batch orchestrator
//!
//! [`ApiCall`] owns the pending queue, the cache-backend chain and the
//! per-handle response and error tables, and runs the batch cycle:
//! partition into cache hits and misses, serialize the misses into one
//! wire request, dispatch it, demultiplex the reply by position and write
//! cacheable successes back through the chain.
//!
//! One logical thread of control per instance: the cycle is a linear,
//! non-reentrant sequence with no internal locking. Callers that share an
//! `ApiCall` across tasks must synchronize externally.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::cache::{CacheParams, ResponseCache};
use crate::error::{ApiError, Result};
use crate::request::QueuedRequest;
use crate::response::{self, ApiResponse};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Client configuration
///
/// Deserializable so callers can load it from a JSON config file; missing
/// fields fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the remote API, e.g. "https://api.example.com"
    pub base_url: String,
    /// API version path segment
    pub api_version: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_version: "stable".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Request-batching orchestrator for an action-based remote API
pub struct ApiCall {
    base_url: String,
    api_version: String,
    next_handle: u64,
    queue: Vec<Arc<QueuedRequest>>,
    responses: HashMap<u64, ApiResponse>,
    errors: HashMap<u64, Value>,
    caches: Vec<Arc<dyn ResponseCache>>,
    transport: Arc<dyn HttpTransport>,
}

impl ApiCall {
    /// Create an orchestrator with the default reqwest transport
    pub fn new(config: ClientConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(
            config.timeout_secs,
        )));
        Self::with_transport(config, transport)
    }

    /// Create an orchestrator with an injected transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: config.base_url,
            api_version: config.api_version,
            next_handle: 0,
            queue: Vec::new(),
            responses: HashMap::new(),
            errors: HashMap::new(),
            caches: Vec::new(),
            transport,
        }
    }

    pub fn set_server(&mut self, base_url: &str) {
        self.base_url = base_url.to_string();
    }

    pub fn set_api_version(&mut self, api_version: &str) {
        self.api_version = api_version.to_string();
    }

    /// Append a backend to the cache chain
    pub fn add_cache(&mut self, cache: Arc<dyn ResponseCache>) {
        self.caches.push(cache);
    }

    /// Empty the cache chain; every action dispatches afterwards
    pub fn clear_caches(&mut self) {
        self.caches.clear();
    }

    /// Enqueue an action, returning its handle
    ///
    /// Handles are monotonic for the lifetime of this instance and are
    /// never reused, even across batch cycles.
    pub fn enqueue(&mut self, action: Action) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.queue.push(Arc::new(QueuedRequest::new(handle, action)));
        handle
    }

    /// Number of actions waiting for the next batch cycle
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run one batch cycle with the configured transport
    pub async fn send_requests(&mut self, token: &str, secret: &str) -> Result<()> {
        let transport = Arc::clone(&self.transport);
        self.send_requests_with(token, secret, transport.as_ref())
            .await
    }

    /// Run one batch cycle with an explicit transport
    ///
    /// The pending queue is cleared unconditionally, on success and on
    /// failure alike; a failed cycle is not retried.
    pub async fn send_requests_with(
        &mut self,
        token: &str,
        secret: &str,
        transport: &dyn HttpTransport,
    ) -> Result<()> {
        let queue = std::mem::take(&mut self.queue);
        let now = unix_now();

        // Partition: cache hits resolve immediately, misses dispatch in
        // enqueue order.
        let mut dispatch = Vec::new();
        let mut fragments = Vec::new();
        for request in queue {
            let params = CacheParams::for_action(request.action());
            if let Some(stored) = self.lookup_chain(&params) {
                debug!(handle = request.handle(), "action served from cache");
                self.responses
                    .insert(request.handle(), ApiResponse::new(request, stored));
                continue;
            }
            fragments.push(request.wire_fragment(token, secret, now));
            dispatch.push(request);
        }

        if dispatch.is_empty() {
            debug!("nothing to dispatch");
            return Ok(());
        }

        let body = json!({
            "token": token,
            "request": { "actions": fragments },
        })
        .to_string();

        info!(actions = dispatch.len(), "dispatching batch");
        let reply = match transport.send(&self.api_url(), body).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "batch dispatch failed");
                return Err(ApiError::HttpFetchNoResult);
            }
        };

        let parsed: Value =
            serde_json::from_str(&reply).map_err(|_| ApiError::HttpFetchNoResult)?;
        let Some(results) = parsed["response"]["results"].as_array() else {
            return Err(ApiError::HttpFetchNoResult);
        };

        // Demultiplexing is purely positional: outcome i belongs to the
        // i-th dispatched request, whatever identifiers the payload claims.
        let mut cacheable_handles = Vec::new();
        for (request, outcome) in dispatch.into_iter().zip(results.iter().cloned()) {
            let handle = request.handle();
            let code = response::error_code(&outcome);
            if code == 0 {
                self.responses
                    .insert(handle, ApiResponse::new(request, outcome));
                cacheable_handles.push(handle);
            } else {
                warn!(handle, code, "action returned an error");
                self.errors.insert(handle, outcome);
            }
        }

        self.write_cache_for(&cacheable_handles);
        Ok(())
    }

    /// Retrieve the outcome for a handle, consuming it
    ///
    /// Unknown or still-pending handles yield `Ok(None)`. A stored response
    /// that is somehow invalid fails with [`ApiError::FaultyResponse`] and
    /// stays in the table.
    pub fn get_response(&mut self, handle: u64) -> Result<Option<Value>> {
        let Some(stored) = self.responses.get(&handle) else {
            return Ok(None);
        };
        if !stored.is_valid() {
            return Err(ApiError::FaultyResponse { handle });
        }
        Ok(self.responses.remove(&handle).map(ApiResponse::into_data))
    }

    /// Accumulated per-action failures since the last queue reset
    pub fn errors(&self) -> &HashMap<u64, Value> {
        &self.errors
    }

    fn api_url(&self) -> String {
        format!(
            "{}/{}/api",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.api_version)
        )
    }

    /// Walk the chain in order; first decodable non-empty hit wins.
    /// Corrupt stored entries count as misses.
    fn lookup_chain(&self, params: &CacheParams) -> Option<Value> {
        for cache in &self.caches {
            let Some(stored) = cache.lookup(params).filter(|s| !s.is_empty()) else {
                continue;
            };
            match serde_json::from_str(&stored) {
                Ok(value) => return Some(value),
                Err(e) => {
                    warn!(key = params.key(), error = %e, "corrupt cache entry, treating as miss");
                }
            }
        }
        None
    }

    /// Fan cacheable successes out to every backend; refusals are logged
    /// and ignored.
    fn write_cache_for(&self, handles: &[u64]) {
        if self.caches.is_empty() {
            return;
        }

        for handle in handles {
            let Some(stored) = self.responses.get(handle) else {
                continue;
            };
            if !stored.is_cacheable() {
                continue;
            }

            let params = CacheParams::for_action(stored.request().action());
            let serialized = stored.data().to_string();
            for cache in &self.caches {
                if !cache.store(&params, &serialized) {
                    debug!(key = params.key(), "cache backend declined write");
                }
            }
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
