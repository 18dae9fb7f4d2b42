//! Batching client for action-based remote APIs
//!
//! Callers enqueue logical actions; one batch cycle serializes everything
//! pending into a single wire request, dispatches it and demultiplexes the
//! reply back to each caller by enqueue order. An ordered chain of cache
//! backends serves previously-seen action/parameter combinations without a
//! network round trip.
//!
//! # Example
//!
//! ```rust,no_run
//! use batchcall::{Action, ApiCall, ClientConfig, MemoryCache};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut call = ApiCall::new(ClientConfig {
//!     base_url: "https://api.example.com".into(),
//!     ..Default::default()
//! });
//! call.add_cache(Arc::new(MemoryCache::new()));
//!
//! let mut parameters = serde_json::Map::new();
//! parameters.insert("id".into(), serde_json::json!(1));
//! let handle = call.enqueue(Action::new("read", "contact", parameters));
//!
//! call.send_requests("token", "secret").await?;
//! let outcome = call.get_response(handle)?;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod cache;
pub mod call;
pub mod error;
pub mod request;
pub mod response;
pub mod transport;

// Re-export main types
pub use action::{kinds, Action};
pub use cache::{CacheParams, FileCache, MemoryCache, ResponseCache};
pub use call::{ApiCall, ClientConfig};
pub use error::{ApiError, Result};
pub use request::QueuedRequest;
pub use response::ApiResponse;
pub use transport::{HttpTransport, ReqwestTransport};
