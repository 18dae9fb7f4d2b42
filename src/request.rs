//! Queued requests and signed wire fragments
//!
//! A [`QueuedRequest`] pairs an [`Action`] with the process-unique handle it
//! was assigned at enqueue time and knows how to render the signed wire
//! fragment for the batch payload.

use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::action::Action;

type HmacSha256 = Hmac<Sha256>;

/// One enqueued action, identified by its handle
///
/// Created at enqueue time, lives in the pending queue until dispatched,
/// then is referenced from exactly one response or error entry.
#[derive(Debug)]
pub struct QueuedRequest {
    handle: u64,
    action: Action,
}

impl QueuedRequest {
    pub(crate) fn new(handle: u64, action: Action) -> Self {
        Self { handle, action }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Build the signed wire fragment for this request
    ///
    /// Actions without their own timestamp are stamped with `now`; the
    /// signature covers the effective timestamp either way. The action
    /// itself is left untouched.
    pub fn wire_fragment(&self, token: &str, secret: &str, now: i64) -> Value {
        let timestamp = self.action.timestamp().unwrap_or(now);
        let hmac = sign_action(
            timestamp,
            token,
            self.action.resource_type(),
            self.action.kind(),
            secret,
        );

        let mut fragment = match self.action.canonical_form() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fragment.insert("timestamp".to_string(), Value::from(timestamp));
        fragment.insert("hmac".to_string(), Value::String(hmac));
        fragment.insert("hmac_version".to_string(), Value::from(2));
        Value::Object(fragment)
    }
}

/// HMAC-SHA256 over timestamp, token, resource type and action kind
fn sign_action(timestamp: i64, token: &str, resource_type: &str, kind: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(token.as_bytes());
    mac.update(resource_type.as_bytes());
    mac.update(kind.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
