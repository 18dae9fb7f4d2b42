//! HTTP transport seam
//!
//! The orchestrator only needs one operation from the network: send a
//! serialized body to a URL and get the serialized reply back. Keeping
//! that behind a trait lets tests script the exchange without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use crate::error::{ApiError, Result};

/// Network exchange for one batch payload
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST the serialized request body, return the raw reply body
    async fn send(&self, url: &str, body: String) -> Result<String>;
}

/// Default transport backed by a reqwest client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, url: &str, body: String) -> Result<String> {
        debug!(url = url, bytes = body.len(), "dispatching batch request");

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}
