// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of NOVA.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use crate::endpoints;
use crate::errors::{GatewayError, GatewayResult};
use crate::traits::{AudioPayload, Gateway};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, trace};

/// Default backend address used during development
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// NOVA backend REST client
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    /// Create a client with the default request timeout
    pub fn new(base_url: impl Into<String>) -> GatewayResult<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(GatewayError::ConfigError(format!(
                "backend URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| GatewayError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Turn a non-2xx response into a `ServerError`
    async fn check_status(endpoint: &str, response: Response) -> GatewayResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        error!("❌ [BACKEND] {} returned {}: {}", endpoint, status, message);
        Err(GatewayError::ServerError {
            status: status.as_u16(),
            message,
        })
    }

    /// Decode a JSON body; an empty body is `null`
    async fn read_json(response: Response) -> GatewayResult<Value> {
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post(&self, endpoint: &str, payload: &Value) -> GatewayResult<Response> {
        let url = self.url(endpoint);
        debug!("📞 [BACKEND] POST {}", url);
        trace!("   Body: {}", payload);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .inspect_err(|e| debug!("   POST {} failed: {}", url, e))?;

        Self::check_status(endpoint, response).await
    }

    /// Speak arbitrary text through the backend's TTS engine
    pub async fn speak(&self, payload: Value) -> GatewayResult<AudioPayload> {
        self.command_audio(endpoints::TTS_SPEAK, payload).await
    }
}

#[async_trait]
impl Gateway for BackendClient {
    async fn query(&self, endpoint: &str) -> GatewayResult<Value> {
        let url = self.url(endpoint);
        debug!("🔍 [BACKEND] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .inspect_err(|e| debug!("   GET {} failed: {}", url, e))?;
        let response = Self::check_status(endpoint, response).await?;
        let value = Self::read_json(response).await?;

        trace!("   Response: {}", value);
        Ok(value)
    }

    async fn command(&self, endpoint: &str, payload: Value) -> GatewayResult<Value> {
        let response = self.post(endpoint, &payload).await?;
        let value = Self::read_json(response).await?;

        debug!("✅ [BACKEND] {} accepted", endpoint);
        trace!("   Response: {}", value);
        Ok(value)
    }

    async fn command_audio(&self, endpoint: &str, payload: Value) -> GatewayResult<AudioPayload> {
        let response = self.post(endpoint, &payload).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?.to_vec();

        debug!(
            "✅ [BACKEND] {} returned {} bytes of audio ({})",
            endpoint,
            bytes.len(),
            content_type.as_deref().unwrap_or("unknown type")
        );
        Ok(AudioPayload {
            content_type,
            bytes,
        })
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}
