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

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::GatewayResult;

/// Binary reply body (spoken assistant replies)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioPayload {
    /// `Content-Type` header as sent by the backend, e.g. "audio/wav"
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl AudioPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Request/response boundary to the home backend.
///
/// Each call issues exactly one request and never retries; retry policy belongs
/// to the caller. Dropping the returned future abandons the request.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Read-only query, e.g. `GET /status`
    async fn query(&self, endpoint: &str) -> GatewayResult<Value>;

    /// Command with a JSON body and a JSON (possibly empty) reply
    async fn command(&self, endpoint: &str, payload: Value) -> GatewayResult<Value>;

    /// Command with a JSON body whose reply is an audio payload
    async fn command_audio(&self, endpoint: &str, payload: Value) -> GatewayResult<AudioPayload>;

    /// Human-readable name for logs
    fn name(&self) -> &str;
}
