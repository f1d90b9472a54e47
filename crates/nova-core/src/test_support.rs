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

//! In-memory gateway for deterministic tests.
//!
//! Status queries are answered from a script; once the script runs dry they,
//! like every command, are handed to the test as a [`PendingCall`] that the
//! test resolves whenever (and in whatever order) it likes.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};

use nova_gateway::{AudioPayload, Gateway, GatewayError, GatewayResult};

#[derive(Debug)]
pub enum Reply {
    Json(GatewayResult<Value>),
    Audio(GatewayResult<AudioPayload>),
}

/// A request waiting for the test to answer it
#[derive(Debug)]
pub struct PendingCall {
    pub endpoint: String,
    pub payload: Value,
    responder: oneshot::Sender<Reply>,
}

impl PendingCall {
    pub fn respond(self, result: GatewayResult<Value>) {
        let _ = self.responder.send(Reply::Json(result));
    }

    pub fn respond_ok(self) {
        self.respond(Ok(json!({"status": "ok"})));
    }

    pub fn respond_audio(self, result: GatewayResult<AudioPayload>) {
        let _ = self.responder.send(Reply::Audio(result));
    }
}

#[derive(Debug)]
pub struct ScriptedGateway {
    statuses: Mutex<VecDeque<GatewayResult<Value>>>,
    calls_tx: mpsc::UnboundedSender<PendingCall>,
    calls_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<PendingCall>>,
    queries: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            statuses: Mutex::new(VecDeque::new()),
            calls_tx,
            calls_rx: tokio::sync::Mutex::new(calls_rx),
            queries: AtomicUsize::new(0),
        })
    }

    /// Queue the answer for the next status query
    pub fn push_status(&self, result: GatewayResult<Value>) {
        self.statuses.lock().push_back(result);
    }

    pub fn push_light(&self, on: bool, brightness: u8, mode: &str) {
        self.push_status(Ok(light_status(on, brightness, mode)));
    }

    pub fn push_failure(&self) {
        self.push_status(Err(GatewayError::NetworkUnavailable(
            "connection refused".to_owned(),
        )));
    }

    /// Number of status queries issued so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Wait for the next unanswered request
    pub async fn next_call(&self) -> PendingCall {
        self.calls_rx
            .lock()
            .await
            .recv()
            .await
            .expect("gateway dropped")
    }

    /// Next unanswered request, if one is already waiting
    pub async fn try_next_call(&self) -> Option<PendingCall> {
        self.calls_rx.lock().await.try_recv().ok()
    }

    async fn wait_for_reply(&self, endpoint: &str, payload: Value) -> Reply {
        let (responder, reply) = oneshot::channel();
        self.calls_tx
            .send(PendingCall {
                endpoint: endpoint.to_owned(),
                payload,
                responder,
            })
            .expect("test dropped the call receiver");
        reply.await.unwrap_or_else(|_| {
            Reply::Json(Err(GatewayError::NetworkUnavailable(
                "call abandoned by test".to_owned(),
            )))
        })
    }
}

pub fn light_status(on: bool, brightness: u8, mode: &str) -> Value {
    json!({
        "weather": {"temperature": 24, "weather_code": 0, "is_day": 1, "location": "Bangalore, India"},
        "light": {"on": on, "brightness": brightness, "mode": mode}
    })
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn query(&self, endpoint: &str) -> GatewayResult<Value> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let scripted = self.statuses.lock().pop_front();
        if let Some(result) = scripted {
            return result;
        }
        match self.wait_for_reply(endpoint, Value::Null).await {
            Reply::Json(result) => result,
            Reply::Audio(_) => Err(GatewayError::InvalidResponse("audio reply".to_owned())),
        }
    }

    async fn command(&self, endpoint: &str, payload: Value) -> GatewayResult<Value> {
        match self.wait_for_reply(endpoint, payload).await {
            Reply::Json(result) => result,
            Reply::Audio(_) => Err(GatewayError::InvalidResponse("audio reply".to_owned())),
        }
    }

    async fn command_audio(&self, endpoint: &str, payload: Value) -> GatewayResult<AudioPayload> {
        match self.wait_for_reply(endpoint, payload).await {
            Reply::Audio(result) => result,
            Reply::Json(Err(e)) => Err(e),
            Reply::Json(Ok(_)) => Err(GatewayError::InvalidResponse("json reply".to_owned())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Let spawned tasks run until they block again
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
