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

//! Conversational session: an append-only transcript with at most one
//! assistant request outstanding.

use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use nova_gateway::{AudioPayload, Gateway, GatewayResult, endpoints};
use nova_types::{ChatMessage, ChatRequestState, ClientConfig, ReplyTarget};

use crate::poller::StatusPoller;
use crate::state::SharedState;

/// Assistant text when the backend answers without `ai_text`
pub const EMPTY_REPLY_TEXT: &str = "Done.";

/// Transcript text for a reply that was played as audio
pub const SPOKEN_REPLY_TEXT: &str = "(spoken reply)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("message is empty")]
    Empty,
    #[error("a chat request is already pending")]
    Busy,
}

/// Plays assistant replies routed to the local device
pub trait AudioSink: Send + Sync {
    fn play(&self, audio: AudioPayload);
}

/// Sink that drops audio; used when nothing can play it
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardAudio;

impl AudioSink for DiscardAudio {
    fn play(&self, audio: AudioPayload) {
        debug!("🔇 [CHAT] Discarding {} bytes of audio", audio.len());
    }
}

/// Observable chat progress, published on every transcript or state change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatStatus {
    pub messages: usize,
    pub request: ChatRequestState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Replied(ChatMessage),
    /// Request failed; the placeholder message was appended
    Failed(ChatMessage),
    /// Session stopped before the reply arrived
    Discarded,
}

#[derive(Debug)]
pub struct ChatTicket {
    handle: JoinHandle<ChatOutcome>,
}

impl ChatTicket {
    pub async fn outcome(self) -> ChatOutcome {
        self.handle.await.unwrap_or(ChatOutcome::Discarded)
    }
}

#[derive(Debug, Default)]
struct Conversation {
    transcript: Vec<ChatMessage>,
    request: ChatRequestState,
}

struct ChatShared {
    gateway: Arc<dyn Gateway>,
    state: Arc<SharedState>,
    audio: Arc<dyn AudioSink>,
    conversation: Mutex<Conversation>,
    status_tx: watch::Sender<ChatStatus>,
    error_placeholder: String,
    refresher: Option<StatusPoller>,
}

impl ChatShared {
    fn notify(&self, conversation: &Conversation) {
        self.status_tx.send_replace(ChatStatus {
            messages: conversation.transcript.len(),
            request: conversation.request,
        });
    }

    /// Append the reply (if any) and return to Idle in one step
    fn finish(&self, reply: Option<ChatMessage>) {
        let mut conversation = self.conversation.lock();
        if let Some(message) = reply {
            conversation.transcript.push(message);
        }
        conversation.request = ChatRequestState::Idle;
        self.notify(&conversation);
    }
}

/// Returns the session to Idle if the request task ends without finishing
struct PendingGuard {
    shared: Arc<ChatShared>,
    armed: bool,
}

impl PendingGuard {
    fn finish(mut self, reply: Option<ChatMessage>) {
        self.armed = false;
        self.shared.finish(reply);
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.armed {
            self.shared.finish(None);
        }
    }
}

#[derive(Clone)]
pub struct ChatSession {
    shared: Arc<ChatShared>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("gateway", &self.shared.gateway.name())
            .field("status", &*self.shared.status_tx.borrow())
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        state: Arc<SharedState>,
        audio: Arc<dyn AudioSink>,
        config: &ClientConfig,
        refresher: Option<StatusPoller>,
    ) -> Self {
        let (status_tx, _) = watch::channel(ChatStatus::default());
        Self {
            shared: Arc::new(ChatShared {
                gateway,
                state,
                audio,
                conversation: Mutex::new(Conversation::default()),
                status_tx,
                error_placeholder: config.chat_error_placeholder.clone(),
                refresher: config.refresh_after_command.then_some(refresher).flatten(),
            }),
        }
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.shared.conversation.lock().transcript.clone()
    }

    pub fn request_state(&self) -> ChatRequestState {
        self.shared.conversation.lock().request
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Send a user message.
    ///
    /// The user message is appended and the session marked pending before
    /// this returns; the reply arrives on the returned ticket.
    pub fn send(&self, text: &str, target: ReplyTarget) -> Result<ChatTicket, SendRejected> {
        if text.trim().is_empty() {
            return Err(SendRejected::Empty);
        }

        {
            let mut conversation = self.shared.conversation.lock();
            if conversation.request == ChatRequestState::Pending {
                debug!("[CHAT] Rejecting send while a request is pending");
                return Err(SendRejected::Busy);
            }
            conversation.transcript.push(ChatMessage::user(text));
            conversation.request = ChatRequestState::Pending;
            self.shared.notify(&conversation);
        }

        info!("💬 [CHAT] Sending message (reply via {})", target);
        let guard = PendingGuard {
            shared: self.shared.clone(),
            armed: true,
        };
        let payload = json!({"text": text, "target": target.as_str()});

        let handle = tokio::spawn(async move {
            let shared = guard.shared.clone();
            let result = request_reply(&shared, endpoints::CHAT_SEND, payload, target).await;

            if !shared.state.is_active() {
                debug!("[CHAT] Session stopped, discarding reply");
                guard.finish(None);
                return ChatOutcome::Discarded;
            }

            match result {
                Ok(text) => {
                    let message = ChatMessage::assistant(text);
                    guard.finish(Some(message.clone()));
                    if let Some(poller) = &shared.refresher {
                        poller.poll_once().await;
                    }
                    ChatOutcome::Replied(message)
                }
                Err(e) => {
                    error!("❌ [CHAT] Assistant request failed: {}", e);
                    let message = ChatMessage::assistant(shared.error_placeholder.clone());
                    guard.finish(Some(message.clone()));
                    ChatOutcome::Failed(message)
                }
            }
        });

        Ok(ChatTicket { handle })
    }

    /// Speak arbitrary text without touching the transcript
    pub async fn speak(&self, text: &str, target: ReplyTarget) -> GatewayResult<()> {
        info!("🔊 [CHAT] Speaking via {}", target);
        let payload = json!({"text": text, "target": target.as_str()});
        request_reply(&self.shared, endpoints::TTS_SPEAK, payload, target)
            .await
            .map(|_| ())
    }
}

/// Issue a dual-mode request and reduce the answer to transcript text
async fn request_reply(
    shared: &ChatShared,
    endpoint: &str,
    payload: Value,
    target: ReplyTarget,
) -> GatewayResult<String> {
    match target {
        ReplyTarget::Esp => {
            let reply = shared.gateway.command(endpoint, payload).await?;
            Ok(reply_text(&reply))
        }
        ReplyTarget::Local => {
            let audio = shared.gateway.command_audio(endpoint, payload).await?;
            debug!(
                "🔊 [CHAT] Received {} bytes ({})",
                audio.len(),
                audio.content_type.as_deref().unwrap_or("unknown type")
            );
            if shared.state.is_active() {
                shared.audio.play(audio);
            }
            Ok(SPOKEN_REPLY_TEXT.to_owned())
        }
    }
}

fn reply_text(reply: &Value) -> String {
    reply
        .get("ai_text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(EMPTY_REPLY_TEXT)
        .to_owned()
}
