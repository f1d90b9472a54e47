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

//! Optimistic command dispatch.
//!
//! A light command is visible the moment it is dispatched: the intended value
//! is recorded as an override and published before the request goes out. The
//! override disappears once a poll confirms it or its timeout elapses. Later
//! dispatches for the same field supersede earlier ones by dispatch order, so
//! a slow response to an old command can never undo a newer intent.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use nova_gateway::{FailureCategory, Gateway, GatewayError, endpoints};
use nova_types::{ClientConfig, ControlField, LightCommand, RemoteCommand};

use crate::poller::StatusPoller;
use crate::state::SharedState;

/// Buffer for user-facing notices (slow receivers lose the oldest)
const NOTICE_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{command} failed: {source}")]
    Gateway {
        command: String,
        #[source]
        source: GatewayError,
    },

    #[error("{command} was aborted before completing")]
    Aborted { command: String },
}

/// Transient, non-blocking message for the user (toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    CommandFailed {
        command: String,
        category: FailureCategory,
        error: String,
    },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommandFailed {
                command,
                category,
                error,
            } => write!(f, "{command} failed ({category}): {error}"),
        }
    }
}

/// Handle to an in-flight command. Dropping it does not cancel the request.
#[derive(Debug)]
pub struct CommandTicket {
    description: String,
    override_seq: Option<u64>,
    handle: JoinHandle<Result<(), CommandError>>,
}

impl CommandTicket {
    /// Dispatch sequence of the override this command created, if any
    pub fn override_seq(&self) -> Option<u64> {
        self.override_seq
    }

    /// Wait for the backend's answer
    pub async fn outcome(self) -> Result<(), CommandError> {
        match self.handle.await {
            Ok(result) => result,
            Err(_) => Err(CommandError::Aborted {
                command: self.description,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DispatchSettings {
    override_timeout: Duration,
    revert_on_failure: bool,
    refresh_after_command: bool,
}

/// Sends device commands and owns the override table
#[derive(Clone)]
pub struct CommandDispatcher {
    gateway: Arc<dyn Gateway>,
    state: Arc<SharedState>,
    settings: DispatchSettings,
    notices: broadcast::Sender<Notice>,
    refresher: Option<StatusPoller>,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("gateway", &self.gateway.name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    pub fn new(gateway: Arc<dyn Gateway>, state: Arc<SharedState>, config: &ClientConfig) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            gateway,
            state,
            settings: DispatchSettings {
                override_timeout: config.override_timeout,
                revert_on_failure: config.revert_on_failure,
                refresh_after_command: config.refresh_after_command,
            },
            notices,
            refresher: None,
        }
    }

    /// Poll right after each successful command
    pub fn with_refresher(mut self, poller: StatusPoller) -> Self {
        self.refresher = Some(poller);
        self
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Apply a light command optimistically and send it
    pub fn dispatch_light(&self, command: LightCommand) -> CommandTicket {
        let (field, value) = command.intended_value();
        let seq = self.state.with_overrides(|table| {
            table.insert(
                field,
                value.clone(),
                Instant::now(),
                self.settings.override_timeout,
            )
        });
        debug!("💡 [DISPATCH] {} -> override #{} {:?}", field, seq, value);
        self.state.publish();
        self.schedule_expiry(field, seq);

        self.send(
            command.to_string(),
            endpoints::LIGHT_CONTROL,
            command.payload(),
            Some((field, seq)),
        )
    }

    /// Press a remote button. Remote presses carry no device state.
    pub fn press_remote(&self, command: RemoteCommand) -> CommandTicket {
        self.send(
            format!("remote {command}"),
            endpoints::REMOTE_CONTROL,
            command.payload(),
            None,
        )
    }

    /// Remove the override when its timeout elapses, unless it was confirmed
    /// or superseded first
    fn schedule_expiry(&self, field: ControlField, seq: u64) {
        let state = self.state.clone();
        let ttl = self.settings.override_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if state.with_overrides(|table| table.remove_if_current(field, seq)) {
                debug!("⌛ [DISPATCH] Override #{} for {} timed out", seq, field);
                state.publish();
            }
        });
    }

    fn send(
        &self,
        description: String,
        endpoint: &'static str,
        payload: Value,
        override_key: Option<(ControlField, u64)>,
    ) -> CommandTicket {
        info!("📤 [DISPATCH] {}", description);

        let gateway = self.gateway.clone();
        let state = self.state.clone();
        let notices = self.notices.clone();
        let refresher = self
            .settings
            .refresh_after_command
            .then(|| self.refresher.clone())
            .flatten();
        let revert_on_failure = self.settings.revert_on_failure;
        let command = description.clone();

        let handle = tokio::spawn(async move {
            let result = gateway.command(endpoint, payload).await;

            if !state.is_active() {
                debug!("[DISPATCH] Session stopped, discarding result of {}", command);
                return result
                    .map(|_| ())
                    .map_err(|source| CommandError::Gateway { command, source });
            }

            match result {
                Ok(_) => {
                    debug!("✅ [DISPATCH] {} accepted", command);
                    if let Some(poller) = refresher {
                        poller.poll_once().await;
                    }
                    Ok(())
                }
                Err(source) => {
                    warn!("❌ [DISPATCH] {} failed: {}", command, source);

                    if revert_on_failure
                        && let Some((field, seq)) = override_key
                        && state.with_overrides(|table| table.remove_if_current(field, seq))
                    {
                        debug!("↩️ [DISPATCH] Reverted override #{} for {}", seq, field);
                        state.publish();
                    }

                    // No subscribers is fine: nobody is showing toasts
                    let _ = notices.send(Notice::CommandFailed {
                        command: command.clone(),
                        category: source.category(),
                        error: source.to_string(),
                    });
                    Err(CommandError::Gateway { command, source })
                }
            }
        });

        CommandTicket {
            description,
            override_seq: override_key.map(|(_, seq)| seq),
            handle,
        }
    }
}
