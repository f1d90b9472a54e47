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

//! Client session: wires the poller, dispatcher and chat around one shared
//! state and owns their lifecycle.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::info;

use nova_gateway::{Gateway, GatewayResult};
use nova_types::{
    ChatMessage, ChatRequestState, ClientConfig, LightCommand, RemoteCommand, ReplyTarget,
};

use crate::chat::{AudioSink, ChatSession, ChatStatus, ChatTicket, DiscardAudio, SendRejected};
use crate::dispatcher::{CommandDispatcher, CommandTicket, Notice};
use crate::poller::{PollOutcome, PollerHandle, StatusPoller};
use crate::projection::{RenderModel, project};
use crate::state::{SharedState, ViewState};

#[derive(Debug)]
pub struct ClientSession {
    config: ClientConfig,
    state: Arc<SharedState>,
    poller: StatusPoller,
    dispatcher: CommandDispatcher,
    chat: ChatSession,
    poll_task: Mutex<Option<PollerHandle>>,
}

impl ClientSession {
    pub fn new(gateway: Arc<dyn Gateway>, config: ClientConfig) -> Self {
        Self::with_audio_sink(gateway, config, Arc::new(DiscardAudio))
    }

    pub fn with_audio_sink(
        gateway: Arc<dyn Gateway>,
        config: ClientConfig,
        audio: Arc<dyn AudioSink>,
    ) -> Self {
        let state = SharedState::with_stale_after(config.stale_after());
        let poller = StatusPoller::new(gateway.clone(), state.clone());
        let dispatcher = CommandDispatcher::new(gateway.clone(), state.clone(), &config)
            .with_refresher(poller.clone());
        let chat = ChatSession::new(gateway, state.clone(), audio, &config, Some(poller.clone()));

        Self {
            config,
            state,
            poller,
            dispatcher,
            chat,
            poll_task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Begin polling. The first poll fires immediately. No-op when running.
    pub fn start(&self) {
        let mut task = self.poll_task.lock();
        if task.as_ref().is_some_and(PollerHandle::is_running) {
            return;
        }
        self.state.set_active(true);
        *task = Some(self.poller.clone().spawn(self.config.poll_interval));
        info!("🚀 [SESSION] Started");
    }

    /// Stop polling and discard the results of anything still in flight
    pub fn stop(&self) {
        self.state.set_active(false);
        if let Some(mut handle) = self.poll_task.lock().take() {
            handle.stop();
            info!("🛑 [SESSION] Stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.poll_task
            .lock()
            .as_ref()
            .is_some_and(PollerHandle::is_running)
    }

    /// Poll now, outside the regular cadence
    pub async fn refresh(&self) -> PollOutcome {
        self.poller.poll_once().await
    }

    pub fn dispatch_light(&self, command: LightCommand) -> CommandTicket {
        self.dispatcher.dispatch_light(command)
    }

    pub fn press_remote(&self, command: RemoteCommand) -> CommandTicket {
        self.dispatcher.press_remote(command)
    }

    pub fn send_chat(&self, text: &str) -> Result<ChatTicket, SendRejected> {
        self.send_chat_to(text, self.config.default_reply_target)
    }

    pub fn send_chat_to(&self, text: &str, target: ReplyTarget) -> Result<ChatTicket, SendRejected> {
        self.chat.send(text, target)
    }

    pub async fn speak(&self, text: &str) -> GatewayResult<()> {
        self.chat.speak(text, self.config.default_reply_target).await
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn subscribe_chat(&self) -> watch::Receiver<ChatStatus> {
        self.chat.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.dispatcher.subscribe_notices()
    }

    pub fn view(&self) -> ViewState {
        self.state.view()
    }

    pub fn render(&self) -> RenderModel {
        let view = self.state.view();
        project(&view.effective, view.connectivity)
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.chat.transcript()
    }

    pub fn chat_state(&self) -> ChatRequestState {
        self.chat.request_state()
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.stop();
    }
}
