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

pub mod chat;
pub mod dispatcher;
pub mod overrides;
pub mod poller;
pub mod projection;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use chat::{
    AudioSink, ChatOutcome, ChatSession, ChatStatus, ChatTicket, DiscardAudio, SendRejected,
};
pub use dispatcher::{CommandDispatcher, CommandError, CommandTicket, Notice};
pub use overrides::{OverrideTable, PendingOverride};
pub use poller::{PollOutcome, PollerHandle, StatusPoller};
pub use projection::{
    ColorView, ConnectivityView, LightView, RenderModel, Shown, WeatherIcon, WeatherView, project,
};
pub use session::ClientSession;
pub use state::{SharedState, StatusCell, ViewState};
