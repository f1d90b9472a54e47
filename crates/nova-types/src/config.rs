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

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::chat::ReplyTarget;

/// Default status poll cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default lifetime of an unconfirmed override (four poll cycles)
pub const DEFAULT_OVERRIDE_TIMEOUT: Duration = Duration::from_secs(8);

/// Poll intervals without a successful poll before the feed counts as stale
pub const STALE_POLL_FACTOR: u32 = 3;

/// Transcript text appended when a chat request fails
pub const DEFAULT_CHAT_ERROR_PLACEHOLDER: &str = "Error connecting to AI.";

// ============= Client Runtime Configuration =============

/// Runtime tuning for a client session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Interval between status polls
    pub poll_interval: Duration,

    /// How long an unconfirmed override stays visible
    pub override_timeout: Duration,

    /// Drop the override as soon as its command fails instead of waiting for
    /// the timeout. Off by default: the UI keeps showing the intent.
    pub revert_on_failure: bool,

    /// Poll immediately after a command or chat reply succeeds
    pub refresh_after_command: bool,

    /// Assistant text shown when a chat request fails
    pub chat_error_placeholder: String,

    /// Reply routing used when the caller does not pick one
    pub default_reply_target: ReplyTarget,
}

impl ClientConfig {
    /// Age of the last successful poll beyond which connectivity is degraded
    pub fn stale_after(&self) -> Duration {
        self.poll_interval.saturating_mul(STALE_POLL_FACTOR)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            override_timeout: DEFAULT_OVERRIDE_TIMEOUT,
            revert_on_failure: false,
            refresh_after_command: true,
            chat_error_placeholder: DEFAULT_CHAT_ERROR_PLACEHOLDER.to_owned(),
            default_reply_target: ReplyTarget::Esp,
        }
    }
}
