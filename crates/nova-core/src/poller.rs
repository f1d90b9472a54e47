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

//! Fixed-interval status polling with at most one query in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use nova_gateway::{Gateway, GatewayError, endpoints};
use nova_types::DeviceSnapshot;

use crate::state::SharedState;

/// Result of one poll attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// New snapshot applied
    Updated,
    /// Query failed; previous snapshot kept
    Failed,
    /// Another query was still in flight
    Skipped,
    /// Session stopped while the query was in flight
    Discarded,
}

/// Releases the in-flight flag on every exit path
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the status feed: queries `/status` and writes the snapshot cell
#[derive(Clone)]
pub struct StatusPoller {
    gateway: Arc<dyn Gateway>,
    state: Arc<SharedState>,
    in_flight: Arc<AtomicBool>,
}

impl std::fmt::Debug for StatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusPoller")
            .field("gateway", &self.gateway.name())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl StatusPoller {
    pub fn new(gateway: Arc<dyn Gateway>, state: Arc<SharedState>) -> Self {
        Self {
            gateway,
            state,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run a single poll unless one is already in flight
    pub async fn poll_once(&self) -> PollOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("⏭️ [STATUS] Poll still in flight, skipping");
            return PollOutcome::Skipped;
        };

        let result = self
            .gateway
            .query(endpoints::STATUS)
            .await
            .and_then(|value| DeviceSnapshot::from_value(value).map_err(GatewayError::from));

        if !self.state.is_active() {
            debug!("[STATUS] Session stopped, discarding poll result");
            return PollOutcome::Discarded;
        }

        match result {
            Ok(snapshot) => {
                debug!(
                    "✅ [STATUS] light on={:?} brightness={:?} mode={:?}",
                    snapshot.light_on(),
                    snapshot.light_brightness(),
                    snapshot.light_mode()
                );
                let recovered = self.state.status().consecutive_failures > 0;
                self.state.apply_snapshot(snapshot);
                if recovered {
                    info!("🔄 [STATUS] Backend reachable again");
                }
                PollOutcome::Updated
            }
            Err(e) => {
                self.state.record_failure(&e);
                let failures = self.state.status().consecutive_failures;
                if failures == 1 {
                    warn!("⚠️ [STATUS] Poll failed, keeping last snapshot: {}", e);
                } else {
                    debug!("⚠️ [STATUS] Poll failed ({} in a row): {}", failures, e);
                }
                PollOutcome::Failed
            }
        }
    }

    /// Start polling: once immediately, then every `interval`.
    ///
    /// Ticks that fire while a poll is still running are skipped, not queued.
    pub fn spawn(self, interval: Duration) -> PollerHandle {
        info!("🚀 [STATUS] Poller started (every {:?})", interval);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.state.refresh_connectivity();
                self.poll_once().await;
            }
        });
        PollerHandle {
            handle: Some(handle),
        }
    }
}

/// Running poll loop; aborted on [`PollerHandle::stop`] or drop
#[derive(Debug)]
pub struct PollerHandle {
    handle: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("🛑 [STATUS] Poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
