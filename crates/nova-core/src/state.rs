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

//! Shared device state: the last-known-good snapshot, the override table and
//! the published view derived from both.
//!
//! The snapshot cell is written only by the status poller and the override
//! table only by the command dispatcher. Locks are held for short synchronous
//! sections and never across an `.await`.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use nova_gateway::GatewayError;
use nova_types::{ClientConfig, ConnectivityState, DeviceSnapshot, EffectiveState};

use crate::overrides::OverrideTable;

/// Poller-owned status feed
#[derive(Debug, Clone, Default)]
pub struct StatusCell {
    pub snapshot: Option<Arc<DeviceSnapshot>>,
    pub connectivity: ConnectivityState,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    /// Monotonic time of the last successful poll, used for staleness
    pub last_success: Option<Instant>,
}

/// Everything a renderer needs, rebuilt on every change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub effective: EffectiveState,
    pub connectivity: ConnectivityState,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    /// Bumped on every publish
    pub revision: u64,
}

#[derive(Debug)]
pub struct SharedState {
    status: RwLock<StatusCell>,
    overrides: Mutex<OverrideTable>,
    view_tx: watch::Sender<ViewState>,
    active: AtomicBool,
    stale_after: Duration,
}

impl SharedState {
    pub fn new() -> Arc<Self> {
        Self::with_stale_after(ClientConfig::default().stale_after())
    }

    /// Shared state whose connectivity degrades when no poll has succeeded
    /// for `stale_after`
    pub fn with_stale_after(stale_after: Duration) -> Arc<Self> {
        let (view_tx, _) = watch::channel(ViewState::default());
        Arc::new(Self {
            status: RwLock::new(StatusCell::default()),
            overrides: Mutex::new(OverrideTable::new()),
            view_tx,
            active: AtomicBool::new(true),
            stale_after,
        })
    }

    /// Receive a fresh [`ViewState`] after every change
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view_tx.subscribe()
    }

    /// False once the owning session has been stopped; late results are dropped
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Status feed with connectivity aged against the staleness bound
    pub fn status(&self) -> StatusCell {
        self.status_at(Instant::now())
    }

    fn status_at(&self, now: Instant) -> StatusCell {
        let mut status = self.status.read().clone();
        let stale = status
            .last_success
            .is_some_and(|at| now.saturating_duration_since(at) > self.stale_after);
        status.connectivity = status.connectivity.aged(stale);
        status
    }

    pub fn snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.status.read().snapshot.clone()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.status().connectivity
    }

    /// Effective state as of `now`; expired overrides are already invisible
    pub fn effective_at(&self, now: Instant) -> EffectiveState {
        let snapshot = self.snapshot();
        let overrides = self.overrides.lock();
        EffectiveState::merge(snapshot.as_deref(), overrides.active(now))
    }

    pub fn effective(&self) -> EffectiveState {
        self.effective_at(Instant::now())
    }

    /// Current view, computed fresh rather than read from the channel
    pub fn view(&self) -> ViewState {
        let status = self.status();
        ViewState {
            effective: self.effective(),
            connectivity: status.connectivity,
            consecutive_failures: status.consecutive_failures,
            last_error: status.last_error,
            last_success_at: status.last_success_at,
            revision: self.view_tx.borrow().revision,
        }
    }

    /// Publish if connectivity has aged since the last publish, so a hung
    /// backend becomes visible without any poll completing
    pub(crate) fn refresh_connectivity(&self) {
        let current = self.connectivity();
        if self.view_tx.borrow().connectivity != current {
            debug!("⏳ [STATUS] No fresh status, connectivity now {:?}", current);
            self.publish();
        }
    }

    /// Recompute the view and notify subscribers
    pub fn publish(&self) {
        let mut view = self.view();
        self.view_tx.send_modify(|current| {
            view.revision = current.revision + 1;
            *current = view;
        });
    }

    // ============= Poller side =============

    /// Replace the snapshot after a successful poll, clear the overrides it
    /// confirms and publish
    pub(crate) fn apply_snapshot(&self, snapshot: DeviceSnapshot) {
        let snapshot = Arc::new(snapshot);
        {
            let mut status = self.status.write();
            status.snapshot = Some(snapshot.clone());
            status.connectivity = ConnectivityState::Healthy;
            status.consecutive_failures = 0;
            status.last_error = None;
            status.last_success_at = Some(Utc::now());
            status.last_success = Some(Instant::now());
        }

        let confirmed = self.overrides.lock().reconcile(&snapshot);
        for field in &confirmed {
            debug!("✔️ [OVERRIDE] {} confirmed by status", field);
        }
        self.publish();
    }

    /// Keep the previous snapshot, degrade connectivity and publish
    pub(crate) fn record_failure(&self, error: &GatewayError) {
        {
            let mut status = self.status.write();
            status.connectivity = ConnectivityState::after_failure(status.snapshot.is_some());
            status.consecutive_failures = status.consecutive_failures.saturating_add(1);
            status.last_error = Some(error.to_string());
        }
        self.publish();
    }

    // ============= Dispatcher side =============

    pub(crate) fn with_overrides<R>(&self, f: impl FnOnce(&mut OverrideTable) -> R) -> R {
        f(&mut self.overrides.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_types::{ControlField, FieldValue, LightState};
    use std::time::Duration;

    fn light_snapshot(on: bool) -> DeviceSnapshot {
        DeviceSnapshot {
            light: Some(LightState {
                on: Some(on),
                brightness: Some(40),
                mode: Some("white".to_owned()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_failure_before_any_snapshot_stays_unknown() {
        let state = SharedState::new();
        state.record_failure(&GatewayError::Timeout);

        let status = state.status();
        assert_eq!(status.connectivity, ConnectivityState::Unknown);
        assert_eq!(status.consecutive_failures, 1);
        assert!(status.snapshot.is_none());
    }

    #[test]
    fn test_failure_keeps_snapshot_and_degrades() {
        let state = SharedState::new();
        state.apply_snapshot(light_snapshot(true));
        state.record_failure(&GatewayError::Timeout);

        let status = state.status();
        assert_eq!(status.connectivity, ConnectivityState::Degraded);
        assert_eq!(status.snapshot.unwrap().light_on(), Some(true));
        assert_eq!(status.last_error.as_deref(), Some("request timed out"));
    }

    #[test]
    fn test_snapshot_confirms_override() {
        let state = SharedState::new();
        let now = Instant::now();
        state.with_overrides(|t| {
            t.insert(
                ControlField::LightPower,
                FieldValue::Power(true),
                now,
                Duration::from_secs(8),
            )
        });

        state.apply_snapshot(light_snapshot(false));
        assert!(state.effective().is_overridden(ControlField::LightPower));
        assert_eq!(state.effective().light_on, Some(true));

        state.apply_snapshot(light_snapshot(true));
        assert!(!state.effective().is_overridden(ControlField::LightPower));
        assert_eq!(state.effective().light_on, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_success_degrades_connectivity() {
        let state = SharedState::with_stale_after(Duration::from_secs(6));
        let mut rx = state.subscribe();
        state.apply_snapshot(light_snapshot(true));
        rx.mark_unchanged();

        tokio::time::advance(Duration::from_secs(6)).await;
        state.refresh_connectivity();
        assert_eq!(state.connectivity(), ConnectivityState::Healthy);
        assert!(!rx.has_changed().unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(state.connectivity(), ConnectivityState::Degraded);
        assert_eq!(state.status().consecutive_failures, 0);
        state.refresh_connectivity();
        assert_eq!(rx.borrow_and_update().connectivity, ConnectivityState::Degraded);

        state.apply_snapshot(light_snapshot(true));
        assert_eq!(state.view().connectivity, ConnectivityState::Healthy);
    }

    #[test]
    fn test_publish_bumps_revision() {
        let state = SharedState::new();
        let rx = state.subscribe();

        state.publish();
        state.publish();

        assert_eq!(rx.borrow().revision, 2);
    }
}
