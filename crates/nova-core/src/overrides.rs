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

//! Locally held, time-bounded intended values for control fields.

use std::collections::HashMap;
use tokio::time::{Duration, Instant};

use nova_types::{ControlField, DeviceSnapshot, FieldValue};

/// Intended value shown ahead of confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOverride {
    pub value: FieldValue,
    /// Dispatch order; a higher sequence always supersedes a lower one
    pub seq: u64,
    pub expires_at: Instant,
}

/// At most one override per field; a new dispatch replaces the old one
#[derive(Debug, Default)]
pub struct OverrideTable {
    entries: HashMap<ControlField, PendingOverride>,
    next_seq: u64,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an intended value, replacing any older override for the field.
    /// Returns the dispatch sequence number of the new override.
    pub fn insert(
        &mut self,
        field: ControlField,
        value: FieldValue,
        now: Instant,
        ttl: Duration,
    ) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.entries.insert(
            field,
            PendingOverride {
                value,
                seq,
                expires_at: now + ttl,
            },
        );
        seq
    }

    /// Unexpired override for a field
    pub fn get(&self, field: ControlField, now: Instant) -> Option<&PendingOverride> {
        self.entries
            .get(&field)
            .filter(|entry| entry.expires_at > now)
    }

    /// Unexpired overrides, ready for [`nova_types::EffectiveState::merge`]
    pub fn active(&self, now: Instant) -> impl Iterator<Item = (ControlField, &FieldValue)> {
        self.entries
            .iter()
            .filter(move |(_, entry)| entry.expires_at > now)
            .map(|(field, entry)| (*field, &entry.value))
    }

    /// Whether the override created by dispatch `seq` is still the live one
    pub fn is_current(&self, field: ControlField, seq: u64) -> bool {
        self.entries.get(&field).is_some_and(|entry| entry.seq == seq)
    }

    /// Remove the override for `field` only if it still belongs to dispatch
    /// `seq`. Returns false when it was already confirmed, expired or superseded.
    pub fn remove_if_current(&mut self, field: ControlField, seq: u64) -> bool {
        if self.is_current(field, seq) {
            self.entries.remove(&field);
            true
        } else {
            false
        }
    }

    /// Drop every override the snapshot confirms. Returns the cleared fields.
    pub fn reconcile(&mut self, snapshot: &DeviceSnapshot) -> Vec<ControlField> {
        let confirmed: Vec<ControlField> = self
            .entries
            .iter()
            .filter(|(field, entry)| {
                snapshot
                    .control_value(**field)
                    .is_some_and(|reported| entry.value.confirms(&reported))
            })
            .map(|(field, _)| *field)
            .collect();

        for field in &confirmed {
            self.entries.remove(field);
        }
        confirmed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
