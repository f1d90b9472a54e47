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

//! Control fields, connectivity and the merged (effective) device state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::device::{DeviceSnapshot, WeatherReading};

/// Device fields the user can change ahead of confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlField {
    LightPower,
    LightBrightness,
    LightColor,
}

impl fmt::Display for ControlField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LightPower => "light power",
            Self::LightBrightness => "light brightness",
            Self::LightColor => "light color",
        })
    }
}

/// Value of a [`ControlField`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Power(bool),
    Brightness(u8),
    Color(String),
}

impl FieldValue {
    /// Whether a reported value confirms an intended one.
    ///
    /// Colors compare case-insensitively: the client sends "Blue", the bulb
    /// bridge reports "blue".
    pub fn confirms(&self, reported: &FieldValue) -> bool {
        match (self, reported) {
            (Self::Color(intended), Self::Color(actual)) => intended.eq_ignore_ascii_case(actual),
            (intended, actual) => intended == actual,
        }
    }
}

impl DeviceSnapshot {
    /// Reported value of a control field, if present in this snapshot
    pub fn control_value(&self, field: ControlField) -> Option<FieldValue> {
        match field {
            ControlField::LightPower => self.light_on().map(FieldValue::Power),
            ControlField::LightBrightness => self.light_brightness().map(FieldValue::Brightness),
            ControlField::LightColor => self
                .light_mode()
                .map(|mode| FieldValue::Color(mode.to_owned())),
        }
    }
}

/// Health of the status feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// No snapshot has ever been received
    #[default]
    Unknown,
    /// Last poll succeeded within the expected interval
    Healthy,
    /// Last poll failed or is overdue; the previous snapshot is still shown
    Degraded,
}

impl ConnectivityState {
    /// State after a failed poll
    pub fn after_failure(has_snapshot: bool) -> Self {
        if has_snapshot {
            Self::Degraded
        } else {
            Self::Unknown
        }
    }

    /// Healthy decays to Degraded once the last success is too old
    pub fn aged(self, stale: bool) -> Self {
        match self {
            Self::Healthy if stale => Self::Degraded,
            other @ (Self::Healthy | Self::Degraded | Self::Unknown) => other,
        }
    }
}

/// What the UI renders: snapshot values with pending overrides laid on top.
///
/// Never stored; rebuilt from the latest snapshot and the active overrides
/// whenever either changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveState {
    pub light_on: Option<bool>,
    pub brightness: Option<u8>,
    pub color: Option<String>,
    pub weather: Option<WeatherReading>,
    /// Fields whose value currently comes from an unconfirmed override
    pub overridden: BTreeSet<ControlField>,
}

impl EffectiveState {
    pub fn merge<'a>(
        snapshot: Option<&DeviceSnapshot>,
        overrides: impl IntoIterator<Item = (ControlField, &'a FieldValue)>,
    ) -> Self {
        let mut state = Self {
            light_on: snapshot.and_then(DeviceSnapshot::light_on),
            brightness: snapshot.and_then(DeviceSnapshot::light_brightness),
            color: snapshot
                .and_then(DeviceSnapshot::light_mode)
                .map(str::to_owned),
            weather: snapshot.and_then(|s| s.weather.clone()),
            overridden: BTreeSet::new(),
        };

        for (field, value) in overrides {
            let applied = match (field, value) {
                (ControlField::LightPower, FieldValue::Power(on)) => {
                    state.light_on = Some(*on);
                    true
                }
                (ControlField::LightBrightness, FieldValue::Brightness(level)) => {
                    state.brightness = Some(*level);
                    true
                }
                (ControlField::LightColor, FieldValue::Color(name)) => {
                    state.color = Some(name.clone());
                    true
                }
                // A value for the wrong field is never produced by LightCommand
                (
                    ControlField::LightPower | ControlField::LightBrightness | ControlField::LightColor,
                    FieldValue::Power(_) | FieldValue::Brightness(_) | FieldValue::Color(_),
                ) => false,
            };
            if applied {
                state.overridden.insert(field);
            }
        }

        state
    }

    pub fn is_overridden(&self, field: ControlField) -> bool {
        self.overridden.contains(&field)
    }

    /// Value of a control field as it would be rendered
    pub fn value(&self, field: ControlField) -> Option<FieldValue> {
        match field {
            ControlField::LightPower => self.light_on.map(FieldValue::Power),
            ControlField::LightBrightness => self.brightness.map(FieldValue::Brightness),
            ControlField::LightColor => self.color.clone().map(FieldValue::Color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::LightState;

    fn snapshot(on: bool, brightness: u8, mode: &str) -> DeviceSnapshot {
        DeviceSnapshot {
            light: Some(LightState {
                on: Some(on),
                brightness: Some(brightness),
                mode: Some(mode.to_owned()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_without_overrides_follows_snapshot() {
        let snap = snapshot(false, 40, "white");
        let state = EffectiveState::merge(Some(&snap), []);

        assert_eq!(state.light_on, Some(false));
        assert_eq!(state.brightness, Some(40));
        assert_eq!(state.color.as_deref(), Some("white"));
        assert!(state.overridden.is_empty());
    }

    #[test]
    fn test_merge_override_wins() {
        let snap = snapshot(false, 40, "white");
        let power = FieldValue::Power(true);
        let state = EffectiveState::merge(Some(&snap), [(ControlField::LightPower, &power)]);

        assert_eq!(state.light_on, Some(true));
        assert_eq!(state.brightness, Some(40));
        assert!(state.is_overridden(ControlField::LightPower));
        assert!(!state.is_overridden(ControlField::LightBrightness));
    }

    #[test]
    fn test_merge_without_snapshot() {
        let level = FieldValue::Brightness(70);
        let state = EffectiveState::merge(None, [(ControlField::LightBrightness, &level)]);

        assert_eq!(state.light_on, None);
        assert_eq!(state.brightness, Some(70));
        assert!(state.weather.is_none());
    }

    #[test]
    fn test_mismatched_override_is_ignored() {
        let wrong = FieldValue::Color("Red".to_owned());
        let state = EffectiveState::merge(None, [(ControlField::LightPower, &wrong)]);

        assert_eq!(state.light_on, None);
        assert!(state.overridden.is_empty());
    }

    #[test]
    fn test_color_confirmation_is_case_insensitive() {
        let intended = FieldValue::Color("Blue".to_owned());
        assert!(intended.confirms(&FieldValue::Color("blue".to_owned())));
        assert!(!intended.confirms(&FieldValue::Color("red".to_owned())));
        assert!(FieldValue::Power(true).confirms(&FieldValue::Power(true)));
        assert!(!FieldValue::Power(true).confirms(&FieldValue::Brightness(1)));
    }

    #[test]
    fn test_connectivity_after_failure() {
        assert_eq!(
            ConnectivityState::after_failure(true),
            ConnectivityState::Degraded
        );
        assert_eq!(
            ConnectivityState::after_failure(false),
            ConnectivityState::Unknown
        );
    }

    #[test]
    fn test_connectivity_ages_only_when_healthy() {
        assert_eq!(ConnectivityState::Healthy.aged(true), ConnectivityState::Degraded);
        assert_eq!(ConnectivityState::Healthy.aged(false), ConnectivityState::Healthy);
        assert_eq!(ConnectivityState::Unknown.aged(true), ConnectivityState::Unknown);
    }
}
