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

//! Device control commands, validated before they reach the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::state::{ControlField, FieldValue};

/// Rejected user input for a device command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("brightness must be between 0 and 100, got {0}")]
    BrightnessOutOfRange(i64),

    #[error("unknown light color '{0}'. Supported colors: {colors}", colors = LightColor::names())]
    UnknownColor(String),

    #[error("unknown remote button '{0}'. Supported buttons: {buttons}", buttons = RemoteCommand::names())]
    UnknownRemoteButton(String),

    #[error("invalid light command '{0}'")]
    InvalidLightCommand(String),
}

/// Light brightness in percent, always within 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Brightness(u8);

impl Brightness {
    pub const MAX: u8 = 100;

    pub fn new(percent: i64) -> Result<Self, ParseCommandError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= Self::MAX)
            .map(Self)
            .ok_or(ParseCommandError::BrightnessOutOfRange(percent))
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl FromStr for Brightness {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        let percent = trimmed
            .parse::<i64>()
            .map_err(|_| ParseCommandError::InvalidLightCommand(format!("brightness {s}")))?;
        Self::new(percent)
    }
}

/// Color palette offered by the light panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightColor {
    White,
    Warm,
    Red,
    Orange,
    Green,
    Cyan,
    Blue,
    Purple,
}

impl LightColor {
    /// Name sent to the backend (and shown in the UI)
    pub fn name(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Warm => "Warm",
            Self::Red => "Red",
            Self::Orange => "Orange",
            Self::Green => "Green",
            Self::Cyan => "Cyan",
            Self::Blue => "Blue",
            Self::Purple => "Purple",
        }
    }

    /// Swatch color for rendering
    pub fn hex(self) -> &'static str {
        match self {
            Self::White => "#FFFFFF",
            Self::Warm => "#FFD580",
            Self::Red => "#FF4444",
            Self::Orange => "#FF9500",
            Self::Green => "#34C759",
            Self::Cyan => "#5AC8FA",
            Self::Blue => "#007AFF",
            Self::Purple => "#AF52DE",
        }
    }

    pub fn all() -> &'static [LightColor] {
        &[
            Self::White,
            Self::Warm,
            Self::Red,
            Self::Orange,
            Self::Green,
            Self::Cyan,
            Self::Blue,
            Self::Purple,
        ]
    }

    fn names() -> String {
        Self::all()
            .iter()
            .map(|c| c.name().to_lowercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LightColor {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCommandError::UnknownColor(wanted.to_owned()))
    }
}

/// Intent for the ambient light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCommand {
    PowerOn,
    PowerOff,
    SetColor(LightColor),
    SetBrightness(Brightness),
}

impl LightCommand {
    /// Request body for `POST /control/light`
    pub fn payload(&self) -> Value {
        match self {
            Self::PowerOn => json!({"action": "on", "value": null}),
            Self::PowerOff => json!({"action": "off", "value": null}),
            Self::SetColor(color) => json!({"action": "color", "value": color.name()}),
            Self::SetBrightness(level) => {
                json!({"action": "brightness", "value": level.percent()})
            }
        }
    }

    /// The field this command changes and the value it should end up with
    pub fn intended_value(&self) -> (ControlField, FieldValue) {
        match self {
            Self::PowerOn => (ControlField::LightPower, FieldValue::Power(true)),
            Self::PowerOff => (ControlField::LightPower, FieldValue::Power(false)),
            Self::SetColor(color) => (
                ControlField::LightColor,
                FieldValue::Color(color.name().to_owned()),
            ),
            Self::SetBrightness(level) => (
                ControlField::LightBrightness,
                FieldValue::Brightness(level.percent()),
            ),
        }
    }
}

impl fmt::Display for LightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerOn => f.write_str("light on"),
            Self::PowerOff => f.write_str("light off"),
            Self::SetColor(color) => write!(f, "light color {color}"),
            Self::SetBrightness(level) => write!(f, "light brightness {level}"),
        }
    }
}

impl FromStr for LightCommand {
    type Err = ParseCommandError;

    /// Parses `on`, `off`, `color <name>` and `brightness <0-100>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let action = parts.next().unwrap_or_default().to_lowercase();
        let argument = parts.collect::<Vec<_>>().join(" ");

        match (action.as_str(), argument.is_empty()) {
            ("on", true) => Ok(Self::PowerOn),
            ("off", true) => Ok(Self::PowerOff),
            ("color" | "colour", false) => argument.parse().map(Self::SetColor),
            ("brightness", false) => argument.parse().map(Self::SetBrightness),
            _ => Err(ParseCommandError::InvalidLightCommand(s.trim().to_owned())),
        }
    }
}

/// Buttons of the streaming-media remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCommand {
    Up,
    Down,
    Left,
    Right,
    Select,
    Home,
    Back,
    Menu,
    Play,
    Rewind,
    FastForward,
    VolumeUp,
    VolumeDown,
    Mute,
}

impl RemoteCommand {
    /// Wire name used by `POST /control/firestick`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Select => "select",
            Self::Home => "home",
            Self::Back => "back",
            Self::Menu => "menu",
            Self::Play => "play",
            Self::Rewind => "rewind",
            Self::FastForward => "fast_forward",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
            Self::Mute => "mute",
        }
    }

    pub fn all() -> &'static [RemoteCommand] {
        &[
            Self::Up,
            Self::Down,
            Self::Left,
            Self::Right,
            Self::Select,
            Self::Home,
            Self::Back,
            Self::Menu,
            Self::Play,
            Self::Rewind,
            Self::FastForward,
            Self::VolumeUp,
            Self::VolumeDown,
            Self::Mute,
        ]
    }

    /// Request body for `POST /control/firestick`
    pub fn payload(self) -> Value {
        json!({"command": self.as_str()})
    }

    fn names() -> String {
        Self::all()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemoteCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept "fast-forward" and "Fast Forward" as well as the wire name
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ParseCommandError::UnknownRemoteButton(s.trim().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_bounds() {
        assert_eq!(Brightness::new(0).unwrap().percent(), 0);
        assert_eq!(Brightness::new(100).unwrap().percent(), 100);
        assert_eq!(
            Brightness::new(101),
            Err(ParseCommandError::BrightnessOutOfRange(101))
        );
        assert_eq!(
            Brightness::new(-5),
            Err(ParseCommandError::BrightnessOutOfRange(-5))
        );
        assert_eq!("75%".parse::<Brightness>().unwrap().percent(), 75);
    }

    #[test]
    fn test_light_payloads_match_backend_contract() {
        assert_eq!(
            LightCommand::PowerOn.payload(),
            json!({"action": "on", "value": null})
        );
        assert_eq!(
            LightCommand::SetColor(LightColor::Blue).payload(),
            json!({"action": "color", "value": "Blue"})
        );
        assert_eq!(
            LightCommand::SetBrightness(Brightness::new(40).unwrap()).payload(),
            json!({"action": "brightness", "value": 40})
        );
    }

    #[test]
    fn test_parse_light_commands() {
        assert_eq!("ON".parse::<LightCommand>().unwrap(), LightCommand::PowerOn);
        assert_eq!(
            "color purple".parse::<LightCommand>().unwrap(),
            LightCommand::SetColor(LightColor::Purple)
        );
        assert_eq!(
            "brightness 30".parse::<LightCommand>().unwrap(),
            LightCommand::SetBrightness(Brightness::new(30).unwrap())
        );
        assert!(matches!(
            "color magenta".parse::<LightCommand>(),
            Err(ParseCommandError::UnknownColor(_))
        ));
        assert!(matches!(
            "on now".parse::<LightCommand>(),
            Err(ParseCommandError::InvalidLightCommand(_))
        ));
    }

    #[test]
    fn test_intended_values() {
        assert_eq!(
            LightCommand::PowerOff.intended_value(),
            (ControlField::LightPower, FieldValue::Power(false))
        );
        assert_eq!(
            LightCommand::SetColor(LightColor::Warm).intended_value(),
            (
                ControlField::LightColor,
                FieldValue::Color("Warm".to_owned())
            )
        );
    }

    #[test]
    fn test_parse_remote_buttons() {
        assert_eq!(
            "fast-forward".parse::<RemoteCommand>().unwrap(),
            RemoteCommand::FastForward
        );
        assert_eq!(
            "volume_up".parse::<RemoteCommand>().unwrap(),
            RemoteCommand::VolumeUp
        );
        assert_eq!(
            RemoteCommand::Mute.payload(),
            json!({"command": "mute"})
        );
        let err = "power".parse::<RemoteCommand>().unwrap_err();
        assert!(err.to_string().contains("fast_forward"));
    }

    #[test]
    fn test_remote_wire_names_match_serde() {
        for command in RemoteCommand::all() {
            assert_eq!(
                serde_json::to_value(command).unwrap(),
                json!(command.as_str())
            );
        }
    }
}
