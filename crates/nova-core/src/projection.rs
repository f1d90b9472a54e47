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

//! Pure mapping from effective state to what a front end shows.

use nova_types::{ConnectivityState, ControlField, EffectiveState, LightColor, WeatherReading};

/// Location label used when the backend reports none
pub const DEFAULT_LOCATION: &str = "Bangalore";

/// A displayed field: still loading, or a value possibly awaiting confirmation
#[derive(Debug, Clone, PartialEq)]
pub enum Shown<T> {
    Loading,
    Ready { value: T, pending: bool },
}

impl<T> Shown<T> {
    fn from_option(value: Option<T>, pending: bool) -> Self {
        match value {
            Some(value) => Self::Ready { value, pending },
            None => Self::Loading,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ready { value, .. } => Some(value),
            Self::Loading => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Ready { pending: true, .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Sun,
    Moon,
    Cloud,
    Fog,
    Rain,
    Snow,
    Thunderstorm,
    Thermometer,
}

impl WeatherIcon {
    /// Icon for a WMO weather code
    pub fn for_code(code: i64, is_day: bool) -> Self {
        match code {
            0 if is_day => Self::Sun,
            0 => Self::Moon,
            1..=3 => Self::Cloud,
            45..=48 => Self::Fog,
            51..=67 => Self::Rain,
            71..=77 => Self::Snow,
            95.. => Self::Thunderstorm,
            _ => Self::Thermometer,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Sun => "☀️",
            Self::Moon => "🌙",
            Self::Cloud => "☁️",
            Self::Fog => "🌫️",
            Self::Rain => "🌧️",
            Self::Snow => "🌨️",
            Self::Thunderstorm => "⛈️",
            Self::Thermometer => "🌡️",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub location: String,
    pub temperature: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub condition: Option<String>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
    pub icon: WeatherIcon,
}

impl WeatherView {
    fn from_reading(reading: &WeatherReading) -> Self {
        Self {
            location: location_label(reading.location.as_deref()),
            temperature: reading.temperature,
            temp_min: reading.temp_min,
            temp_max: reading.temp_max,
            condition: reading.condition.clone(),
            humidity: reading.humidity,
            wind_speed: reading.wind_speed,
            pressure: reading.pressure,
            icon: reading.weather_code.map_or(WeatherIcon::Thermometer, |code| {
                WeatherIcon::for_code(code, reading.is_day.unwrap_or(true))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorView {
    /// Capitalized mode name, e.g. "Blue"
    pub label: String,
    /// Palette swatch, when the mode is one of the known colors
    pub swatch: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightView {
    pub power: Shown<bool>,
    pub brightness: Shown<u8>,
    pub color: Shown<ColorView>,
    /// "Blue • 40%" when on, "Off" when off
    pub summary: Shown<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityView {
    Online,
    Reconnecting,
    Connecting,
}

impl ConnectivityView {
    pub fn label(self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Reconnecting => "Reconnecting…",
            Self::Connecting => "Connecting…",
        }
    }
}

impl From<ConnectivityState> for ConnectivityView {
    fn from(state: ConnectivityState) -> Self {
        match state {
            ConnectivityState::Healthy => Self::Online,
            ConnectivityState::Degraded => Self::Reconnecting,
            ConnectivityState::Unknown => Self::Connecting,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
    pub weather: Shown<WeatherView>,
    pub light: LightView,
    pub connectivity: ConnectivityView,
}

pub fn project(state: &EffectiveState, connectivity: ConnectivityState) -> RenderModel {
    let power_pending = state.is_overridden(ControlField::LightPower);
    let brightness_pending = state.is_overridden(ControlField::LightBrightness);
    let color_pending = state.is_overridden(ControlField::LightColor);

    let color = state.color.as_deref().map(color_view);
    // An "on" summary waits for a brightness rather than guessing one
    let summary = state.light_on.and_then(|on| {
        if on {
            let label = color.as_ref().map_or("White", |c| c.label.as_str());
            state
                .brightness
                .map(|brightness| format!("{label} • {brightness}%"))
        } else {
            Some("Off".to_owned())
        }
    });
    let summary_pending = power_pending
        || (state.light_on == Some(true) && (brightness_pending || color_pending));

    RenderModel {
        weather: Shown::from_option(state.weather.as_ref().map(WeatherView::from_reading), false),
        light: LightView {
            power: Shown::from_option(state.light_on, power_pending),
            brightness: Shown::from_option(state.brightness, brightness_pending),
            color: Shown::from_option(color, color_pending),
            summary: Shown::from_option(summary, summary_pending),
        },
        connectivity: connectivity.into(),
    }
}

fn location_label(location: Option<&str>) -> String {
    location
        .and_then(|l| l.split(',').next())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LOCATION)
        .to_owned()
}

fn color_view(mode: &str) -> ColorView {
    let mode = mode.trim().to_lowercase();
    let mut chars = mode.chars();
    let label = chars.next().map_or_else(
        || "White".to_owned(),
        |first| first.to_uppercase().chain(chars).collect(),
    );
    let swatch = label.parse::<LightColor>().ok().map(LightColor::hex);
    ColorView { label, swatch }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn light(on: bool, brightness: u8, color: &str) -> EffectiveState {
        EffectiveState {
            light_on: Some(on),
            brightness: Some(brightness),
            color: Some(color.to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn test_weather_icons() {
        assert_eq!(WeatherIcon::for_code(0, true), WeatherIcon::Sun);
        assert_eq!(WeatherIcon::for_code(0, false), WeatherIcon::Moon);
        assert_eq!(WeatherIcon::for_code(2, false), WeatherIcon::Cloud);
        assert_eq!(WeatherIcon::for_code(45, true), WeatherIcon::Fog);
        assert_eq!(WeatherIcon::for_code(61, true), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::for_code(75, true), WeatherIcon::Snow);
        assert_eq!(WeatherIcon::for_code(99, true), WeatherIcon::Thunderstorm);
        assert_eq!(WeatherIcon::for_code(80, true), WeatherIcon::Thermometer);
        assert_eq!(WeatherIcon::for_code(-1, true), WeatherIcon::Thermometer);
    }

    #[test]
    fn test_location_label() {
        assert_eq!(location_label(Some("Bangalore, India")), "Bangalore");
        assert_eq!(location_label(Some("Prague")), "Prague");
        assert_eq!(location_label(Some("")), DEFAULT_LOCATION);
        assert_eq!(location_label(None), DEFAULT_LOCATION);
    }

    #[test]
    fn test_empty_state_is_loading() {
        let model = project(&EffectiveState::default(), ConnectivityState::Unknown);

        assert!(model.weather.is_loading());
        assert!(model.light.power.is_loading());
        assert!(model.light.summary.is_loading());
        assert_eq!(model.connectivity.label(), "Connecting…");
    }

    #[test]
    fn test_light_summary() {
        let model = project(&light(true, 40, "blue"), ConnectivityState::Healthy);
        assert_eq!(model.light.summary.value().map(String::as_str), Some("Blue • 40%"));
        assert_eq!(
            model.light.color.value(),
            Some(&ColorView {
                label: "Blue".to_owned(),
                swatch: Some("#007AFF")
            })
        );
        assert_eq!(model.connectivity, ConnectivityView::Online);

        let model = project(&light(false, 40, "blue"), ConnectivityState::Degraded);
        assert_eq!(model.light.summary.value().map(String::as_str), Some("Off"));
        assert_eq!(model.connectivity.label(), "Reconnecting…");
    }

    #[test]
    fn test_summary_waits_for_brightness() {
        let state = EffectiveState {
            light_on: Some(true),
            color: Some("blue".to_owned()),
            ..Default::default()
        };
        let model = project(&state, ConnectivityState::Healthy);
        assert!(model.light.summary.is_loading());
        assert!(model.light.brightness.is_loading());
        assert_eq!(model.light.power.value(), Some(&true));

        let state = EffectiveState {
            light_on: Some(false),
            ..Default::default()
        };
        let model = project(&state, ConnectivityState::Healthy);
        assert_eq!(model.light.summary.value().map(String::as_str), Some("Off"));
    }

    #[test]
    fn test_unknown_mode_has_no_swatch() {
        let model = project(&light(true, 10, "RAINBOW"), ConnectivityState::Healthy);
        let color = model.light.color.value().unwrap();
        assert_eq!(color.label, "Rainbow");
        assert_eq!(color.swatch, None);
    }

    #[test]
    fn test_pending_markers_follow_overrides() {
        let mut state = light(true, 90, "white");
        state.overridden = BTreeSet::from([ControlField::LightBrightness]);

        let model = project(&state, ConnectivityState::Healthy);
        assert!(model.light.brightness.is_pending());
        assert!(!model.light.power.is_pending());
        assert!(!model.light.color.is_pending());
        assert!(model.light.summary.is_pending());
    }

    #[test]
    fn test_weather_view() {
        let state = EffectiveState {
            weather: Some(WeatherReading {
                temperature: Some(24.0),
                weather_code: Some(0),
                is_day: Some(false),
                location: Some("Bangalore, India".to_owned()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let model = project(&state, ConnectivityState::Healthy);
        let weather = model.weather.value().unwrap();
        assert_eq!(weather.icon, WeatherIcon::Moon);
        assert_eq!(weather.location, "Bangalore");
        assert_eq!(weather.temperature, Some(24.0));
        assert!(!model.weather.is_pending());
    }
}
