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

use std::fmt::Write as _;

use nova_core::{RenderModel, Shown, WeatherView};
use nova_types::{ChatMessage, ChatRole};

const LOADING: &str = "…";

/// Marker for values shown ahead of confirmation
fn pending_mark<T>(shown: &Shown<T>) -> &'static str {
    if shown.is_pending() { " *" } else { "" }
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{v}"))
}

fn weather_line(weather: &WeatherView) -> String {
    let mut line = format!(
        "{} {}  {}°C",
        weather.icon.glyph(),
        weather.location,
        number(weather.temperature)
    );
    if let Some(condition) = &weather.condition {
        let _ = write!(line, "  {condition}");
    }
    let _ = write!(
        line,
        "  ↓{}° ↑{}°  💧{}%  💨{} km/h  {} hPa",
        number(weather.temp_min),
        number(weather.temp_max),
        number(weather.humidity),
        number(weather.wind_speed),
        number(weather.pressure)
    );
    line
}

/// Multi-line dashboard for the terminal
pub fn dashboard(model: &RenderModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}]", model.connectivity.label());

    match &model.weather {
        Shown::Ready { value, .. } => {
            let _ = writeln!(out, "{}", weather_line(value));
        }
        Shown::Loading => {
            let _ = writeln!(out, "Weather {LOADING}");
        }
    }

    let light = &model.light;
    match &light.summary {
        Shown::Ready { value, .. } => {
            let swatch = light
                .color
                .value()
                .and_then(|c| c.swatch)
                .map(|hex| format!(" ({hex})"))
                .unwrap_or_default();
            let _ = write!(out, "💡 {value}{}{swatch}", pending_mark(&light.summary));
        }
        Shown::Loading => {
            let _ = write!(out, "💡 Light {LOADING}");
        }
    }
    out
}

pub fn chat_line(message: &ChatMessage) -> String {
    match message.role {
        ChatRole::User => format!("you  > {}", message.text),
        ChatRole::Assistant => format!("nova > {}", message.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_core::project;
    use nova_types::{ConnectivityState, ControlField, EffectiveState, WeatherReading};
    use std::collections::BTreeSet;

    #[test]
    fn test_loading_dashboard() {
        let model = project(&EffectiveState::default(), ConnectivityState::Unknown);
        assert_eq!(dashboard(&model), "[Connecting…]\nWeather …\n💡 Light …");
    }

    #[test]
    fn test_dashboard_with_pending_light() {
        let state = EffectiveState {
            light_on: Some(true),
            brightness: Some(40),
            color: Some("blue".to_owned()),
            weather: Some(WeatherReading {
                temperature: Some(24.5),
                condition: Some("Clear".to_owned()),
                weather_code: Some(0),
                is_day: Some(true),
                location: Some("Bangalore, India".to_owned()),
                ..Default::default()
            }),
            overridden: BTreeSet::from([ControlField::LightPower]),
        };

        let rendered = dashboard(&project(&state, ConnectivityState::Degraded));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "[Reconnecting…]");
        assert!(lines[1].starts_with("☀️ Bangalore  24.5°C  Clear"));
        assert_eq!(lines[2], "💡 Blue • 40% * (#007AFF)");
    }

    #[test]
    fn test_chat_line() {
        assert_eq!(chat_line(&ChatMessage::user("hi")), "you  > hi");
        assert_eq!(chat_line(&ChatMessage::assistant("Done.")), "nova > Done.");
    }
}
