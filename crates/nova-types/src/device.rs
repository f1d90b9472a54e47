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

//! Device status payloads as reported by `GET /status`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Complete status payload returned by the backend.
///
/// Replaced wholesale on every successful poll. Every section is optional so a
/// backend that only knows about some devices still produces a usable snapshot,
/// and a section that fails to decode is dropped without taking the others with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    #[serde(default)]
    pub weather: Option<WeatherReading>,

    #[serde(default)]
    pub light: Option<LightState>,

    /// Device sections this client does not interpret, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceSnapshot {
    /// Decode a snapshot from the raw `/status` JSON body.
    ///
    /// Only a body that is not a JSON object is an error. A malformed `weather`
    /// or `light` section decodes as `None`.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let mut extra = match value {
            Value::Object(map) => map,
            other => return serde_json::from_value(other),
        };
        Ok(Self {
            weather: extra.remove("weather").and_then(decode_section),
            light: extra.remove("light").and_then(decode_section),
            extra,
        })
    }

    /// Light power as reported, if the backend reported it
    pub fn light_on(&self) -> Option<bool> {
        self.light.as_ref().and_then(|l| l.on)
    }

    pub fn light_brightness(&self) -> Option<u8> {
        self.light.as_ref().and_then(|l| l.brightness)
    }

    /// Active color name (the backend calls it `mode`)
    pub fn light_mode(&self) -> Option<&str> {
        self.light.as_ref().and_then(|l| l.mode.as_deref())
    }
}

/// Weather readout for the configured location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    #[serde(default, deserialize_with = "deserialize_number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub temp_min: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub temp_max: Option<f64>,
    /// Relative humidity (percent)
    #[serde(default, deserialize_with = "deserialize_number")]
    pub humidity: Option<f64>,
    /// Wind speed (km/h)
    #[serde(default, deserialize_with = "deserialize_number")]
    pub wind_speed: Option<f64>,
    /// Air pressure (hPa)
    #[serde(default, deserialize_with = "deserialize_number")]
    pub pressure: Option<f64>,
    /// Human-readable condition text, e.g. "Partly cloudy"
    #[serde(default)]
    pub condition: Option<String>,
    /// WMO weather interpretation code
    #[serde(default)]
    pub weather_code: Option<i64>,
    /// Day/night flag; the backend sends `1`/`0`, older builds sent booleans
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_day: Option<bool>,
    /// Location label, e.g. "Bangalore, Karnataka, India"
    #[serde(default)]
    pub location: Option<String>,
}

/// Ambient light state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    #[serde(default)]
    pub on: Option<bool>,
    /// Brightness (0-100%). Fractional values are rounded, out-of-range ones clamped.
    #[serde(default, deserialize_with = "deserialize_percent")]
    pub brightness: Option<u8>,
    /// Active color name, lower-case as reported by the bulb bridge
    #[serde(default)]
    pub mode: Option<String>,
}

fn decode_section<T: serde::de::DeserializeOwned>(value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value).ok()
}

fn deserialize_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64).filter(|n| n.is_finite()))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "clamped to 0..=100 before the cast"
)]
fn deserialize_percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_number(deserializer)?;
    Ok(value.map(|n| n.round().clamp(0.0, 100.0) as u8))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0),
        Some(Value::Null | Value::String(_) | Value::Array(_) | Value::Object(_)) | None => None,
    })
}
