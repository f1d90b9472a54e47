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

//! Fixtures shared by the end-to-end tests: a session wired to a real
//! [`BackendClient`] pointed at a mock server.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use nova_core::{AudioSink, ClientSession};
use nova_gateway::{AudioPayload, BackendClient};
use nova_types::ClientConfig;
use serde_json::{Value, json};

/// Session tuning for tests: no automatic refresh, so each test controls
/// exactly which status requests happen
pub fn test_config() -> ClientConfig {
    ClientConfig {
        poll_interval: Duration::from_millis(500),
        refresh_after_command: false,
        ..Default::default()
    }
}

pub fn status_body(on: bool, brightness: u8, mode: &str) -> String {
    json!({
        "weather": {
            "temperature": 24.0,
            "temp_min": 19.0,
            "temp_max": 29.0,
            "humidity": 61,
            "wind_speed": 12.5,
            "pressure": 1012,
            "condition": "Clear sky",
            "weather_code": 0,
            "is_day": 1,
            "location": "Bangalore, India"
        },
        "light": {"on": on, "brightness": brightness, "mode": mode},
        "firestick": {"connected": true}
    })
    .to_string()
}

/// Audio sink that keeps everything it is asked to play
#[derive(Debug, Default)]
pub struct RecordingSink {
    played: Mutex<Vec<AudioPayload>>,
}

impl RecordingSink {
    pub fn played(&self) -> Vec<AudioPayload> {
        self.played.lock().clone()
    }
}

impl AudioSink for RecordingSink {
    fn play(&self, audio: AudioPayload) {
        self.played.lock().push(audio);
    }
}

pub fn connect(base_url: &str, config: ClientConfig) -> ClientSession {
    connect_with_sink(base_url, config, Arc::new(RecordingSink::default()))
}

pub fn connect_with_sink(
    base_url: &str,
    config: ClientConfig,
    sink: Arc<dyn AudioSink>,
) -> ClientSession {
    let client = BackendClient::with_timeout(base_url, Duration::from_secs(2))
        .unwrap_or_else(|e| panic!("mock server URL rejected: {e}"));
    ClientSession::with_audio_sink(Arc::new(client), config, sink)
}

pub fn light_body(action: &str, value: Value) -> Value {
    json!({"action": action, "value": value})
}
