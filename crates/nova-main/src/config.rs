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

mod validation;

pub use validation::{ValidationIssue, ValidationResult};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use nova_gateway::client::DEFAULT_BACKEND_URL;
use nova_types::{ClientConfig, ReplyTarget};

const KNOWN_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub commands: CommandsConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub system: SystemConfig,
}

/// Where the home backend lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. "http://192.168.1.20:8000"
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Status poll interval (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// How long an unconfirmed command stays visible (milliseconds)
    #[serde(default = "default_override_timeout_ms")]
    pub override_timeout_ms: u64,

    /// Drop the shown intent as soon as a command fails
    #[serde(default)]
    pub revert_on_failure: bool,

    /// Poll right after a command or chat reply succeeds
    #[serde(default = "default_true")]
    pub refresh_after_command: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Where assistant replies are spoken: "esp" (satellite speaker) or "local"
    #[serde(default)]
    pub reply_target: ReplyTarget,

    #[serde(default = "default_error_placeholder")]
    pub error_placeholder: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_owned()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_override_timeout_ms() -> u64 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_error_placeholder() -> String {
    nova_types::config::DEFAULT_CHAT_ERROR_PLACEHOLDER.to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            override_timeout_ms: default_override_timeout_ms(),
            revert_on_failure: false,
            refresh_after_command: true,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_target: ReplyTarget::default(),
            error_placeholder: default_error_placeholder(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration: the explicit path if given, else `config.toml`,
    /// else `config.json`, else defaults. Environment overrides apply last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(explicit, Path::new("."), |key| std::env::var(key).ok())
    }

    fn load_from(
        explicit: Option<&Path>,
        search_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = if let Some(path) = explicit {
            Self::from_file(path)?
        } else if let Some(path) = ["config.toml", "config.json"]
            .iter()
            .map(|name| search_dir.join(name))
            .find(|path| path.is_file())
        {
            Self::from_file(&path)?
        } else {
            warn!("No configuration file found, using defaults with environment overrides");
            Self::default()
        };

        config.apply_env_overrides(env);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML or JSON file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };

        info!("✅ Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(url) = env("NOVA_BACKEND_URL") {
            self.backend.url = url;
        }

        if let Some(interval) = env("NOVA_POLL_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(ms) => self.polling.interval_ms = ms,
                Err(_) => warn!("Ignoring NOVA_POLL_INTERVAL_MS={interval}: not a number"),
            }
        }

        if let Some(level) = env("NOVA_LOG_LEVEL") {
            self.system.log_level = level;
        }
    }

    /// Validate configuration with field-level error reporting
    pub fn validate_detailed(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        let url = self.backend.url.trim();
        if url.is_empty() {
            result.add_error("backend.url", "Backend URL cannot be empty");
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            result.add_error("backend.url", "Backend URL must start with http:// or https://");
        }

        if self.backend.request_timeout_secs == 0 {
            result.add_error("backend.request_timeout_secs", "Request timeout must be positive");
        }

        if self.polling.interval_ms == 0 {
            result.add_error("polling.interval_ms", "Poll interval must be positive");
        } else if self.polling.interval_ms < 500 {
            result.add_warning(
                "polling.interval_ms",
                "Poll intervals under 500 ms put noticeable load on the backend",
            );
        }

        if self.commands.override_timeout_ms == 0 {
            result.add_error("commands.override_timeout_ms", "Override timeout must be positive");
        } else if self.commands.override_timeout_ms < self.polling.interval_ms {
            result.add_error(
                "commands.override_timeout_ms",
                "Override timeout must not be shorter than the poll interval",
            );
        }

        if !KNOWN_LOG_LEVELS.contains(&self.system.log_level.to_lowercase().as_str()) {
            result.add_error(
                "system.log_level",
                format!(
                    "Unknown log level '{}' (expected one of {})",
                    self.system.log_level,
                    KNOWN_LOG_LEVELS.join(", ")
                ),
            );
        }

        result
    }

    /// Validate configuration, failing on the first reported error
    pub fn validate(&self) -> Result<()> {
        let result = self.validate_detailed();
        for issue in &result.warnings {
            warn!("⚠️ Config: {}", issue);
        }
        if let Some(issue) = result.errors.first() {
            anyhow::bail!("Invalid configuration: {issue}");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }
}

impl From<&AppConfig> for ClientConfig {
    fn from(app: &AppConfig) -> Self {
        Self {
            poll_interval: app.poll_interval(),
            override_timeout: Duration::from_millis(app.commands.override_timeout_ms),
            revert_on_failure: app.commands.revert_on_failure,
            refresh_after_command: app.commands.refresh_after_command,
            chat_error_placeholder: app.chat.error_placeholder.clone(),
            default_reply_target: app.chat.reply_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend.url, "http://localhost:8000");
        assert_eq!(config.polling.interval_ms, 2000);
        assert_eq!(config.commands.override_timeout_ms, 8000);
        assert!(!config.commands.revert_on_failure);
        assert!(config.commands.refresh_after_command);
        assert_eq!(config.chat.reply_target, ReplyTarget::Esp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_config_conversion() {
        let mut config = AppConfig::default();
        config.polling.interval_ms = 1500;
        config.commands.revert_on_failure = true;
        config.chat.reply_target = ReplyTarget::Local;

        let client = ClientConfig::from(&config);
        assert_eq!(client.poll_interval, Duration::from_millis(1500));
        assert_eq!(client.override_timeout, Duration::from_secs(8));
        assert!(client.revert_on_failure);
        assert_eq!(client.default_reply_target, ReplyTarget::Local);
        assert_eq!(client.chat_error_placeholder, "Error connecting to AI.");
    }

    #[test]
    fn test_validate_bad_url() {
        let mut config = AppConfig::default();
        config.backend.url = "localhost:8000".to_owned();
        assert!(config.validate_detailed().has_error_for("backend.url"));

        config.backend.url = "  ".to_owned();
        assert!(config.validate_detailed().has_error_for("backend.url"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_intervals() {
        let mut config = AppConfig::default();
        config.polling.interval_ms = 0;
        config.backend.request_timeout_secs = 0;
        let result = config.validate_detailed();
        assert!(result.has_error_for("polling.interval_ms"));
        assert!(result.has_error_for("backend.request_timeout_secs"));

        let mut config = AppConfig::default();
        config.polling.interval_ms = 5000;
        config.commands.override_timeout_ms = 4000;
        assert!(
            config
                .validate_detailed()
                .has_error_for("commands.override_timeout_ms")
        );
    }

    #[test]
    fn test_fast_polling_is_only_a_warning() {
        let mut config = AppConfig::default();
        config.polling.interval_ms = 250;
        let result = config.validate_detailed();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = AppConfig::default();
        config.system.log_level = "DEBUG".to_owned();
        assert!(config.validate_detailed().is_valid());

        config.system.log_level = "loud".to_owned();
        let result = config.validate_detailed();
        assert!(result.has_error_for("system.log_level"));
        assert!(result.errors[0].to_string().starts_with("system.log_level: Unknown log level"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [backend]
            url = "http://192.168.1.20:8000"

            [chat]
            reply_target = "local"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.url, "http://192.168.1.20:8000");
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert_eq!(config.polling.interval_ms, 2000);
        assert_eq!(config.chat.reply_target, ReplyTarget::Local);
        assert_eq!(config.system.log_level, "info");
    }

    #[test]
    fn test_load_prefers_toml_over_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[polling]\ninterval_ms = 3000\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"polling": {"interval_ms": 4000}}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(None, dir.path(), no_env).unwrap();
        assert_eq!(config.polling.interval_ms, 3000);
    }

    #[test]
    fn test_load_falls_back_to_json_then_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(None, dir.path(), no_env).unwrap();
        assert_eq!(config, AppConfig::default());

        std::fs::write(
            dir.path().join("config.json"),
            r#"{"commands": {"revert_on_failure": true}}"#,
        )
        .unwrap();
        let config = AppConfig::load_from(None, dir.path(), no_env).unwrap();
        assert!(config.commands.revert_on_failure);
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[polling]\ninterval_ms = 3000\n").unwrap();
        let explicit = dir.path().join("custom.json");
        std::fs::write(&explicit, r#"{"polling": {"interval_ms": 1000}}"#).unwrap();

        let config = AppConfig::load_from(Some(&explicit), dir.path(), no_env).unwrap();
        assert_eq!(config.polling.interval_ms, 1000);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = AppConfig::load_from(Some(&missing), dir.path(), no_env).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[polling\n").unwrap();
        let err = AppConfig::load_from(None, dir.path(), no_env).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let vars = HashMap::from([
            ("NOVA_BACKEND_URL", "https://home.example:8443"),
            ("NOVA_POLL_INTERVAL_MS", "1000"),
            ("NOVA_LOG_LEVEL", "debug"),
        ]);

        let config = AppConfig::load_from(None, dir.path(), |key| {
            vars.get(key).map(|v| (*v).to_owned())
        })
        .unwrap();

        assert_eq!(config.backend.url, "https://home.example:8443");
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.system.log_level, "debug");
    }

    #[test]
    fn test_invalid_env_override_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load_from(None, dir.path(), |key| {
            (key == "NOVA_BACKEND_URL").then(|| "ftp://nas".to_owned())
        });
        assert!(result.is_err());
    }
}
