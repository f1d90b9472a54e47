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

use thiserror::Error;

/// Failure of a single backend request
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("backend unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("backend returned error status {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Coarse failure class surfaced to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Network unreachable, connection refused, DNS failure
    Transport,
    /// The backend answered, but not with a usable 2xx response
    Backend,
    Timeout,
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Transport => "offline",
            Self::Backend => "backend error",
            Self::Timeout => "timeout",
        })
    }
}

impl GatewayError {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::NetworkUnavailable(_) | Self::ConfigError(_) => FailureCategory::Transport,
            Self::ServerError { .. } | Self::InvalidResponse(_) => FailureCategory::Backend,
            Self::Timeout => FailureCategory::Timeout,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            Self::ServerError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Self::NetworkUnavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            GatewayError::NetworkUnavailable("refused".to_owned()).category(),
            FailureCategory::Transport
        );
        assert_eq!(
            GatewayError::ServerError {
                status: 502,
                message: String::new()
            }
            .category(),
            FailureCategory::Backend
        );
        assert_eq!(GatewayError::Timeout.category(), FailureCategory::Timeout);
        assert_eq!(FailureCategory::Transport.to_string(), "offline");
    }

    #[test]
    fn test_json_errors_are_invalid_responses() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(
            GatewayError::from(err),
            GatewayError::InvalidResponse(_)
        ));
    }
}
