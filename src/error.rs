//! Error model for the session and gating layers.
//! `AuthError` covers everything the profile/logout API can report; the bootstrapper
//! folds all of it into session state so the route gate never sees a raw error.
//! `ConfigError` covers environment and route table loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthError {
    /// The API answered definitively: no valid credential (no token, 401, 403).
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("network error: {message}")]
    Network { message: String },
    /// Response arrived but could not be trusted as a profile (missing id/role, bad JSON).
    #[error("malformed profile response: {message}")]
    Malformed { message: String },
    #[error("profile request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

impl AuthError {
    pub fn network<S: Into<String>>(msg: S) -> Self { AuthError::Network { message: msg.into() } }
    pub fn malformed<S: Into<String>>(msg: S) -> Self { AuthError::Malformed { message: msg.into() } }
    pub fn timeout(after: Duration) -> Self { AuthError::Timeout { after_ms: after.as_millis() as u64 } }

    pub fn code_str(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Network { .. } => "network_error",
            AuthError::Malformed { .. } => "malformed_profile",
            AuthError::Timeout { .. } => "timeout",
        }
    }

    /// True when the failure is a definitive "not logged in" rather than a transport
    /// or parsing problem. Only definitive failures settle the session as `Resolved`.
    pub fn is_definitive(&self) -> bool {
        matches!(self, AuthError::Unauthenticated)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AuthError::malformed(err.to_string());
        }
        if let Some(status) = err.status() {
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                return AuthError::Unauthenticated;
            }
        }
        AuthError::network(err.to_string())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("invalid route table json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid route '{pattern}': {reason}")]
    InvalidRoute { pattern: String, reason: String },
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    pub fn route<P: Into<String>, R: Into<String>>(pattern: P, reason: R) -> Self {
        ConfigError::InvalidRoute { pattern: pattern.into(), reason: reason.into() }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
