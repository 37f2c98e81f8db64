// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure classification for requests issued through the pipeline.
///
/// Token-shape and token-expiry problems never surface here — the
/// outbound interceptor degrades them to an unauthenticated request
/// instead (see [`crate::token`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    /// No response was received at all (DNS, connect, broken pipe).
    Network(String),
    /// The request timed out before a response arrived.
    Timeout,
    /// Authentication failed and could not be recovered by a refresh.
    Unauthorized(String),
    /// 4xx application error, server message passed through.
    Api { status: u16, message: String },
    /// 5xx server error.
    Server { status: u16, message: String },
    /// Both refresh strategies failed; the session was invalidated.
    RefreshExhausted,
    /// A response body did not match the expected shape.
    Decode(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK",
            Self::Timeout => "TIMEOUT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Api { .. } => "API_ERROR",
            Self::Server { .. } => "SERVER_ERROR",
            Self::RefreshExhausted => "REFRESH_EXHAUSTED",
            Self::Decode(_) => "DECODE",
        }
    }

    /// True for failures that mean "the session is not valid", as
    /// opposed to transport or application errors.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::RefreshExhausted)
    }

    /// Classify a transport-level failure (no HTTP response received).
    ///
    /// Timeouts are a distinct kind; neither ever triggers a refresh.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Classify a non-2xx response by status code.
    ///
    /// 401 is handled by the pipeline before this is reached; it only
    /// lands here when a retry has already been consumed.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized(message),
            400..=499 => Self::Api { status, message },
            _ => Self::Server { status, message },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Timeout => f.write_str("request timed out"),
            Self::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Self::Api { status, message } => write!(f, "request failed ({status}): {message}"),
            Self::Server { status, message } => write!(f, "server error ({status}): {message}"),
            Self::RefreshExhausted => f.write_str("session expired and could not be refreshed"),
            Self::Decode(msg) => write!(f, "unexpected response shape: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Pull a human-readable message out of an error response body.
///
/// The backend is loose about its envelope: `{"message": ...}`,
/// `{"error": {"message": ...}}` and `{"error": "..."}` all occur.
pub fn server_message(body: &[u8]) -> Option<String> {
    let v: serde_json::Value = serde_json::from_slice(body).ok()?;
    if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
        return Some(msg.to_owned());
    }
    match v.get("error") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(obj) => obj.get("message").and_then(|m| m.as_str()).map(str::to_owned),
        None => None,
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
