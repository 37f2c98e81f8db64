// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token inspection.
//!
//! One shared, pure decode over the three-segment token format,
//! consumed by the outbound interceptor, the token store, and the
//! session signal. The source of truth for validity is the `exp`
//! claim; a token that cannot be decoded is never treated as live.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Strings shorter than this are never treated as a candidate token.
pub const MIN_TOKEN_LEN: usize = 20;

/// Role claim, from a small closed set the backend issues.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Customer,
    Waiter,
    Admin,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Customer => "customer",
            Self::Waiter => "waiter",
            Self::Admin => "admin",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims encoded in the token's middle segment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Subject id.
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    /// Issued-at, seconds since epoch.
    #[serde(default)]
    pub iat: Option<u64>,
    /// Expiry, seconds since epoch.
    pub exp: u64,
}

/// Outcome of inspecting a token string against a clock reading.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenState {
    Valid(Claims),
    /// Not three dot-separated segments, or implausibly short.
    Malformed,
    /// Three segments, but the payload does not base64/JSON-decode.
    /// Kept distinct from [`TokenState::Malformed`] because the
    /// outbound interceptor still attaches such a token (the server
    /// may understand an encoding we do not), while shape errors drop
    /// it outright.
    Undecodable,
    /// Decoded fine, `exp` is at or before `now`.
    Expired,
}

/// Decode a token string. Pure: the clock reading is a parameter.
pub fn decode(token: &str, now: u64) -> TokenState {
    if token.len() < MIN_TOKEN_LEN {
        return TokenState::Malformed;
    }
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return TokenState::Malformed;
    }
    let payload = segments[1].trim_end_matches('=');
    let Some(bytes) = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .or_else(|| STANDARD_NO_PAD.decode(payload).ok())
    else {
        return TokenState::Undecodable;
    };
    let Ok(claims) = serde_json::from_slice::<Claims>(&bytes) else {
        return TokenState::Undecodable;
    };
    if claims.exp <= now {
        TokenState::Expired
    } else {
        TokenState::Valid(claims)
    }
}

/// A resolved credential as seen by the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthToken {
    /// An explicit bearer token to put on the Authorization header.
    Bearer(String),
    /// Evidence of a server-managed HTTP-only session. Authentication
    /// rides on the cookie header; never serialized as a bearer value.
    OpaqueSession,
}

/// Current wall clock as seconds since the Unix epoch.
pub fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
