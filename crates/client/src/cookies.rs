// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side cookie jar.
//!
//! Stands in for the browser cookie substrate: captures `Set-Cookie`
//! response headers, renders the `Cookie` request header, and answers
//! the token-recovery and opaque-session questions the store asks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token cookie names, in the order they are consulted.
///
/// The platform has historically written tokens under several names;
/// `auth_token` is what this client mirrors on login, so it wins.
pub const TOKEN_COOKIE_PRECEDENCE: [&str; 2] = ["auth_token", "access_token"];

/// Cookie names that indicate a server-managed session exists even
/// when no readable token cookie does.
pub const SESSION_COOKIE_NAMES: [&str; 2] = ["connect.sid", "session_id"];

/// Jar byte-length above which a server-managed session is assumed.
const OPAQUE_EVIDENCE_THRESHOLD: usize = 64;

/// Max-Age used when mirroring a bearer token into a cookie.
pub const TOKEN_COOKIE_MAX_AGE: u64 = 86_400;

/// A single stored cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub value: String,
    /// Absolute expiry, seconds since epoch. `None` = session cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

/// Name-keyed cookie jar. BTreeMap keeps header rendering stable.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    #[serde(default)]
    cookies: BTreeMap<String, Cookie>,
}

impl CookieJar {
    /// Parse and store one `Set-Cookie` header value.
    ///
    /// `Max-Age <= 0` (the standard deletion idiom) removes the entry.
    /// `Expires` dates are not parsed; the backend always sends
    /// Max-Age for cookies it expects clients to expire.
    pub fn store_header(&mut self, header: &str, now: u64) {
        let Some((name, cookie)) = parse_set_cookie(header, now) else {
            return;
        };
        match cookie.expires_at {
            Some(at) if at <= now => {
                self.cookies.remove(&name);
            }
            _ => {
                self.cookies.insert(name, cookie);
            }
        }
    }

    /// Set a cookie directly (the mirror write on login/refresh).
    pub fn set(&mut self, name: &str, value: &str, max_age_secs: u64, now: u64) {
        self.cookies.insert(
            name.to_owned(),
            Cookie {
                value: value.to_owned(),
                expires_at: Some(now + max_age_secs),
                path: Some("/".to_owned()),
                same_site: Some("Lax".to_owned()),
            },
        );
    }

    /// Remove a cookie outright.
    pub fn expire(&mut self, name: &str) {
        self.cookies.remove(name);
    }

    pub fn get(&self, name: &str, now: u64) -> Option<&str> {
        let cookie = self.cookies.get(name)?;
        if cookie.expires_at.is_some_and(|at| at <= now) {
            return None;
        }
        Some(&cookie.value)
    }

    /// First live token cookie in precedence order.
    pub fn first_token(&self, now: u64) -> Option<String> {
        TOKEN_COOKIE_PRECEDENCE
            .iter()
            .find_map(|name| self.get(name, now))
            .map(str::to_owned)
    }

    /// Render the `Cookie` request header. `None` when the jar is
    /// empty (no header should be sent at all).
    pub fn render_header(&self, now: u64) -> Option<String> {
        let live: Vec<String> = self
            .cookies
            .iter()
            .filter(|(_, c)| !c.expires_at.is_some_and(|at| at <= now))
            .map(|(name, c)| format!("{name}={}", c.value))
            .collect();
        if live.is_empty() {
            None
        } else {
            Some(live.join("; "))
        }
    }

    /// Whether the jar suggests a server-managed (HTTP-only style)
    /// session: a session cookie by name, or enough cookie bytes that
    /// something beyond our own mirror is clearly present.
    pub fn has_session_evidence(&self, now: u64) -> bool {
        if SESSION_COOKIE_NAMES.iter().any(|name| self.get(name, now).is_some()) {
            return true;
        }
        self.byte_len(now) > OPAQUE_EVIDENCE_THRESHOLD
    }

    /// Total `name=value` byte length of live cookies.
    pub fn byte_len(&self, now: u64) -> usize {
        self.cookies
            .iter()
            .filter(|(_, c)| !c.expires_at.is_some_and(|at| at <= now))
            .map(|(name, c)| name.len() + 1 + c.value.len())
            .sum()
    }

    /// Drop entries past their expiry.
    pub fn purge(&mut self, now: u64) {
        self.cookies.retain(|_, c| !c.expires_at.is_some_and(|at| at <= now));
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Parse one `Set-Cookie` header into a name and a [`Cookie`].
///
/// Unknown attributes (Domain, Secure, HttpOnly, Expires) are ignored;
/// a native client's jar is not partitioned the way a browser's is.
fn parse_set_cookie(header: &str, now: u64) -> Option<(String, Cookie)> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let mut cookie = Cookie {
        value: value.trim().to_owned(),
        expires_at: None,
        path: None,
        same_site: None,
    };
    for attr in parts {
        let attr = attr.trim();
        let (key, val) = match attr.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attr, ""),
        };
        match key.to_ascii_lowercase().as_str() {
            "max-age" => {
                if let Ok(secs) = val.parse::<i64>() {
                    cookie.expires_at =
                        Some(if secs <= 0 { now } else { now.saturating_add(secs as u64) });
                }
            }
            "path" => cookie.path = Some(val.to_owned()),
            "samesite" => cookie.same_site = Some(val.to_owned()),
            _ => {}
        }
    }
    Some((name.to_owned(), cookie))
}

#[cfg(test)]
#[path = "cookies_tests.rs"]
mod tests;
