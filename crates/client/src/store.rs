// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token store: the single owner of persisted session state.
//!
//! Two substrates back the bearer token — the persisted state file
//! (the client's "local storage") and the cookie jar. Reads prefer the
//! state file; a cookie hit is written back as a cache. When neither
//! holds an explicit token but the jar suggests a server-managed
//! session, reads return the opaque-session sentinel instead of
//! absent.

use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cookies::{CookieJar, TOKEN_COOKIE_MAX_AGE, TOKEN_COOKIE_PRECEDENCE};
use crate::token::{self, AuthToken, TokenState, MIN_TOKEN_LEN};

/// Everything persisted between runs, one JSON file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    /// Last-known user profile, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<serde_json::Value>,
    #[serde(default)]
    jar: CookieJar,
}

/// Persistent credential store. All mutations write through to the
/// state file (when one is configured) with an atomic tmp + rename.
pub struct TokenStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl TokenStore {
    /// Load from `path`. A missing or unreadable file starts empty.
    pub fn load(path: PathBuf) -> Self {
        let state = match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<StoreState>(&data) {
                Ok(mut s) => {
                    s.jar.purge(token::now_secs());
                    s
                }
                Err(e) => {
                    warn!(path = %path.display(), "failed to parse session state: {e}");
                    StoreState::default()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), "no persisted session state: {e}");
                StoreState::default()
            }
        };
        Self { path: Some(path), state: Mutex::new(state) }
    }

    /// A store with no backing file. Used by tests and one-shot flows.
    pub fn in_memory() -> Self {
        Self { path: None, state: Mutex::new(StoreState::default()) }
    }

    /// Resolve the current credential.
    ///
    /// Explicit token from either substrate wins; otherwise cookie
    /// evidence of an HTTP-only session yields the sentinel.
    pub fn token(&self) -> Option<AuthToken> {
        if let Some(bearer) = self.bearer_candidate() {
            return Some(AuthToken::Bearer(bearer));
        }
        if self.has_opaque_evidence() {
            return Some(AuthToken::OpaqueSession);
        }
        None
    }

    /// Explicit bearer token from the state file or, failing that, the
    /// cookie precedence order (cached back into the state file).
    /// Never returns the sentinel. Implausibly short strings are
    /// treated as absent.
    pub fn bearer_candidate(&self) -> Option<String> {
        let now = token::now_secs();
        let mut state = self.state.lock();
        if let Some(tok) = state.token.clone() {
            if tok.len() >= MIN_TOKEN_LEN {
                return Some(tok);
            }
            // Sentinel-length junk in the state file is not a token.
            state.token = None;
        }
        if let Some(tok) = state.jar.first_token(now) {
            if tok.len() >= MIN_TOKEN_LEN {
                state.token = Some(tok.clone());
                self.persist(&state);
                return Some(tok);
            }
        }
        None
    }

    pub fn has_opaque_evidence(&self) -> bool {
        self.state.lock().jar.has_session_evidence(token::now_secs())
    }

    /// Write a bearer token to the state file and mirror it into the
    /// `auth_token` cookie (`path=/; max-age=86400; SameSite=Lax`).
    pub fn set_token(&self, tok: &str) {
        let now = token::now_secs();
        let mut state = self.state.lock();
        state.token = Some(tok.to_owned());
        state.jar.set(TOKEN_COOKIE_PRECEDENCE[0], tok, TOKEN_COOKIE_MAX_AGE, now);
        self.persist(&state);
    }

    /// Remove the token from the state file and expire both mirrored
    /// cookie names. Refresh credential and profile are untouched.
    pub fn clear_token(&self) {
        let mut state = self.state.lock();
        state.token = None;
        for name in TOKEN_COOKIE_PRECEDENCE {
            state.jar.expire(name);
        }
        self.persist(&state);
    }

    /// Clear every stored credential: token, mirrored cookies, refresh
    /// credential, and the cached profile. The refresh coordinator
    /// calls this when a session cannot be recovered.
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.token = None;
        state.refresh_token = None;
        state.profile = None;
        for name in TOKEN_COOKIE_PRECEDENCE {
            state.jar.expire(name);
        }
        self.persist(&state);
    }

    /// Fail-closed expiry check: anything that does not decode to a
    /// live token counts as expired.
    pub fn is_expired(&self, tok: &str) -> bool {
        !matches!(token::decode(tok, token::now_secs()), TokenState::Valid(_))
    }

    pub fn refresh_credential(&self) -> Option<String> {
        self.state.lock().refresh_token.clone()
    }

    pub fn set_refresh_credential(&self, tok: &str) {
        let mut state = self.state.lock();
        state.refresh_token = Some(tok.to_owned());
        self.persist(&state);
    }

    pub fn profile(&self) -> Option<serde_json::Value> {
        self.state.lock().profile.clone()
    }

    pub fn set_profile(&self, profile: serde_json::Value) {
        let mut state = self.state.lock();
        state.profile = Some(profile);
        self.persist(&state);
    }

    /// Render the outbound `Cookie` header from the jar.
    pub fn cookie_header(&self) -> Option<String> {
        self.state.lock().jar.render_header(token::now_secs())
    }

    /// Capture one `Set-Cookie` header from a response.
    pub fn store_set_cookie(&self, header: &str) {
        let mut state = self.state.lock();
        state.jar.store_header(header, token::now_secs());
        self.persist(&state);
    }

    /// Atomic write-through. Uses a unique tmp name so concurrent
    /// saves cannot interleave partial writes on the same file.
    fn persist(&self, state: &StoreState) {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let Some(ref path) = self.path else {
            return;
        };
        let json = match serde_json::to_string_pretty(state) {
            Ok(j) => j,
            Err(e) => {
                warn!("failed to serialize session state: {e}");
                return;
            }
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp = path.with_file_name(tmp_name);
        if let Err(e) = std::fs::write(&tmp, &json) {
            warn!(path = %tmp.display(), "failed to write session state: {e}");
            return;
        }
        if let Err(e) = std::fs::rename(&tmp, path) {
            warn!(path = %path.display(), "failed to rename session state: {e}");
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
