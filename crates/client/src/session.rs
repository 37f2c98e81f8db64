// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session bootstrap and the canonical session signal.
//!
//! Bootstrap runs once at client construction, before any
//! authenticated request: it reconciles the persisted store, the
//! cookie jar, and an optional OAuth redirect URL into one token-store
//! state and reports the resulting signal. Pure local work — the only
//! network path in session establishment is the guest-token issuance
//! on [`crate::client::ApiClient::ensure_session`].

use tracing::debug;

use crate::store::TokenStore;
use crate::token::{self, AuthToken, Role, TokenState};

/// Canonical authentication state derived from the token store,
/// recomputed on bootstrap and after every refresh outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    Anonymous,
    Authenticated { subject: String, role: Role },
    /// A server-managed HTTP-only session; identity unknown to the
    /// client until `/api/auth/me` is consulted.
    OpaqueSession,
}

impl SessionSignal {
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }
}

/// Events the coordinator broadcasts so callers can react to session
/// transitions without the client forcing any UX on them.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A refresh succeeded and a new bearer token is live.
    Refreshed,
    /// The session could not be recovered; all credentials cleared.
    /// Callers decide what to do (re-login prompt, preserve cart, ...).
    Invalidated { reason: String },
}

/// Resolve the starting session state. Source order: persisted store →
/// cookies by precedence (both folded into the store's candidate
/// resolution) → OAuth redirect fragment → opaque-session heuristic.
/// The first source that yields a usable credential is normalized into
/// the store.
pub fn bootstrap(store: &TokenStore, oauth_redirect: Option<&str>) -> SessionSignal {
    if let Some(tok) = store.bearer_candidate() {
        match token::decode(&tok, token::now_secs()) {
            TokenState::Valid(_) | TokenState::Undecodable => return current_signal(store),
            TokenState::Malformed | TokenState::Expired => {
                debug!("discarding stale persisted token");
                store.clear_token();
            }
        }
    }
    if let Some(url) = oauth_redirect {
        if let Some(tok) = fragment_token(url) {
            store.set_token(&tok);
            return current_signal(store);
        }
    }
    if store.has_opaque_evidence() {
        return SessionSignal::OpaqueSession;
    }
    SessionSignal::Anonymous
}

/// Derive the signal from whatever the store currently holds.
pub fn current_signal(store: &TokenStore) -> SessionSignal {
    match store.token() {
        None => SessionSignal::Anonymous,
        Some(AuthToken::OpaqueSession) => SessionSignal::OpaqueSession,
        Some(AuthToken::Bearer(tok)) => match token::decode(&tok, token::now_secs()) {
            TokenState::Valid(claims) => {
                SessionSignal::Authenticated { subject: claims.sub, role: claims.role }
            }
            // Attached on the wire but unreadable locally: report an
            // authenticated session with no decoded identity.
            TokenState::Undecodable => {
                SessionSignal::Authenticated { subject: String::new(), role: Role::Unknown }
            }
            TokenState::Malformed | TokenState::Expired => SessionSignal::Anonymous,
        },
    }
}

/// Extract the `access_token` parameter from the fragment of an OAuth
/// redirect return URL (`https://app/#access_token=...&state=...`).
pub fn fragment_token(url: &str) -> Option<String> {
    let (_, fragment) = url.split_once('#')?;
    fragment
        .split('&')
        .find_map(|pair| pair.strip_prefix("access_token="))
        .filter(|v| v.len() >= token::MIN_TOKEN_LEN)
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
