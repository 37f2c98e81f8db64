// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight token refresh coordinator.
//!
//! State machine `Idle -> Refreshing -> Idle`. The first 401 to arrive
//! while Idle becomes the initiator and performs the network refresh;
//! every 401 that lands while Refreshing subscribes as a waiter and
//! observes the initiator's outcome. At most one refresh call is on
//! the wire at any time — the check-and-set on the gate happens under
//! one lock acquisition, so no interleaving can start a second call.

use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::auth;
use crate::client::ApiClient;
use crate::error::{self, ApiError};
use crate::session::SessionEvent;

/// Outcome shared with every waiter of one refresh cycle.
type RefreshOutcome = Result<String, ApiError>;

/// The in-progress flag plus the waiter fan-out channel. `None` =
/// Idle; `Some(sender)` = Refreshing, with waiters subscribed.
pub(crate) struct RefreshGate {
    inflight: Mutex<Option<broadcast::Sender<RefreshOutcome>>>,
}

impl RefreshGate {
    pub(crate) fn new() -> Self {
        Self { inflight: Mutex::new(None) }
    }
}

enum Entry {
    Initiator,
    Waiter(broadcast::Receiver<RefreshOutcome>),
}

impl ApiClient {
    /// Recover from a 401: run the refresh (or join the one already in
    /// flight) and return the new bearer token.
    pub(crate) async fn refresh(&self) -> RefreshOutcome {
        let entry = {
            let mut gate = self.inner.refresh.inflight.lock().await;
            match gate.as_ref() {
                Some(tx) => Entry::Waiter(tx.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(4);
                    *gate = Some(tx);
                    Entry::Initiator
                }
            }
        };

        match entry {
            Entry::Waiter(mut rx) => {
                debug!("refresh already in flight, waiting");
                match rx.recv().await {
                    Ok(outcome) => outcome,
                    // Sender dropped without a send: treat as a failed
                    // cycle rather than hanging the caller.
                    Err(_) => Err(ApiError::RefreshExhausted),
                }
            }
            Entry::Initiator => {
                let outcome = self.run_refresh_cycle().await;
                let tx = self.inner.refresh.inflight.lock().await.take();
                if let Some(tx) = tx {
                    let _ = tx.send(outcome.clone());
                }
                outcome
            }
        }
    }

    /// One full cycle: try both strategies, then settle the session
    /// state for success or failure.
    async fn run_refresh_cycle(&self) -> RefreshOutcome {
        match self.do_refresh().await {
            Ok(tok) => {
                self.inner.store.set_token(&tok);
                self.publish_signal();
                let _ = self.inner.event_tx.send(SessionEvent::Refreshed);
                info!("session token refreshed");
                Ok(tok)
            }
            Err(e) => {
                warn!(err = %e, "token refresh failed, invalidating session");
                self.inner.store.clear_all();
                self.publish_signal();
                let _ = self
                    .inner
                    .event_tx
                    .send(SessionEvent::Invalidated { reason: e.to_string() });
                Err(e)
            }
        }
    }

    /// Strategy order: the session-cookie call first, then one
    /// fallback carrying the stored refresh credential. Both failing
    /// is terminal for this cycle.
    async fn do_refresh(&self) -> RefreshOutcome {
        let primary = match self.call_refresh(None).await {
            Ok(tok) => return Ok(tok),
            Err(e) => e,
        };
        debug!(err = %primary, "cookie-based refresh failed");
        let Some(credential) = self.inner.store.refresh_credential() else {
            return Err(ApiError::RefreshExhausted);
        };
        match self.call_refresh(Some(&credential)).await {
            Ok(tok) => Ok(tok),
            Err(e) => {
                debug!(err = %e, "credential-based refresh failed");
                Err(ApiError::RefreshExhausted)
            }
        }
    }

    /// One refresh request. Deliberately bypasses the pipeline: a 401
    /// here must not recurse into another refresh.
    async fn call_refresh(&self, credential: Option<&str>) -> RefreshOutcome {
        let url = format!("{}/api/auth/refresh-token", self.inner.base_url);
        let body = match credential {
            Some(tok) => serde_json::json!({ "refreshToken": tok }),
            None => serde_json::json!({}),
        };
        let mut req = self.inner.http.post(&url).json(&body);
        if let Some(cookies) = self.inner.store.cookie_header() {
            req = req.header(reqwest::header::COOKIE, cookies);
        }
        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => return Err(ApiError::from_transport(&e)),
        };
        for value in resp.headers().get_all(reqwest::header::SET_COOKIE) {
            if let Ok(s) = value.to_str() {
                self.inner.store.store_set_cookie(s);
            }
        }
        let status = resp.status();
        let bytes = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => return Err(ApiError::from_transport(&e)),
        };
        if !status.is_success() {
            let message = error::server_message(&bytes)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("refresh failed").to_owned());
            return Err(ApiError::from_status(status.as_u16(), message));
        }
        let v: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let tok = auth::extract_token(&v)
            .ok_or_else(|| ApiError::Decode("no token in refresh response".to_owned()))?;
        // Rotated refresh credentials ride on the same response.
        if let Some(rotated) = auth::extract_refresh_token(&v) {
            self.inner.store.set_refresh_credential(&rotated);
        }
        Ok(tok)
    }
}
