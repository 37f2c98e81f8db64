// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The request pipeline: one HTTP client every API call goes through.
//!
//! Outbound, the pipeline resolves a credential from the token store
//! and decides whether an Authorization header rides along. Inbound,
//! it captures Set-Cookie headers, classifies failures, and recovers a
//! 401 exactly once via the refresh coordinator before replaying the
//! request against the new token.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::auth;
use crate::config::Config;
use crate::error::{self, ApiError};
use crate::refresh::RefreshGate;
use crate::session::{self, SessionEvent, SessionSignal};
use crate::store::TokenStore;
use crate::token::{self, AuthToken, TokenState};

/// Install the rustls crypto provider (needed for reqwest even on
/// plain HTTP). Safe to call more than once.
pub fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) store: Arc<TokenStore>,
    pub(crate) refresh: RefreshGate,
    pub(crate) signal_tx: watch::Sender<SessionSignal>,
    pub(crate) event_tx: broadcast::Sender<SessionEvent>,
}

/// Handle to the pipeline. Cheap to clone; all clones share the token
/// store, the refresh gate, and the session signal.
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl ApiClient {
    /// Build a client from config and run the session bootstrap.
    /// No network is touched here.
    pub fn new(config: &Config) -> Self {
        let store = match config.state_path() {
            Some(path) => TokenStore::load(path),
            None => TokenStore::in_memory(),
        };
        Self::with_store(config, Arc::new(store))
    }

    /// Build against an injected store. Tests use this to pre-seed
    /// credentials; [`ApiClient::new`] funnels here.
    pub fn with_store(config: &Config, store: Arc<TokenStore>) -> Self {
        ensure_crypto_provider();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        let (signal_tx, _) = watch::channel(SessionSignal::Anonymous);
        let (event_tx, _) = broadcast::channel(16);
        let client = Self {
            inner: Arc::new(ClientInner {
                http,
                base_url: config.url.trim_end_matches('/').to_owned(),
                store,
                refresh: RefreshGate::new(),
                signal_tx,
                event_tx,
            }),
        };
        let signal = session::bootstrap(&client.inner.store, config.oauth_redirect.as_deref());
        client.inner.signal_tx.send_replace(signal);
        client
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.inner.store
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Current session signal.
    pub fn signal(&self) -> SessionSignal {
        self.inner.signal_tx.borrow().clone()
    }

    /// Watch the session signal across refreshes and invalidations.
    pub fn watch_signal(&self) -> watch::Receiver<SessionSignal> {
        self.inner.signal_tx.subscribe()
    }

    /// The session signal as an async stream, for consumers that want
    /// to fold it into a select loop.
    pub fn signal_stream(&self) -> WatchStream<SessionSignal> {
        WatchStream::new(self.inner.signal_tx.subscribe())
    }

    /// Subscribe to session lifecycle events ([`SessionEvent`]).
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Recompute and publish the session signal from the store.
    pub(crate) fn publish_signal(&self) {
        let signal = session::current_signal(&self.inner.store);
        self.inner.signal_tx.send_replace(signal);
    }

    /// Normalize a session-bearing response (login, register, guest
    /// token, refresh) into the store. One boundary, one shape.
    pub(crate) fn adopt_session(&self, v: &Value) -> Result<(), ApiError> {
        let tok = auth::extract_token(v)
            .ok_or_else(|| ApiError::Decode("no token in session response".to_owned()))?;
        self.inner.store.set_token(&tok);
        if let Some(refresh) = auth::extract_refresh_token(v) {
            self.inner.store.set_refresh_credential(&refresh);
        }
        if let Some(user) = v.get("user") {
            self.inner.store.set_profile(user.clone());
        }
        self.publish_signal();
        Ok(())
    }

    /// Issue a guest session for a table code when nothing else
    /// resolved at bootstrap. No-op for already-authenticated clients
    /// or when no table is known.
    pub async fn ensure_session(&self, table: Option<&str>) -> Result<SessionSignal, ApiError> {
        if self.signal().is_authenticated() {
            return Ok(self.signal());
        }
        let Some(table) = table else {
            return Ok(SessionSignal::Anonymous);
        };
        let v: Value =
            self.post("/api/auth/guest-token", &serde_json::json!({ "table": table })).await?;
        self.adopt_session(&v)?;
        Ok(self.signal())
    }

    // -- Typed verbs --------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute(Method::GET, path, None).await?;
        decode_body(&body)
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let value = to_value(body)?;
        let bytes = self.execute(Method::POST, path, Some(&value)).await?;
        decode_body(&bytes)
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let value = to_value(body)?;
        let bytes = self.execute(Method::PUT, path, Some(&value)).await?;
        decode_body(&bytes)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute(Method::DELETE, path, None).await?;
        decode_body(&body)
    }

    /// POST where the response body is discarded (204s, fire-and-forget).
    pub async fn post_unit(&self, path: &str, body: &impl Serialize) -> Result<(), ApiError> {
        let value = to_value(body)?;
        self.execute(Method::POST, path, Some(&value)).await?;
        Ok(())
    }

    /// POST returning raw bytes (audio and other non-JSON payloads).
    pub async fn post_bytes(&self, path: &str, body: &impl Serialize) -> Result<Bytes, ApiError> {
        let value = to_value(body)?;
        self.execute(Method::POST, path, Some(&value)).await
    }

    // -- Pipeline core ------------------------------------------------

    /// Send one logical request. A 401 is recovered at most once: the
    /// refresh coordinator runs (or is joined), then the request is
    /// rebuilt — re-reading the store, so it observes the new token —
    /// and replayed with the retry flag set.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Bytes, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        let mut retried = false;
        loop {
            let mut req = self.inner.http.request(method.clone(), &url);
            if let Some(b) = body {
                req = req.json(b);
            }
            if let Some(cookies) = self.inner.store.cookie_header() {
                req = req.header(header::COOKIE, cookies);
            }
            req = self.attach_authorization(req);

            let resp = match req.send().await {
                Ok(r) => r,
                Err(e) => return Err(ApiError::from_transport(&e)),
            };
            self.capture_cookies(&resp);

            let status = resp.status();
            let bytes = match resp.bytes().await {
                Ok(b) => b,
                Err(e) => return Err(ApiError::from_transport(&e)),
            };
            if status.is_success() {
                return Ok(bytes);
            }

            let message = error::server_message(&bytes)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());

            if status == StatusCode::UNAUTHORIZED {
                if retried {
                    debug!(%url, "401 after replay, giving up");
                    return Err(ApiError::Unauthorized(message));
                }
                self.refresh().await?;
                retried = true;
                continue;
            }
            return Err(ApiError::from_status(status.as_u16(), message));
        }
    }

    /// Outbound interception: resolve a credential and decide what, if
    /// anything, goes on the Authorization header.
    fn attach_authorization(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let tok = match self.inner.store.token() {
            // No credential, or a server-managed session: rely on the
            // cookie header alone.
            None | Some(AuthToken::OpaqueSession) => return req,
            Some(AuthToken::Bearer(tok)) => tok,
        };
        match token::decode(&tok, token::now_secs()) {
            TokenState::Valid(_) => req.bearer_auth(tok),
            TokenState::Undecodable => {
                // Fail-open on decode errors only: the shape is right,
                // so let the server judge it.
                warn!("token payload undecodable, attaching anyway");
                req.bearer_auth(tok)
            }
            TokenState::Malformed => {
                debug!("dropping malformed token, proceeding unauthenticated");
                self.inner.store.clear_token();
                req
            }
            TokenState::Expired => {
                debug!("dropping expired token, proceeding unauthenticated");
                self.inner.store.clear_token();
                req
            }
        }
    }

    /// Inbound interception, first half: fold Set-Cookie headers into
    /// the jar before the body is even read.
    fn capture_cookies(&self, resp: &reqwest::Response) {
        for value in resp.headers().get_all(header::SET_COOKIE) {
            if let Ok(s) = value.to_str() {
                self.inner.store.store_set_cookie(s);
            }
        }
    }
}

fn to_value(body: &impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn decode_body<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
