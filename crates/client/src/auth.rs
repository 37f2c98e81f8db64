// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle endpoints and response normalization.
//!
//! The backend is loose about where it puts the token in auth
//! responses (`token`, `accessToken`, `jwt`, sometimes nested under
//! `data`). Normalization happens here, once, at the API boundary —
//! nothing else in the crate pattern-matches those shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::session::SessionSignal;
use crate::token::Role;

/// The fields of a user profile this client relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Pull a bearer token out of a loose auth response.
pub fn extract_token(v: &Value) -> Option<String> {
    let obj = v.get("data").unwrap_or(v);
    ["token", "accessToken", "jwt"]
        .iter()
        .find_map(|key| obj.get(key).and_then(|t| t.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Pull a refresh credential out of a loose auth response.
pub fn extract_refresh_token(v: &Value) -> Option<String> {
    let obj = v.get("data").unwrap_or(v);
    obj.get("refreshToken")
        .and_then(|t| t.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Parse the `user` object of an auth response, or the response
/// itself when the backend returns the profile bare (`/api/auth/me`).
pub fn extract_profile(v: &Value) -> Option<Profile> {
    let obj = v.get("user").or_else(|| v.get("data").and_then(|d| d.get("user"))).unwrap_or(v);
    let profile: Profile = serde_json::from_value(obj.clone()).ok()?;
    if profile.id.is_empty() && profile.email.is_empty() {
        return None;
    }
    Some(profile)
}

/// Auth endpoint adapter over the pipeline.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /api/auth/login` — adopts the returned session and caches
    /// the profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, ApiError> {
        let v: Value = self
            .client
            .post("/api/auth/login", &serde_json::json!({ "email": email, "password": password }))
            .await?;
        self.adopt(&v)
    }

    /// `POST /api/auth/register` — registers and adopts the session.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Profile, ApiError> {
        let v: Value = self
            .client
            .post(
                "/api/auth/register",
                &serde_json::json!({ "name": name, "email": email, "password": password }),
            )
            .await?;
        self.adopt(&v)
    }

    /// `POST /api/auth/logout` — best-effort server call, then local
    /// credential teardown either way.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.client.post_unit("/api/auth/logout", &serde_json::json!({})).await;
        self.client.store().clear_all();
        self.client.publish_signal();
        result
    }

    /// `GET /api/auth/me` — fetch the profile and refresh the cache.
    pub async fn me(&self) -> Result<Profile, ApiError> {
        let v: Value = self.client.get("/api/auth/me").await?;
        let profile = extract_profile(&v)
            .ok_or_else(|| ApiError::Decode("no profile in response".to_owned()))?;
        if let Ok(cached) = serde_json::to_value(&profile) {
            self.client.store().set_profile(cached);
        }
        Ok(profile)
    }

    /// `GET /api/auth/check` — lightweight server-side session probe.
    pub async fn check(&self) -> Result<bool, ApiError> {
        match self.client.get::<Value>("/api/auth/check").await {
            Ok(v) => Ok(v.get("authenticated").and_then(|a| a.as_bool()).unwrap_or(true)),
            Err(e) if e.is_auth_failure() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The browser entry point for redirect-based OAuth. The return
    /// leg lands as a URL fragment, fed back through
    /// `--oauth-redirect` into the session bootstrap.
    pub fn google_login_url(&self) -> String {
        format!("{}/api/auth/google", self.client.base_url())
    }

    /// Last profile seen by login/me, from the store cache.
    pub fn cached_profile(&self) -> Option<Profile> {
        let v = self.client.store().profile()?;
        serde_json::from_value(v).ok()
    }

    pub fn signal(&self) -> SessionSignal {
        self.client.signal()
    }

    fn adopt(&self, v: &Value) -> Result<Profile, ApiError> {
        self.client.adopt_session(v)?;
        extract_profile(v).ok_or_else(|| ApiError::Decode("no profile in response".to_owned()))
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
