// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::*;
use crate::client::ApiClient;
use crate::config::Config;
use crate::store::TokenStore;
use crate::test_support::{spawn_backend, token_expiring_in};
use crate::token::Role;

#[yare::parameterized(
    token_key  = { json!({ "token": "tok-value" }) },
    access_key = { json!({ "accessToken": "tok-value" }) },
    jwt_key    = { json!({ "jwt": "tok-value" }) },
    nested     = { json!({ "data": { "token": "tok-value" } }) },
)]
fn extract_token_shapes(v: Value) {
    assert_eq!(extract_token(&v).as_deref(), Some("tok-value"));
}

#[test]
fn extract_token_misses() {
    assert_eq!(extract_token(&json!({})), None);
    assert_eq!(extract_token(&json!({ "token": "" })), None);
    assert_eq!(extract_token(&json!({ "token": 42 })), None);
}

#[test]
fn extract_refresh_token_shapes() {
    assert_eq!(
        extract_refresh_token(&json!({ "refreshToken": "rt" })).as_deref(),
        Some("rt")
    );
    assert_eq!(
        extract_refresh_token(&json!({ "data": { "refreshToken": "rt" } })).as_deref(),
        Some("rt")
    );
    assert_eq!(extract_refresh_token(&json!({})), None);
}

#[test]
fn extract_profile_shapes() {
    let wrapped = json!({ "user": { "id": "u1", "name": "Ana", "email": "a@b.c", "role": "customer" } });
    let profile = extract_profile(&wrapped).expect("profile");
    assert_eq!(profile.id, "u1");
    assert_eq!(profile.role, Role::Customer);

    let bare = json!({ "id": "u2", "email": "b@c.d" });
    assert_eq!(extract_profile(&bare).expect("profile").id, "u2");

    assert!(extract_profile(&json!({ "ok": true })).is_none());
}

fn auth_over(addr: std::net::SocketAddr) -> (AuthService, Arc<TokenStore>) {
    let store = Arc::new(TokenStore::in_memory());
    let config = Config::test(&format!("http://{addr}"));
    let client = ApiClient::with_store(&config, Arc::clone(&store));
    (AuthService::new(client), store)
}

#[tokio::test]
async fn login_adopts_session_and_caches_profile() {
    let tok = token_expiring_in(3_600, "u1", "customer");
    let app = {
        let tok = tok.clone();
        Router::new().route(
            "/api/auth/login",
            post(move |body: String| {
                let tok = tok.clone();
                async move {
                    let v: Value = serde_json::from_str(&body).unwrap_or_default();
                    if v["email"] == json!("ana@example.com") && v["password"] == json!("pw") {
                        Json(json!({
                            "accessToken": tok,
                            "refreshToken": "rt-1",
                            "user": { "id": "u1", "name": "Ana", "email": "ana@example.com", "role": "customer" },
                        }))
                        .into_response()
                    } else {
                        (
                            axum::http::StatusCode::FORBIDDEN,
                            Json(json!({ "message": "invalid credentials" })),
                        )
                            .into_response()
                    }
                }
            }),
        )
    };
    let addr = spawn_backend(app).await;
    let (auth, store) = auth_over(addr);

    let profile = auth.login("ana@example.com", "pw").await.expect("login");
    assert_eq!(profile.name, "Ana");

    assert_eq!(store.bearer_candidate().as_deref(), Some(tok.as_str()));
    assert_eq!(store.refresh_credential().as_deref(), Some("rt-1"));
    assert!(store.profile().is_some());
    assert_eq!(
        auth.signal(),
        crate::session::SessionSignal::Authenticated { subject: "u1".into(), role: Role::Customer }
    );
    assert_eq!(auth.cached_profile().map(|p| p.email), Some("ana@example.com".to_owned()));
}

#[tokio::test]
async fn rejected_login_surfaces_server_message() {
    let app = Router::new().route(
        "/api/auth/login",
        post(|| async {
            (
                axum::http::StatusCode::FORBIDDEN,
                Json(json!({ "message": "invalid credentials" })),
            )
        }),
    );
    let addr = spawn_backend(app).await;
    let (auth, _) = auth_over(addr);

    let err = auth.login("ana@example.com", "wrong").await.expect_err("should fail");
    crate::assert_err_contains!(Err::<(), _>(err), "invalid credentials");
}

#[tokio::test]
async fn logout_clears_local_state_even_when_server_fails() {
    let app = Router::new().route(
        "/api/auth/logout",
        post(|| async {
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "boom" })))
        }),
    );
    let addr = spawn_backend(app).await;
    let (auth, store) = auth_over(addr);
    store.set_token(&token_expiring_in(3_600, "u1", "customer"));
    store.set_profile(json!({ "id": "u1" }));

    let result = auth.logout().await;
    assert!(result.is_err());
    assert_eq!(store.token(), None);
    assert_eq!(store.profile(), None);
}

#[tokio::test]
async fn me_refreshes_the_cached_profile() {
    let app = Router::new().route(
        "/api/auth/me",
        get(|| async {
            Json(json!({ "user": { "id": "u1", "name": "Ana", "email": "a@b.c", "role": "waiter" } }))
        }),
    );
    let addr = spawn_backend(app).await;
    let (auth, store) = auth_over(addr);

    let profile = auth.me().await.expect("me");
    assert_eq!(profile.role, Role::Waiter);
    assert!(store.profile().is_some());
}

#[tokio::test]
async fn check_maps_auth_failures_to_false() {
    let app = Router::new().route(
        "/api/auth/check",
        get(|| async { Json(json!({ "authenticated": true })) }),
    );
    let addr = spawn_backend(app).await;
    let (auth, _) = auth_over(addr);
    assert!(auth.check().await.expect("check"));
}

#[test]
fn google_login_url_points_at_backend() {
    let config = Config::test("http://localhost:9999");
    let client = ApiClient::with_store(&config, Arc::new(TokenStore::in_memory()));
    let auth = AuthService::new(client);
    assert_eq!(auth.google_login_url(), "http://localhost:9999/api/auth/google");
}
