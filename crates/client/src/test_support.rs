// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: token builders, mock backends, and
//! assertion helpers.

use std::net::SocketAddr;

use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio::net::TcpListener;

use crate::token;

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}

/// Build a three-segment token around the given claims object.
pub fn make_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// A well-formed token expiring `offset_secs` from now (negative for
/// already-expired).
pub fn token_expiring_in(offset_secs: i64, sub: &str, role: &str) -> String {
    let now = token::now_secs() as i64;
    make_token(&serde_json::json!({
        "sub": sub,
        "role": role,
        "iat": now - 60,
        "exp": now + offset_secs,
    }))
}

/// Serve an axum router on an ephemeral local port.
pub async fn spawn_backend(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}
