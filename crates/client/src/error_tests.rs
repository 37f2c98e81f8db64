// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn status_classification() {
    assert!(matches!(
        ApiError::from_status(401, "nope".into()),
        ApiError::Unauthorized(_)
    ));
    assert!(matches!(
        ApiError::from_status(404, "missing".into()),
        ApiError::Api { status: 404, .. }
    ));
    assert!(matches!(
        ApiError::from_status(422, "bad".into()),
        ApiError::Api { status: 422, .. }
    ));
    assert!(matches!(
        ApiError::from_status(500, "boom".into()),
        ApiError::Server { status: 500, .. }
    ));
    assert!(matches!(
        ApiError::from_status(503, "later".into()),
        ApiError::Server { status: 503, .. }
    ));
}

#[test]
fn codes_are_stable() {
    assert_eq!(ApiError::Timeout.code(), "TIMEOUT");
    assert_eq!(ApiError::RefreshExhausted.code(), "REFRESH_EXHAUSTED");
    assert_eq!(ApiError::Network("x".into()).code(), "NETWORK");
    assert_eq!(ApiError::Unauthorized("x".into()).code(), "UNAUTHORIZED");
}

#[test]
fn auth_failures() {
    assert!(ApiError::Unauthorized("x".into()).is_auth_failure());
    assert!(ApiError::RefreshExhausted.is_auth_failure());
    assert!(!ApiError::Timeout.is_auth_failure());
    assert!(!ApiError::Server { status: 500, message: "x".into() }.is_auth_failure());
}

#[test]
fn display_carries_server_message() {
    let err = ApiError::Api { status: 409, message: "table already seated".into() };
    assert!(err.to_string().contains("table already seated"));
}

#[yare::parameterized(
    flat    = { br#"{"message": "order not found"}"# },
    nested  = { br#"{"error": {"message": "order not found"}}"# },
    stringy = { br#"{"error": "order not found"}"# },
)]
fn server_message_shapes(body: &[u8]) {
    assert_eq!(server_message(body).as_deref(), Some("order not found"));
}

#[test]
fn server_message_absent() {
    assert_eq!(server_message(br#"{"ok": true}"#), None);
    assert_eq!(server_message(b"not json"), None);
    assert_eq!(server_message(b""), None);
}
