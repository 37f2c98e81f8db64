// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{make_token, token_expiring_in};

#[yare::parameterized(
    two_segments   = { "abcdefghij.klmnopqrst" },
    four_segments  = { "aaaaaaaa.bbbbbbbb.cccccccc.dddddddd" },
    no_dots        = { "aaaaaaaaaaaaaaaaaaaaaaaaaa" },
    empty          = { "" },
    short_2seg     = { "abc.def" },
    short_3seg     = { "a.b.c" },
)]
fn malformed_shapes(token: &str) {
    assert_eq!(decode(token, 1_000), TokenState::Malformed);
}

#[test]
fn undecodable_payload_is_distinct_from_malformed() {
    let token = "aaaaaaaaaaaa.!!!not-base64!!!.cccccccccccc";
    assert_eq!(decode(token, 1_000), TokenState::Undecodable);
}

#[test]
fn non_json_payload_is_undecodable() {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    let payload = URL_SAFE_NO_PAD.encode(b"not json at all");
    let token = format!("aaaaaaaaaaaa.{payload}.cccccccccccc");
    assert_eq!(decode(&token, 1_000), TokenState::Undecodable);
}

#[test]
fn expired_token() {
    let token = token_expiring_in(-3_600, "u1", "customer");
    assert_eq!(decode(&token, now_secs()), TokenState::Expired);
}

#[test]
fn expiry_boundary_is_expired() {
    let now = 1_700_000_000;
    let token = make_token(&serde_json::json!({ "sub": "u1", "exp": now }));
    assert_eq!(decode(&token, now), TokenState::Expired);
}

#[test]
fn valid_token_decodes_claims() {
    let token = token_expiring_in(3_600, "user-42", "waiter");
    match decode(&token, now_secs()) {
        TokenState::Valid(claims) => {
            assert_eq!(claims.sub, "user-42");
            assert_eq!(claims.role, Role::Waiter);
            assert!(claims.iat.is_some());
        }
        other => panic!("expected Valid, got {other:?}"),
    }
}

#[test]
fn padded_payload_still_decodes() {
    use base64::engine::general_purpose::URL_SAFE;
    use base64::Engine;
    let now = now_secs();
    let claims = serde_json::json!({ "sub": "u1", "exp": now + 100 }).to_string();
    let token = format!("aaaaaaaaaaaa.{}.cccccccccccc", URL_SAFE.encode(claims.as_bytes()));
    assert!(matches!(decode(&token, now), TokenState::Valid(_)));
}

#[test]
fn unknown_role_falls_back() {
    let now = now_secs();
    let token = make_token(&serde_json::json!({ "sub": "u1", "role": "owner", "exp": now + 100 }));
    match decode(&token, now) {
        TokenState::Valid(claims) => assert_eq!(claims.role, Role::Unknown),
        other => panic!("expected Valid, got {other:?}"),
    }
}

#[test]
fn missing_exp_is_undecodable() {
    let token = make_token(&serde_json::json!({ "sub": "u1" }));
    assert_eq!(decode(&token, 1_000), TokenState::Undecodable);
}
