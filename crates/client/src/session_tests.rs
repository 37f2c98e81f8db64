// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::token_expiring_in;
use crate::token::Role;

#[test]
fn stored_valid_token_wins() {
    let store = TokenStore::in_memory();
    store.set_token(&token_expiring_in(3_600, "user-1", "customer"));

    let signal = bootstrap(&store, None);
    assert_eq!(
        signal,
        SessionSignal::Authenticated { subject: "user-1".into(), role: Role::Customer }
    );
}

#[test]
fn stale_stored_token_is_discarded() {
    let store = TokenStore::in_memory();
    store.set_token(&token_expiring_in(-3_600, "user-1", "customer"));

    assert_eq!(bootstrap(&store, None), SessionSignal::Anonymous);
    assert_eq!(store.token(), None);
}

#[test]
fn cookie_token_resolves_when_store_is_empty() {
    let store = TokenStore::in_memory();
    let tok = token_expiring_in(3_600, "user-2", "waiter");
    store.store_set_cookie(&format!("access_token={tok}; Max-Age=600"));

    let signal = bootstrap(&store, None);
    assert_eq!(
        signal,
        SessionSignal::Authenticated { subject: "user-2".into(), role: Role::Waiter }
    );
}

#[test]
fn oauth_fragment_is_adopted() {
    let store = TokenStore::in_memory();
    let tok = token_expiring_in(3_600, "user-3", "customer");
    let redirect = format!("https://app.example/#access_token={tok}&state=xyz");

    let signal = bootstrap(&store, Some(&redirect));
    assert_eq!(
        signal,
        SessionSignal::Authenticated { subject: "user-3".into(), role: Role::Customer }
    );
    // Normalized into the store, not just reported.
    assert!(store.bearer_candidate().is_some());
}

#[test]
fn stale_store_falls_through_to_fragment() {
    let store = TokenStore::in_memory();
    store.set_token(&token_expiring_in(-3_600, "old", "customer"));
    let tok = token_expiring_in(3_600, "new", "customer");
    let redirect = format!("https://app.example/#access_token={tok}");

    let signal = bootstrap(&store, Some(&redirect));
    assert_eq!(signal, SessionSignal::Authenticated { subject: "new".into(), role: Role::Customer });
}

#[test]
fn opaque_heuristic_is_last() {
    let store = TokenStore::in_memory();
    store.store_set_cookie("connect.sid=s%3Aabcdef; Max-Age=600");

    assert_eq!(bootstrap(&store, None), SessionSignal::OpaqueSession);
}

#[test]
fn nothing_resolves_to_anonymous() {
    let store = TokenStore::in_memory();
    assert_eq!(bootstrap(&store, None), SessionSignal::Anonymous);
}

#[yare::parameterized(
    no_fragment   = { "https://app.example/menu" },
    other_params  = { "https://app.example/#state=xyz&scope=profile" },
    too_short     = { "https://app.example/#access_token=tiny" },
)]
fn fragment_token_misses(url: &str) {
    assert_eq!(fragment_token(url), None);
}

#[test]
fn fragment_token_hit() {
    let url = "https://app.example/cb#state=1&access_token=aaaaaaaaaaaaaaaaaaaaaaaa&x=2";
    assert_eq!(fragment_token(url).as_deref(), Some("aaaaaaaaaaaaaaaaaaaaaaaa"));
}

#[test]
fn undecodable_token_reports_unknown_identity() {
    let store = TokenStore::in_memory();
    store.set_token("aaaaaaaaaaaa.!!!junk!!!.cccccccccccc");
    assert_eq!(
        current_signal(&store),
        SessionSignal::Authenticated { subject: String::new(), role: Role::Unknown }
    );
}
