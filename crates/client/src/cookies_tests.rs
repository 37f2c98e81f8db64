// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const NOW: u64 = 1_700_000_000;

#[test]
fn store_header_parses_attributes() {
    let mut jar = CookieJar::default();
    jar.store_header("auth_token=tok-123; Path=/; Max-Age=86400; SameSite=Lax; HttpOnly", NOW);
    assert_eq!(jar.get("auth_token", NOW), Some("tok-123"));
    assert_eq!(jar.get("auth_token", NOW + 86_399), Some("tok-123"));
    assert_eq!(jar.get("auth_token", NOW + 86_400), None);
}

#[test]
fn max_age_zero_deletes() {
    let mut jar = CookieJar::default();
    jar.store_header("auth_token=tok-123; Max-Age=600", NOW);
    assert!(jar.get("auth_token", NOW).is_some());
    jar.store_header("auth_token=; Max-Age=0", NOW);
    assert_eq!(jar.get("auth_token", NOW), None);
    assert!(jar.is_empty());
}

#[test]
fn garbage_headers_are_ignored() {
    let mut jar = CookieJar::default();
    jar.store_header("no-equals-sign", NOW);
    jar.store_header("=value-without-name", NOW);
    assert!(jar.is_empty());
}

#[test]
fn token_precedence_prefers_auth_token() {
    let mut jar = CookieJar::default();
    jar.store_header("access_token=from-access-cookie", NOW);
    jar.store_header("auth_token=from-auth-cookie", NOW);
    assert_eq!(jar.first_token(NOW).as_deref(), Some("from-auth-cookie"));

    jar.expire("auth_token");
    assert_eq!(jar.first_token(NOW).as_deref(), Some("from-access-cookie"));
}

#[test]
fn render_header_joins_live_cookies() {
    let mut jar = CookieJar::default();
    assert_eq!(jar.render_header(NOW), None);

    jar.set("b_second", "2", 600, NOW);
    jar.set("a_first", "1", 600, NOW);
    assert_eq!(jar.render_header(NOW).as_deref(), Some("a_first=1; b_second=2"));

    // Expired entries drop out of the header without an explicit purge.
    assert_eq!(jar.render_header(NOW + 600), None);
}

#[test]
fn session_evidence_by_name() {
    let mut jar = CookieJar::default();
    assert!(!jar.has_session_evidence(NOW));
    jar.store_header("connect.sid=s%3Aabcdef", NOW);
    assert!(jar.has_session_evidence(NOW));
}

#[test]
fn session_evidence_by_byte_length() {
    let mut jar = CookieJar::default();
    jar.set("pref", "dark", 600, NOW);
    assert!(!jar.has_session_evidence(NOW));
    jar.set("tracking", &"x".repeat(80), 600, NOW);
    assert!(jar.has_session_evidence(NOW));
}

#[test]
fn purge_drops_expired() {
    let mut jar = CookieJar::default();
    jar.set("stale", "v", 10, NOW);
    jar.set("fresh", "v", 1_000, NOW);
    jar.purge(NOW + 100);
    assert_eq!(jar.get("stale", NOW + 100), None);
    assert!(jar.get("fresh", NOW + 100).is_some());
}
