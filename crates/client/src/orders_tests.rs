// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::*;
use crate::config::Config;
use crate::store::TokenStore;
use crate::test_support::spawn_backend;

fn order_service(addr: std::net::SocketAddr) -> OrderService {
    let config = Config::test(&format!("http://{addr}"));
    let client = ApiClient::with_store(&config, Arc::new(TokenStore::in_memory()));
    OrderService::new(client)
}

#[test]
fn unknown_status_does_not_fail_parsing() {
    let order: Order = serde_json::from_value(json!({
        "id": "o-1",
        "status": "being-juggled",
        "total": 2000,
    }))
    .expect("parse");
    assert_eq!(order.status, OrderStatus::Unknown);
}

#[yare::parameterized(
    served    = { OrderStatus::Served, true },
    completed = { OrderStatus::Completed, true },
    cancelled = { OrderStatus::Cancelled, true },
    pending   = { OrderStatus::Pending, false },
    preparing = { OrderStatus::Preparing, false },
)]
fn terminal_statuses(status: OrderStatus, terminal: bool) {
    assert_eq!(status.is_terminal(), terminal);
}

#[tokio::test]
async fn place_sends_lines_and_client_ref() {
    let app = Router::new().route(
        "/api/orders",
        post(|body: String| async move {
            let v: Value = serde_json::from_str(&body).unwrap_or_default();
            assert_eq!(v["items"][0]["menuItemId"], json!("m-1"));
            assert_eq!(v["items"][0]["quantity"], json!(2));
            assert_eq!(v["table"], json!("T1"));
            assert!(
                v["clientRef"].as_str().is_some_and(|r| !r.is_empty()),
                "clientRef missing: {v}"
            );
            Json(json!({
                "order": { "id": "o-1", "status": "pending", "total": 2900, "table": "T1" }
            }))
        }),
    );
    let addr = spawn_backend(app).await;

    let lines = vec![CartLine { menu_item_id: "m-1".into(), quantity: 2, notes: None }];
    let order = order_service(addr).place(&lines, Some("T1")).await.expect("place");
    assert_eq!(order.id, "o-1");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, 2_900);
}

#[tokio::test]
async fn get_unwraps_the_order_envelope() {
    let app = Router::new().route(
        "/api/orders/o-1",
        get(|| async {
            Json(json!({ "order": { "id": "o-1", "status": "ready", "total": 1450 } }))
        }),
    );
    let addr = spawn_backend(app).await;

    let order = order_service(addr).get("o-1").await.expect("get");
    assert_eq!(order.status, OrderStatus::Ready);
}

#[tokio::test]
async fn list_mine_accepts_bare_arrays() {
    let app = Router::new().route(
        "/api/orders",
        get(|| async {
            Json(json!([
                { "id": "o-1", "status": "completed", "total": 1450 },
                { "id": "o-2", "status": "pending", "total": 500 },
            ]))
        }),
    );
    let addr = spawn_backend(app).await;

    let orders = order_service(addr).list_mine().await.expect("list");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].status, OrderStatus::Completed);
}
