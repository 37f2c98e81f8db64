// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Order placement and tracking.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiError;

/// One line of a cart being submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "menuItemId")]
    pub menu_item_id: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Server-side order lifecycle. The set is closed on the backend;
/// `Unknown` absorbs additions we have not caught up with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Completed,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Served => "served",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// True once the kitchen is done with the order, for good or ill.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Served | Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default, alias = "totalCents")]
    pub total: u64,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    client: ApiClient,
}

impl OrderService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Submit a cart. A client-generated reference makes the call safe
    /// to retry after a transport failure without double-ordering.
    pub async fn place(&self, lines: &[CartLine], table: Option<&str>) -> Result<Order, ApiError> {
        let body = serde_json::json!({
            "items": lines,
            "table": table,
            "clientRef": Uuid::new_v4().to_string(),
        });
        let v: Value = self.client.post("/api/orders", &body).await?;
        order_from(&v)
    }

    pub async fn get(&self, id: &str) -> Result<Order, ApiError> {
        let v: Value = self.client.get(&format!("/api/orders/{id}")).await?;
        order_from(&v)
    }

    /// Orders belonging to the current session.
    pub async fn list_mine(&self) -> Result<Vec<Order>, ApiError> {
        let v: Value = self.client.get("/api/orders").await?;
        let arr = v.get("orders").unwrap_or(&v);
        serde_json::from_value(arr.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn cancel(&self, id: &str) -> Result<Order, ApiError> {
        let v: Value =
            self.client.post(&format!("/api/orders/{id}/cancel"), &serde_json::json!({})).await?;
        order_from(&v)
    }
}

fn order_from(v: &Value) -> Result<Order, ApiError> {
    let obj = v.get("order").unwrap_or(v);
    serde_json::from_value(obj.clone()).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "orders_tests.rs"]
mod tests;
