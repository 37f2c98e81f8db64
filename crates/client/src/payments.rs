// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stripe checkout handoff — `/api/payments/*`.
//!
//! The client never sees card data. It asks the backend for a payment
//! intent, hands the client secret to the Stripe surface, and polls
//! the backend for the outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    #[serde(default, alias = "clientSecret")]
    pub client_secret: String,
    #[serde(default, alias = "publishableKey")]
    pub publishable_key: String,
    #[serde(default, alias = "paymentId")]
    pub payment_id: String,
    #[serde(default)]
    pub amount: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    RequiresAction,
    Processing,
    Succeeded,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone)]
pub struct PaymentService {
    client: ApiClient,
}

impl PaymentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /api/payments/intent` for an order.
    pub async fn create_intent(&self, order_id: &str) -> Result<PaymentIntent, ApiError> {
        let v: Value = self
            .client
            .post("/api/payments/intent", &serde_json::json!({ "orderId": order_id }))
            .await?;
        let obj = v.get("intent").unwrap_or(&v);
        serde_json::from_value(obj.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /api/payments/{id}/status`.
    pub async fn status(&self, payment_id: &str) -> Result<PaymentStatus, ApiError> {
        let v: Value = self.client.get(&format!("/api/payments/{payment_id}/status")).await?;
        let status = v.get("status").cloned().unwrap_or(Value::Null);
        serde_json::from_value(status).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
