// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table lookup and waiter calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub seats: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaiterCallStatus {
    Open,
    Acknowledged,
    Resolved,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiterCall {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: WaiterCallStatus,
}

#[derive(Clone)]
pub struct TableService {
    client: ApiClient,
}

impl TableService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /api/tables/{code}` — resolve a table code (QR payload).
    pub async fn lookup(&self, code: &str) -> Result<Table, ApiError> {
        let v: Value = self.client.get(&format!("/api/tables/{code}")).await?;
        let obj = v.get("table").unwrap_or(&v);
        serde_json::from_value(obj.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `POST /api/waiter-calls` — summon a waiter to a table.
    pub async fn call_waiter(
        &self,
        table: &str,
        reason: Option<&str>,
    ) -> Result<WaiterCall, ApiError> {
        let v: Value = self
            .client
            .post("/api/waiter-calls", &serde_json::json!({ "table": table, "reason": reason }))
            .await?;
        let obj = v.get("call").unwrap_or(&v);
        serde_json::from_value(obj.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /api/waiter-calls/{id}` — has anyone acknowledged yet?
    pub async fn call_status(&self, id: &str) -> Result<WaiterCall, ApiError> {
        let v: Value = self.client.get(&format!("/api/waiter-calls/{id}")).await?;
        let obj = v.get("call").unwrap_or(&v);
        serde_json::from_value(obj.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
