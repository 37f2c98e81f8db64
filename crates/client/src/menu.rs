// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Menu catalog browsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;

/// One orderable item. Prices are in minor units (cents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "priceCents")]
    pub price: u64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Clone)]
pub struct MenuService {
    client: ApiClient,
}

impl MenuService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Full menu, optionally narrowed to a category.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<MenuItem>, ApiError> {
        let path = match category {
            Some(c) => format!("/api/menu?category={c}"),
            None => "/api/menu".to_owned(),
        };
        let v: Value = self.client.get(&path).await?;
        items_from(&v)
    }

    pub async fn item(&self, id: &str) -> Result<MenuItem, ApiError> {
        let v: Value = self.client.get(&format!("/api/menu/{id}")).await?;
        let obj = v.get("item").unwrap_or(&v);
        serde_json::from_value(obj.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// The menu endpoint answers either a bare array or `{"items": [...]}`.
fn items_from(v: &Value) -> Result<Vec<MenuItem>, ApiError> {
    let arr = v.get("items").unwrap_or(v);
    serde_json::from_value(arr.clone()).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "menu_tests.rs"]
mod tests;
