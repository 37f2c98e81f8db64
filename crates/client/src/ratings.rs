// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Order and item ratings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "orderId")]
    pub order_id: String,
    #[serde(default)]
    pub stars: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Clone)]
pub struct RatingService {
    client: ApiClient,
}

impl RatingService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /api/v1/ratings`. Stars are 1–5; the backend enforces
    /// this too, but failing locally gives a better message.
    pub async fn submit(
        &self,
        order_id: &str,
        stars: u8,
        comment: Option<&str>,
    ) -> Result<Rating, ApiError> {
        if !(1..=5).contains(&stars) {
            return Err(ApiError::Api {
                status: 400,
                message: format!("stars must be between 1 and 5, got {stars}"),
            });
        }
        let v: Value = self
            .client
            .post(
                "/api/v1/ratings",
                &serde_json::json!({ "orderId": order_id, "stars": stars, "comment": comment }),
            )
            .await?;
        let obj = v.get("rating").unwrap_or(&v);
        serde_json::from_value(obj.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /api/v1/ratings/item/{id}` — ratings for one menu item.
    pub async fn for_item(&self, item_id: &str) -> Result<Vec<Rating>, ApiError> {
        let v: Value = self.client.get(&format!("/api/v1/ratings/item/{item_id}")).await?;
        let arr = v.get("ratings").unwrap_or(&v);
        serde_json::from_value(arr.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
#[path = "ratings_tests.rs"]
mod tests;
