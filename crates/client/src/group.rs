// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group ordering: shared carts plus the WebSocket event feed.
//!
//! This is a thin adapter over server-authoritative group state: join
//! codes, participants, and spending limits are all computed remotely;
//! the client only mirrors what the server pushes. The feed maintains
//! one WS connection per watched group with exponential reconnect
//! backoff and fans events out on a broadcast channel.

use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::token::AuthToken;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Spending cap in minor units, when the host set one.
    #[serde(default, alias = "limitCents")]
    pub limit: Option<u64>,
    #[serde(default, alias = "spentCents")]
    pub spent: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOrder {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "joinCode")]
    pub join_code: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// Events pushed over the group WS feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupEvent {
    ParticipantJoined {
        #[serde(default)]
        name: String,
    },
    ParticipantLeft {
        #[serde(default)]
        name: String,
    },
    ItemAdded {
        #[serde(default)]
        participant: String,
        #[serde(default)]
        item: String,
        #[serde(default)]
        quantity: u32,
    },
    LimitSet {
        #[serde(default)]
        participant: String,
        #[serde(default, alias = "limitCents")]
        limit: u64,
    },
    /// The host locked the order for submission.
    Locked,
}

/// Initial backoff for feed reconnection attempts.
const RECONNECT_INITIAL: Duration = Duration::from_millis(200);
/// Maximum backoff for feed reconnection attempts.
const RECONNECT_MAX: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct GroupService {
    client: ApiClient,
}

impl GroupService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /api/group-orders` — start a group for a table; the
    /// response carries the join code to share.
    pub async fn create(&self, table: &str) -> Result<GroupOrder, ApiError> {
        let v: Value =
            self.client.post("/api/group-orders", &serde_json::json!({ "table": table })).await?;
        group_from(&v)
    }

    /// `POST /api/group-orders/join` with a join code.
    pub async fn join(&self, code: &str, display_name: &str) -> Result<GroupOrder, ApiError> {
        let v: Value = self
            .client
            .post(
                "/api/group-orders/join",
                &serde_json::json!({ "code": code, "name": display_name }),
            )
            .await?;
        group_from(&v)
    }

    pub async fn get(&self, id: &str) -> Result<GroupOrder, ApiError> {
        let v: Value = self.client.get(&format!("/api/group-orders/{id}")).await?;
        group_from(&v)
    }

    /// `POST /api/group-orders/{id}/items` — add an item under the
    /// caller's participant. Limit enforcement is server-side; a
    /// breach comes back as a 4xx with the server's message.
    pub async fn add_item(
        &self,
        id: &str,
        menu_item_id: &str,
        quantity: u32,
    ) -> Result<GroupOrder, ApiError> {
        let v: Value = self
            .client
            .post(
                &format!("/api/group-orders/{id}/items"),
                &serde_json::json!({ "menuItemId": menu_item_id, "quantity": quantity }),
            )
            .await?;
        group_from(&v)
    }

    /// `POST /api/group-orders/{id}/limits` — host sets a participant
    /// spending cap.
    pub async fn set_limit(
        &self,
        id: &str,
        participant: &str,
        limit: u64,
    ) -> Result<GroupOrder, ApiError> {
        let v: Value = self
            .client
            .post(
                &format!("/api/group-orders/{id}/limits"),
                &serde_json::json!({ "participant": participant, "limitCents": limit }),
            )
            .await?;
        group_from(&v)
    }

    /// `POST /api/group-orders/{id}/lock` — host locks the group so
    /// the combined order can be submitted.
    pub async fn lock(&self, id: &str) -> Result<GroupOrder, ApiError> {
        let v: Value =
            self.client.post(&format!("/api/group-orders/{id}/lock"), &serde_json::json!({})).await?;
        group_from(&v)
    }

    /// Spawn the WS event feed for one group. Events arrive on the
    /// returned receiver until `cancel` fires; the connection is
    /// re-established with backoff after drops.
    pub fn spawn_event_feed(
        &self,
        group_id: &str,
        cancel: CancellationToken,
    ) -> broadcast::Receiver<GroupEvent> {
        let (event_tx, event_rx) = broadcast::channel(64);
        let url = self.feed_url(group_id);

        tokio::spawn(async move {
            let mut backoff = RECONNECT_INITIAL;
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                match tokio_tungstenite::connect_async(&url).await {
                    Ok((ws_stream, _)) => {
                        backoff = RECONNECT_INITIAL; // reset on successful connect
                        debug!("group feed connected");
                        let (_write, mut read) = ws_stream.split();
                        loop {
                            tokio::select! {
                                _ = cancel.cancelled() => return,
                                msg = read.next() => {
                                    match msg {
                                        Some(Ok(Message::Text(text))) => {
                                            // Unknown event types are skipped, not errors.
                                            if let Ok(event) = serde_json::from_str::<GroupEvent>(&text.to_string()) {
                                                let _ = event_tx.send(event);
                                            }
                                        }
                                        Some(Ok(Message::Close(_))) | None => {
                                            debug!("group feed closed");
                                            break;
                                        }
                                        Some(Err(e)) => {
                                            debug!(err = %e, "group feed error");
                                            break;
                                        }
                                        _ => {}
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        debug!(err = %e, backoff_ms = backoff.as_millis() as u64, "group feed connect failed");
                    }
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(RECONNECT_MAX);
            }
        });

        event_rx
    }

    /// WS endpoint for a group's feed. A bearer token rides as a query
    /// parameter; opaque sessions rely on the cookie sent during the
    /// HTTP upgrade.
    fn feed_url(&self, group_id: &str) -> String {
        let base = self.client.base_url();
        let ws_base = if base.starts_with("https://") {
            base.replacen("https://", "wss://", 1)
        } else {
            base.replacen("http://", "ws://", 1)
        };
        let mut url = format!("{ws_base}/ws/group-orders/{group_id}");
        if let Some(AuthToken::Bearer(tok)) = self.client.store().token() {
            url.push_str(&format!("?token={tok}"));
        }
        url
    }
}

fn group_from(v: &Value) -> Result<GroupOrder, ApiError> {
    let obj = v.get("group").unwrap_or(v);
    serde_json::from_value(obj.clone()).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
