// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI ordering assistant and text-to-speech.
//!
//! Inference runs remotely; the client sends the running transcript
//! and gets text (or synthesized audio bytes) back.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
}

#[derive(Clone)]
pub struct ChatService {
    client: ApiClient,
}

impl ChatService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /api/chat/assistant` — one turn against the assistant.
    pub async fn send(&self, message: &str, history: &[ChatTurn]) -> Result<String, ApiError> {
        let v: Value = self
            .client
            .post(
                "/api/chat/assistant",
                &serde_json::json!({ "message": message, "history": history }),
            )
            .await?;
        v.get("reply")
            .or_else(|| v.get("message"))
            .and_then(|r| r.as_str())
            .map(str::to_owned)
            .ok_or_else(|| ApiError::Decode("no reply in assistant response".to_owned()))
    }

    /// `POST /api/chat/tts` — synthesized audio for a reply.
    pub async fn tts(&self, text: &str) -> Result<Bytes, ApiError> {
        self.client.post_bytes("/api/chat/tts", &serde_json::json!({ "text": text })).await
    }
}
