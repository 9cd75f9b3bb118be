//! Wire payloads exchanged with the chat worker, and the gateway response
//! headers that identify which backend served a reply.

use serde::{Deserialize, Serialize};

/// Response header naming the model that produced the reply.
pub const GATEWAY_MODEL_HEADER: &str = "cf-aig-model";

/// Response header naming the provider that produced the reply.
pub const GATEWAY_PROVIDER_HEADER: &str = "cf-aig-provider";

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: Option<String>,
}

impl ChatResponse {
    /// The reply text, if the worker sent a non-empty one. An absent or empty
    /// field is rendered as a placeholder by the caller, not treated as an
    /// error.
    pub fn reply_text(&self) -> Option<&str> {
        self.response.as_deref().filter(|text| !text.is_empty())
    }
}
