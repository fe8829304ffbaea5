//! OpenAI chat completions adapter.
//!
//! Also provides the request/response shapes shared with other
//! OpenAI-compatible backends.

use async_trait::async_trait;
use serde_json::Value;

use super::{AdapterReply, AdapterRequest, ProviderAdapter};
use crate::transport::HttpTransport;
use crate::types::Backend;
use crate::{Error, Result};

const CHAT_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    transport: HttpTransport,
}

impl OpenAiAdapter {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

/// Build an OpenAI-style `{model, messages}` body.
pub(crate) fn chat_body(request: &AdapterRequest) -> Value {
    let messages: Vec<Value> = request
        .to_messages()
        .iter()
        .map(|m| serde_json::json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();

    serde_json::json!({
        "model": request.model,
        "messages": messages,
    })
}

/// Extract `choices[0].message.content`; missing or empty content is an error.
pub(crate) fn chat_content(backend: Backend, body: &Value) -> Result<String> {
    body.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
        .ok_or_else(|| Error::provider(backend, "response has no message content"))
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    async fn call(&self, request: &AdapterRequest) -> Result<AdapterReply> {
        let key = self.transport.require_api_key()?;
        let auth = format!("Bearer {}", key);
        let body = self
            .transport
            .post_json(CHAT_PATH, &[("authorization", auth.as_str())], &chat_body(request))
            .await?;
        Ok(AdapterReply::text(chat_content(Backend::OpenAi, &body)?))
    }
}
