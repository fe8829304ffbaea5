//! Anthropic Messages API adapter. Handles the key differences from OpenAI:
//! - System text is a top-level `system` parameter, not part of `messages`.
//! - Auth uses `x-api-key` plus a pinned `anthropic-version` header.
//! - Reply text lives in typed `content` blocks.
//! - `max_tokens` is required, not optional.

use async_trait::async_trait;
use serde_json::Value;

use super::{AdapterReply, AdapterRequest, ProviderAdapter};
use crate::transport::HttpTransport;
use crate::types::Backend;
use crate::{Error, Result};

const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    transport: HttpTransport,
}

impl AnthropicAdapter {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

fn messages_body(request: &AdapterRequest) -> Value {
    let (system, turns) = request.split_system();
    let messages: Vec<Value> = turns
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": [{ "type": "text", "text": m.content }],
            })
        })
        .collect();

    let mut body = serde_json::json!({
        "model": request.model,
        "messages": messages,
        "max_tokens": DEFAULT_MAX_TOKENS,
    });
    if let Some(sys) = system {
        body["system"] = Value::String(sys);
    }
    body
}

fn reply_text(body: &Value) -> Result<String> {
    // { content: [{type: "text", text: "..."}], stop_reason, usage }
    let text: String = body
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(Error::provider(
            Backend::Anthropic,
            "response has no text content",
        ));
    }
    Ok(text)
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    async fn call(&self, request: &AdapterRequest) -> Result<AdapterReply> {
        let key = self.transport.require_api_key()?;
        let body = self
            .transport
            .post_json(
                MESSAGES_PATH,
                &[("x-api-key", key), ("anthropic-version", API_VERSION)],
                &messages_body(request),
            )
            .await?;
        Ok(AdapterReply::text(reply_text(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, QueryRequest};

    #[test]
    fn test_system_is_top_level() {
        let query = QueryRequest::new("Hi")
            .with_system_prompt("Be kind.")
            .with_history(vec![Message::user("Hello"), Message::assistant("Hey")]);
        let body = messages_body(&AdapterRequest::from_query(&query, "claude"));
        assert_eq!(body["system"], "Be kind.");
        assert_eq!(body["max_tokens"], 1024);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2]["content"][0]["text"], "Hi");
    }

    #[test]
    fn test_no_system_field_when_absent() {
        let body = messages_body(&AdapterRequest::from_query(&QueryRequest::new("Hi"), "claude"));
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_reply_text_joins_text_blocks() {
        let body = serde_json::json!({
            "content": [
                {"type": "text", "text": "Four"},
                {"type": "tool_use", "id": "x", "name": "calc", "input": {}},
                {"type": "text", "text": "."}
            ],
            "stop_reason": "end_turn"
        });
        assert_eq!(reply_text(&body).unwrap(), "Four.");
        assert!(reply_text(&serde_json::json!({"content": []})).is_err());
    }
}
