//! Google Gemini generateContent adapter.
//!
//! System text goes to `system_instruction`; assistant turns use the `model`
//! role; the key travels in the `x-goog-api-key` header.

use async_trait::async_trait;
use serde_json::Value;

use super::{AdapterReply, AdapterRequest, ProviderAdapter};
use crate::transport::HttpTransport;
use crate::types::{Backend, MessageRole};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    transport: HttpTransport,
}

impl GeminiAdapter {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

fn generate_path(model: &str) -> String {
    format!("/v1beta/models/{}:generateContent", model)
}

fn generate_body(request: &AdapterRequest) -> Value {
    let (system, turns) = request.split_system();
    let contents: Vec<Value> = turns
        .iter()
        .map(|m| {
            let role = match m.role {
                MessageRole::Assistant => "model",
                _ => "user",
            };
            serde_json::json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    let mut body = serde_json::json!({ "contents": contents });
    if let Some(sys) = system {
        body["system_instruction"] = serde_json::json!({ "parts": [{ "text": sys }] });
    }
    body
}

fn reply_text(body: &Value) -> Result<String> {
    // { candidates: [{ content: { parts: [{text: "..."}] }, finishReason }], usageMetadata }
    let text: String = body
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        let reason = body
            .pointer("/candidates/0/finishReason")
            .and_then(|r| r.as_str())
            .unwrap_or("no candidates");
        return Err(Error::provider(
            Backend::Gemini,
            format!("response has no text content ({})", reason),
        ));
    }
    Ok(text)
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    async fn call(&self, request: &AdapterRequest) -> Result<AdapterReply> {
        let key = self.transport.require_api_key()?;
        let body = self
            .transport
            .post_json(
                &generate_path(&request.model),
                &[("x-goog-api-key", key)],
                &generate_body(request),
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
    fn test_generate_body_roles() {
        let query = QueryRequest::new("Why?")
            .with_context("physics")
            .with_history(vec![Message::user("Sky color?"), Message::assistant("Blue")]);
        let body = generate_body(&AdapterRequest::from_query(&query, "gemini-1.5-flash"));
        assert_eq!(
            body["system_instruction"]["parts"][0]["text"],
            "Context:\nphysics"
        );
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "Why?");
    }

    #[test]
    fn test_generate_path_includes_model() {
        assert_eq!(
            generate_path("gemini-1.5-flash"),
            "/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_blocked_candidate_is_error() {
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": []}, "finishReason": "SAFETY"}]
        });
        let err = reply_text(&body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));

        let ok = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Rayleigh "}, {"text": "scattering"}]}}]
        });
        assert_eq!(reply_text(&ok).unwrap(), "Rayleigh scattering");
    }
}
