//! Perplexity adapter.
//!
//! OpenAI-compatible request shape. Replies carry inline `[n]` markers whose
//! sources arrive in a top-level `citations` array (or `search_results` on
//! newer API versions).

use async_trait::async_trait;
use serde_json::Value;

use super::openai::{chat_body, chat_content};
use super::{AdapterReply, AdapterRequest, ProviderAdapter};
use crate::transport::HttpTransport;
use crate::types::Backend;
use crate::Result;

const CHAT_PATH: &str = "/chat/completions";

#[derive(Debug, Clone)]
pub struct PerplexityAdapter {
    transport: HttpTransport,
}

impl PerplexityAdapter {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

fn citations(body: &Value) -> Option<Vec<String>> {
    if let Some(list) = body.get("citations").and_then(|v| v.as_array()) {
        return Some(
            list.iter()
                .filter_map(|c| c.as_str().map(String::from))
                .collect(),
        );
    }
    body.get("search_results")
        .and_then(|v| v.as_array())
        .map(|results| {
            results
                .iter()
                .filter_map(|r| r.get("url").and_then(|u| u.as_str()).map(String::from))
                .collect()
        })
}

#[async_trait]
impl ProviderAdapter for PerplexityAdapter {
    async fn call(&self, request: &AdapterRequest) -> Result<AdapterReply> {
        let key = self.transport.require_api_key()?;
        let auth = format!("Bearer {}", key);
        let body = self
            .transport
            .post_json(CHAT_PATH, &[("authorization", auth.as_str())], &chat_body(request))
            .await?;
        Ok(AdapterReply {
            content: chat_content(Backend::Perplexity, &body)?,
            citations: citations(&body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citations_from_top_level_array() {
        let body = serde_json::json!({
            "choices": [{"message": {"content": "Paris [1]."}}],
            "citations": ["https://en.wikipedia.org/wiki/Paris"],
        });
        assert_eq!(
            citations(&body).unwrap(),
            vec!["https://en.wikipedia.org/wiki/Paris"]
        );
    }

    #[test]
    fn test_citations_from_search_results() {
        let body = serde_json::json!({
            "search_results": [{"title": "a", "url": "https://a.example"}, {"title": "b"}],
        });
        assert_eq!(citations(&body).unwrap(), vec!["https://a.example"]);
        assert!(citations(&serde_json::json!({})).is_none());
    }
}
