use crate::types::Backend;
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use reqwest::Proxy;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::debug;

/// HTTP client bound to one backend's endpoint and credentials.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    backend: Backend,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Build a transport for `backend` without looking up credentials.
    ///
    /// The base URL comes from `AI_QUERY_<BACKEND>_BASE_URL` when set.
    pub fn new(backend: Backend) -> Result<Self> {
        // Minimal production-friendly defaults (env-overridable).
        let timeout_secs = env::var("AI_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("AI_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder.build()?;
        let transport = Self {
            client,
            backend,
            base_url: default_base_url(backend).to_string(),
            api_key: None,
        };

        match env::var(format!("AI_QUERY_{}_BASE_URL", backend.env_key())) {
            Ok(url) => transport.with_base_url(url),
            Err(_) => Ok(transport),
        }
    }

    /// Build a transport and resolve its API key from the keyring or environment.
    pub fn from_env(backend: Backend) -> Result<Self> {
        let mut transport = Self::new(backend)?;
        transport.api_key = Self::get_api_key(backend);
        Ok(transport)
    }

    fn get_api_key(backend: Backend) -> Option<String> {
        // 1. Try Keyring
        if let Ok(entry) = Entry::new("ai-query", backend.id()) {
            if let Ok(key) = entry.get_password() {
                return Some(key);
            }
        }

        // 2. Try Environment Variable (OPENAI_API_KEY, GEMINI_API_KEY, ...)
        env::var(format!("{}_API_KEY", backend.env_key())).ok()
    }

    /// Point the transport at another server (mock servers, proxies, regional endpoints).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL for {}: {}", self.backend, e),
                ErrorContext::new()
                    .with_field_path(format!("AI_QUERY_{}_BASE_URL", self.backend.env_key()))
                    .with_details(base_url.clone())
                    .with_source("transport"),
            )
        })?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The configured key, or a provider error naming the env var to set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::provider(
                self.backend,
                format!(
                    "missing API key (set {}_API_KEY)",
                    self.backend.env_key()
                ),
            )
        })
    }

    /// POST a JSON body and return the decoded JSON reply.
    ///
    /// Connection failures, non-2xx statuses and undecodable bodies all come
    /// back as [`Error::Provider`] so the caller sees which backend failed.
    pub async fn post_json(
        &self,
        path: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        for (k, v) in headers {
            request = request.header(*k, *v);
        }

        debug!(backend = %self.backend, %url, "sending request");
        let response = request.send().await.map_err(|e| Error::Provider {
            backend: self.backend,
            status: e.status().map(|s| s.as_u16()),
            message: format!("request failed: {}", e),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| Error::Provider {
            backend: self.backend,
            status: Some(status.as_u16()),
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(Error::Provider {
                backend: self.backend,
                status: Some(status.as_u16()),
                message: error_message_from_body(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            Error::provider(self.backend, format!("malformed response body: {}", e))
        })
    }
}

pub fn default_base_url(backend: Backend) -> &'static str {
    match backend {
        Backend::Perplexity => "https://api.perplexity.ai",
        Backend::OpenAi => "https://api.openai.com",
        Backend::Gemini => "https://generativelanguage.googleapis.com",
        Backend::Anthropic => "https://api.anthropic.com",
    }
}

/// Pull a human-readable message out of an error body.
///
/// All four backends use `{"error": {"message": ...}}`; anything else is
/// returned verbatim (truncated).
fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty error body".to_string()
            } else {
                trimmed.chars().take(300).collect()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message_from_body(r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#),
            "Rate limit reached"
        );
        assert_eq!(error_message_from_body("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message_from_body("  "), "empty error body");
    }

    #[test]
    fn test_base_url_override_is_validated() {
        let t = HttpTransport::new(Backend::OpenAi)
            .unwrap()
            .with_base_url("http://127.0.0.1:4010/")
            .unwrap();
        assert_eq!(t.base_url(), "http://127.0.0.1:4010");

        let err = HttpTransport::new(Backend::OpenAi)
            .unwrap()
            .with_base_url("not a url")
            .unwrap_err();
        assert!(err.to_string().contains("invalid base URL for openai"));
    }

    #[test]
    fn test_missing_key_is_a_provider_error() {
        let t = HttpTransport::new(Backend::Gemini).unwrap();
        let err = t.require_api_key().unwrap_err();
        assert!(matches!(err, Error::Provider { backend: Backend::Gemini, .. }));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
        assert_eq!(t.with_api_key("k").require_api_key().unwrap(), "k");
    }
}
