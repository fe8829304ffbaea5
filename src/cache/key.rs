//! Cache key generation.

use crate::types::QueryRequest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// How conversation history takes part in the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKeyMode {
    /// Non-empty history is folded into the key, so two conversations that end
    /// with the same question do not share an answer.
    #[default]
    Include,
    /// Only `{message, context, systemPrompt}` are keyed.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub hash: String,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Deterministic fingerprint of the cache-relevant subset of a request.
///
/// The provider preference never takes part, so an `auto` request can reuse an
/// answer first produced for an explicit backend and vice versa.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyGenerator {
    history_mode: HistoryKeyMode,
}

impl CacheKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_mode(mut self, mode: HistoryKeyMode) -> Self {
        self.history_mode = mode;
        self
    }

    pub fn generate(&self, request: &QueryRequest) -> CacheKey {
        // BTreeMap keeps field order stable across runs.
        let mut parts: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
        parts.insert("message", request.message.clone().into());
        parts.insert("context", request.context.clone().into());
        parts.insert("systemPrompt", request.system_prompt.clone().into());
        if self.history_mode == HistoryKeyMode::Include && !request.history.is_empty() {
            parts.insert(
                "history",
                serde_json::to_value(&request.history).unwrap_or_default(),
            );
        }
        let canonical = serde_json::to_string(&parts).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        CacheKey::new(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Backend, Message};

    #[test]
    fn test_provider_preference_not_keyed() {
        let keys = CacheKeyGenerator::new();
        let auto = QueryRequest::new("What is 2+2?");
        let explicit = QueryRequest::new("What is 2+2?").with_provider(Backend::Gemini);
        assert_eq!(keys.generate(&auto), keys.generate(&explicit));
    }

    #[test]
    fn test_context_and_system_prompt_are_keyed() {
        let keys = CacheKeyGenerator::new();
        let base = QueryRequest::new("q");
        assert_ne!(
            keys.generate(&base),
            keys.generate(&base.clone().with_context("chapter 2"))
        );
        assert_ne!(
            keys.generate(&base),
            keys.generate(&base.clone().with_system_prompt("tutor"))
        );
        // `None` and empty string are different inputs.
        assert_ne!(
            keys.generate(&base),
            keys.generate(&base.clone().with_context(""))
        );
    }

    #[test]
    fn test_history_mode() {
        let a = QueryRequest::new("and then?").with_history(vec![Message::user("tell me about Rust")]);
        let b = QueryRequest::new("and then?").with_history(vec![Message::user("tell me about Go")]);
        let bare = QueryRequest::new("and then?");

        let include = CacheKeyGenerator::new();
        assert_ne!(include.generate(&a), include.generate(&b));
        assert_ne!(include.generate(&a), include.generate(&bare));

        let ignore = CacheKeyGenerator::new().with_history_mode(HistoryKeyMode::Ignore);
        assert_eq!(ignore.generate(&a), ignore.generate(&b));
        assert_eq!(ignore.generate(&a), ignore.generate(&bare));
    }

    #[test]
    fn test_key_is_stable_hex_sha256() {
        let req = QueryRequest::new("hello");
        let key = CacheKeyGenerator::new().generate(&req);
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, CacheKeyGenerator::new().generate(&req));
    }
}
