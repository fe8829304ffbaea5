//! Normalized response returned to callers.

use super::backend::Backend;
use serde::{Deserialize, Serialize};

/// One backend's answer in the shared shape every backend is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub content: String,
    pub provider: Backend,
    pub model: String,
    /// Wall time of the attempt that produced this answer.
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
    /// True when served from the response cache.
    pub cached: bool,
    /// 1-based position of `provider` in the tier order.
    pub tier: usize,
}

impl QueryResponse {
    /// A fallback is any answer produced below the first tier.
    pub fn is_fallback(&self) -> bool {
        self.tier > 1
    }
}
