//! 响应缓存模块：按请求指纹复用先前的回答，带 TTL 过期。
//!
//! # Response Caching Module
//!
//! Maps a deterministic request fingerprint to a previously computed
//! [`QueryResponse`](crate::types::QueryResponse) so repeated questions skip the
//! backends entirely.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | Thread-safe in-memory store with TTL expiry |
//! | [`CacheKeyGenerator`] | SHA-256 fingerprint of `{message, context, systemPrompt}` |
//! | [`HistoryKeyMode`] | Whether conversation history joins the fingerprint |
//! | [`spawn_cleanup`] | Periodic background purge of expired entries |
//!
//! ## Example
//!
//! ```rust
//! use ai_query_orchestrator::cache::{CacheKeyGenerator, ResponseCache};
//! use ai_query_orchestrator::types::QueryRequest;
//! use std::time::Duration;
//!
//! let cache = ResponseCache::new(Duration::from_secs(300), 1000);
//! let key = CacheKeyGenerator::new().generate(&QueryRequest::new("What is 2+2?"));
//! assert!(cache.get(&key).is_none());
//! ```
//!
//! Expiry is checked lazily on `get` and eagerly by the cleanup task, so a
//! stale entry is never returned even between cleanup ticks.

mod key;
mod store;

pub use key::{CacheKey, CacheKeyGenerator, HistoryKeyMode};
pub use store::{spawn_cleanup, CacheStats, ResponseCache};
