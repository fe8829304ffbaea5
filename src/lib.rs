//! # ai-query-orchestrator
//!
//! 多厂商 AI 查询编排器：在 Perplexity、OpenAI、Gemini 与 Anthropic 之间统一路由，
//! 提供响应缓存、按后端限流、分层重试回退与用量统计。
//!
//! Multi-provider AI query orchestrator. Accepts a natural-language query and
//! answers it from the first backend that succeeds, with response caching,
//! per-backend rate limiting, tiered fallback and usage metrics.
//!
//! ## Overview
//!
//! - **Cache first**: identical requests within the TTL are served from memory
//!   and marked `cached`.
//! - **Tiered fallback**: backends are tried in a fixed priority order; each
//!   gets bounded retries with exponential backoff before the next tier.
//! - **Explicit mode**: naming a provider makes exactly one attempt against it
//!   and never falls back.
//! - **Local rate limiting**: fixed-window per-backend ceilings are enforced
//!   before any network call.
//! - **Normalized answers**: one response shape regardless of backend, with
//!   inline citation markers stripped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_query_orchestrator::{QueryOrchestratorBuilder, QueryRequest};
//!
//! #[tokio::main]
//! async fn main() -> ai_query_orchestrator::Result<()> {
//!     let orchestrator = QueryOrchestratorBuilder::new()
//!         .http_adapters()?
//!         .build()
//!         .await?;
//!
//!     let answer = orchestrator
//!         .query(QueryRequest::new("What is 2+2?").with_context("arithmetic"))
//!         .await?;
//!     println!("{} via {} (tier {})", answer.content, answer.provider, answer.tier);
//!
//!     orchestrator.dispose();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`orchestrator`] | Public entry point, configuration and builder |
//! | [`types`] | Requests, responses, messages and backend identifiers |
//! | [`cache`] | Fingerprinting and the TTL response store |
//! | [`resilience`] | Fixed-window rate limiter and retry policy |
//! | [`drivers`] | Provider adapter contract and HTTP adapters |
//! | [`transport`] | Shared HTTP plumbing for the adapters |
//! | [`normalize`] | Citation-marker stripping |
//! | [`telemetry`] | Usage counters and rolling latency |

pub mod cache;
pub mod drivers;
pub mod normalize;
pub mod orchestrator;
pub mod resilience;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use drivers::{AdapterReply, AdapterRequest, ProviderAdapter};
pub use orchestrator::{OrchestratorConfig, QueryOrchestrator, QueryOrchestratorBuilder};
pub use telemetry::UsageMetrics;
pub use types::{
    backend::Backend,
    message::{Message, MessageRole},
    request::{ProviderPreference, QueryRequest},
    response::QueryResponse,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{BackendFailure, Error, ErrorContext};
