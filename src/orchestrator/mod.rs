//! 查询编排模块：缓存、限流、分层重试与回退的统一入口。
//!
//! # Query Orchestrator
//!
//! [`QueryOrchestrator`] is the public entry point. A query is answered from
//! the cache when possible; otherwise backends are tried in tier order, each
//! with bounded retries, until one succeeds or all are exhausted.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`config`] | Settings, defaults and env/YAML loading |
//! | [`builder`] | Adapter registration and startup |
//! | `core` | Public operations and the tier loop |
//! | `execution` | One rate-gated, timeout-bounded attempt |
//! | `policy` | Retry vs. escalate decisions |
//!
//! ```rust,no_run
//! use ai_query_orchestrator::orchestrator::QueryOrchestratorBuilder;
//! use ai_query_orchestrator::types::QueryRequest;
//!
//! # async fn run() -> ai_query_orchestrator::Result<()> {
//! let orchestrator = QueryOrchestratorBuilder::new()
//!     .http_adapters()?
//!     .build()
//!     .await?;
//! let answer = orchestrator.query(QueryRequest::new("What is 2+2?")).await?;
//! println!("{} (tier {})", answer.content, answer.tier);
//! orchestrator.dispose();
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
mod core;
mod execution;
mod policy;

pub use builder::QueryOrchestratorBuilder;
pub use config::OrchestratorConfig;
pub use self::core::QueryOrchestrator;
