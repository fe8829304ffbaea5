//! 弹性模块：每个后端的固定窗口限流与层内重试退避。
//!
//! # Resilience Primitives Module
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`rate_limiter`] | Per-backend fixed-window request counter |
//! | [`retry`] | Bounded retries with exponential backoff within a tier |
//!
//! ## Rate Limiter
//!
//! ```rust
//! use ai_query_orchestrator::resilience::rate_limiter::{RateLimiter, RateLimiterConfig};
//! use ai_query_orchestrator::types::Backend;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let limiter = RateLimiter::new(RateLimiterConfig::new().with_limit(Backend::Gemini, 1));
//! assert!(limiter.try_consume(Backend::Gemini).await);
//! assert!(!limiter.try_consume(Backend::Gemini).await);
//! # }
//! ```
//!
//! ## Retry
//!
//! ```rust
//! use ai_query_orchestrator::resilience::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.delay_after(0), Some(Duration::from_millis(500)));
//! assert_eq!(policy.delay_after(1), Some(Duration::from_millis(1000)));
//! assert_eq!(policy.delay_after(2), None);
//! ```

pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::{ProviderStatus, RateLimiter, RateLimiterConfig};
pub use retry::RetryPolicy;
