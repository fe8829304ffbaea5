//! 单次尝试执行：限流闸门、超时包装的适配器调用与响应规范化。
//!
//! Single-attempt execution against one backend (no retry, no fallback).

use crate::drivers::{AdapterReply, AdapterRequest};
use crate::types::{Backend, QueryRequest};
use crate::Error;
use tokio::time::{Duration, Instant};
use tracing::debug;

use super::core::QueryOrchestrator;

/// Result of one attempt. Policy loops live in the caller.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    Success { reply: AdapterReply, latency: Duration },
    /// Refused locally; the backend was never called.
    RateLimited,
    Failed { error: Error, latency: Duration },
}

impl AttemptOutcome {
    pub fn latency_ms(latency: Duration) -> u64 {
        latency.as_millis() as u64
    }
}

impl QueryOrchestrator {
    pub(crate) async fn execute_once(
        &self,
        backend: Backend,
        request: &QueryRequest,
    ) -> AttemptOutcome {
        if !self.limiter.try_consume(backend).await {
            debug!(backend = %backend, "rate limit window exhausted");
            return AttemptOutcome::RateLimited;
        }

        let Some(adapter) = self.adapters.get(backend) else {
            return AttemptOutcome::Failed {
                error: Error::configuration(format!("no adapter registered for '{}'", backend)),
                latency: Duration::ZERO,
            };
        };

        let call = AdapterRequest::from_query(request, self.config.model_for(backend));
        let timeout = self.config.attempt_timeout;
        let start = Instant::now();
        let result = tokio::time::timeout(timeout, adapter.call(&call)).await;
        let latency = start.elapsed();

        match result {
            Ok(Ok(reply)) => AttemptOutcome::Success { reply, latency },
            Ok(Err(error)) => AttemptOutcome::Failed { error, latency },
            Err(_) => AttemptOutcome::Failed {
                error: Error::Timeout {
                    backend,
                    timeout_ms: timeout.as_millis() as u64,
                },
                latency,
            },
        }
    }
}
