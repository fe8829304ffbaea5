use crate::cache::{CacheKeyGenerator, CacheStats, ResponseCache};
use crate::drivers::{AdapterReply, AdapterTable};
use crate::error::BackendFailure;
use crate::normalize::normalize_reply;
use crate::resilience::{ProviderStatus, RateLimiter};
use crate::telemetry::{MetricsRecorder, UsageMetrics};
use crate::types::{Backend, QueryRequest, QueryResponse};
use crate::{Error, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::config::OrchestratorConfig;
use super::execution::AttemptOutcome;
use super::policy::{Decision, TierPolicy};

/// Routes queries across backends with caching, rate limiting, per-tier
/// retries and ordered fallback.
///
/// One orchestrator is shared by all concurrent callers; every method takes
/// `&self`. Build one with [`QueryOrchestratorBuilder`](super::QueryOrchestratorBuilder).
pub struct QueryOrchestrator {
    pub(crate) config: OrchestratorConfig,
    pub(crate) tier_order: Vec<Backend>,
    pub(crate) adapters: AdapterTable,
    pub(crate) cache: Arc<ResponseCache>,
    pub(crate) keys: CacheKeyGenerator,
    pub(crate) limiter: RateLimiter,
    pub(crate) metrics: MetricsRecorder,
    pub(crate) cleanup: Mutex<Option<JoinHandle<()>>>,
}

impl QueryOrchestrator {
    /// Answer a query from the cache or the first backend that succeeds.
    ///
    /// - `Auto` walks the tier order, giving each backend `max_retries + 1`
    ///   attempts with exponential backoff in between.
    /// - `Explicit(b)` makes exactly one attempt against `b` and never falls
    ///   back.
    ///
    /// Only successful answers are cached.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("query", request_id = %request_id, provider = %request.provider);
        self.query_inner(request).instrument(span).await
    }

    async fn query_inner(&self, request: QueryRequest) -> Result<QueryResponse> {
        let key = self.keys.generate(&request);
        if let Some(hit) = self.cache.get(&key) {
            self.metrics.record_cache_hit();
            debug!(backend = %hit.provider, "served from cache");
            return Ok(hit);
        }

        let response = match request.provider.explicit() {
            Some(backend) => {
                let tier = self.tier_of(backend).ok_or_else(|| {
                    Error::configuration(format!("backend '{}' is not configured", backend))
                })?;
                self.run(&[(backend, tier)], TierPolicy::explicit(), &request)
                    .await?
            }
            None => {
                let candidates: Vec<(Backend, usize)> = self
                    .tier_order
                    .iter()
                    .enumerate()
                    .map(|(i, b)| (*b, i + 1))
                    .collect();
                let policy = TierPolicy::auto(self.config.retry_policy());
                self.run(&candidates, policy, &request).await?
            }
        };

        self.cache.set(&key, &response);
        Ok(response)
    }

    async fn run(
        &self,
        candidates: &[(Backend, usize)],
        policy: TierPolicy,
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        let mut failures = Vec::with_capacity(candidates.len());
        let mut last: Option<Error> = None;

        for (index, &(backend, tier)) in candidates.iter().enumerate() {
            if index > 0 {
                info!(backend = %backend, tier, "escalating to next tier");
            }

            let mut attempts = 0;
            for attempt in 0..policy.attempts() {
                attempts += 1;
                let error = match self.execute_once(backend, request).await {
                    AttemptOutcome::Success { reply, latency } => {
                        return Ok(self.on_success(backend, tier, latency, reply));
                    }
                    AttemptOutcome::RateLimited => {
                        self.metrics.record_rate_limited();
                        Error::RateLimitExceeded { backend }
                    }
                    AttemptOutcome::Failed { error, latency } => {
                        self.metrics
                            .record(backend, AttemptOutcome::latency_ms(latency), false, false);
                        error
                    }
                };

                match policy.decide(attempt) {
                    Decision::Retry { delay } => {
                        warn!(
                            backend = %backend,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "attempt failed, retrying"
                        );
                        last = Some(error);
                        tokio::time::sleep(delay).await;
                    }
                    Decision::Exhausted => {
                        warn!(backend = %backend, tier, attempts, error = %error, "backend exhausted");
                        last = Some(error);
                        break;
                    }
                }
            }

            failures.push(BackendFailure {
                backend,
                attempts,
                last_error: last.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            });
        }

        // An explicit backend's failure surfaces as-is.
        match last {
            Some(error) if policy.is_explicit() => Err(error),
            _ => Err(Error::AllBackendsExhausted { failures }),
        }
    }

    fn on_success(
        &self,
        backend: Backend,
        tier: usize,
        latency: Duration,
        reply: AdapterReply,
    ) -> QueryResponse {
        let latency_ms = AttemptOutcome::latency_ms(latency);
        let was_fallback = tier > 1;
        self.metrics.record(backend, latency_ms, true, was_fallback);

        let (content, citations) = normalize_reply(backend, reply);
        info!(backend = %backend, tier, latency_ms, "query answered");
        QueryResponse {
            content,
            provider: backend,
            model: self.config.model_for(backend).to_string(),
            latency_ms,
            citations,
            cached: false,
            tier,
        }
    }

    /// 1-based position of `backend` in the tier order.
    pub fn tier_of(&self, backend: Backend) -> Option<usize> {
        self.tier_order
            .iter()
            .position(|b| *b == backend)
            .map(|i| i + 1)
    }

    pub fn tier_order(&self) -> &[Backend] {
        &self.tier_order
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn metrics(&self) -> UsageMetrics {
        self.metrics.snapshot()
    }

    /// Zero the counters. Cached entries and rate windows are left alone.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Window usage of every tiered backend, in tier order.
    pub async fn provider_status(&self) -> Vec<ProviderStatus> {
        self.limiter.snapshot(&self.tier_order).await
    }

    /// Stop background cleanup and drop cached entries. Idempotent.
    pub fn dispose(&self) {
        let handle = self
            .cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            debug!("cache cleanup stopped");
        }
        self.cache.clear();
    }
}

impl Drop for QueryOrchestrator {
    fn drop(&mut self) {
        let handle = self
            .cleanup
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}
