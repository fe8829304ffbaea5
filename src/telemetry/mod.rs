//! 用量遥测模块：查询计数、缓存命中、错误、回退次数与滚动平均延迟。
//!
//! Usage telemetry.
//!
//! Running counters plus a rolling average latency. The recorder is readable
//! and resettable independently of query traffic, and a reset never touches
//! the cache or rate-limit windows.

use crate::types::Backend;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

fn timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Immutable snapshot of the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetrics {
    /// Completed backend attempts, successful or not.
    pub total_queries: u64,
    pub queries_by_backend: BTreeMap<Backend, u64>,
    /// Requests answered from the cache.
    pub cached_queries: u64,
    /// Failed backend attempts.
    pub errors: u64,
    /// Successful answers from below tier 1.
    pub fallbacks: u64,
    /// Attempts refused locally by the rate limiter.
    pub rate_limited: u64,
    pub average_latency_ms: f64,
    /// Unix seconds at which the current measurement period began.
    pub period_started_at: f64,
}

impl UsageMetrics {
    fn empty() -> Self {
        Self {
            total_queries: 0,
            queries_by_backend: BTreeMap::new(),
            cached_queries: 0,
            errors: 0,
            fallbacks: 0,
            rate_limited: 0,
            average_latency_ms: 0.0,
            period_started_at: timestamp(),
        }
    }

    pub fn queries_for(&self, backend: Backend) -> u64 {
        self.queries_by_backend.get(&backend).copied().unwrap_or(0)
    }
}

/// Process-wide counters shared by every concurrent query.
///
/// A single mutex guards all fields so the average and the count it is
/// derived from always move together.
pub struct MetricsRecorder {
    inner: Mutex<UsageMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(UsageMetrics::empty()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UsageMetrics> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one completed backend attempt.
    pub fn record(&self, backend: Backend, latency_ms: u64, success: bool, was_fallback: bool) {
        let mut m = self.lock();
        m.total_queries += 1;
        *m.queries_by_backend.entry(backend).or_insert(0) += 1;
        if !success {
            m.errors += 1;
        }
        if was_fallback {
            m.fallbacks += 1;
        }
        let n = m.total_queries as f64;
        m.average_latency_ms = (m.average_latency_ms * (n - 1.0) + latency_ms as f64) / n;
    }

    pub fn record_cache_hit(&self) {
        self.lock().cached_queries += 1;
    }

    pub fn record_rate_limited(&self) {
        self.lock().rate_limited += 1;
    }

    pub fn snapshot(&self) -> UsageMetrics {
        self.lock().clone()
    }

    /// Zero every counter and start a new measurement period.
    pub fn reset(&self) {
        *self.lock() = UsageMetrics::empty();
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
