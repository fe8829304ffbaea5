use crate::cache::{spawn_cleanup, CacheKeyGenerator, ResponseCache};
use crate::drivers::{self, AdapterTable, ProviderAdapter};
use crate::resilience::RateLimiter;
use crate::telemetry::MetricsRecorder;
use crate::types::Backend;
use crate::{Error, ErrorContext, Result};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::config::OrchestratorConfig;
use super::core::QueryOrchestrator;

/// Builder for [`QueryOrchestrator`].
///
/// Without an explicit [`config`](Self::config) the settings come from
/// [`OrchestratorConfig::from_env`].
#[derive(Default)]
pub struct QueryOrchestratorBuilder {
    config: Option<OrchestratorConfig>,
    adapters: AdapterTable,
}

impl QueryOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register (or replace) the adapter for one backend.
    pub fn adapter(mut self, backend: Backend, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(backend, adapter);
        self
    }

    /// Register HTTP adapters for every backend.
    ///
    /// Credentials are read from the OS keyring, falling back to
    /// `<BACKEND>_API_KEY`; a missing key only fails when that backend is called.
    pub fn http_adapters(mut self) -> Result<Self> {
        let table = drivers::http_adapters()?;
        for backend in table.backends() {
            if let Some(adapter) = table.get(backend) {
                self.adapters.insert(backend, adapter.clone());
            }
        }
        Ok(self)
    }

    /// Build the orchestrator and start cache cleanup.
    ///
    /// Must be called inside a Tokio runtime. Tier-order entries without an
    /// adapter are skipped; at least one must remain.
    pub async fn build(self) -> Result<QueryOrchestrator> {
        let config = match self.config {
            Some(c) => c,
            None => OrchestratorConfig::from_env()?,
        };
        config.validate()?;

        if self.adapters.is_empty() {
            return Err(Error::configuration_with_context(
                "no provider adapters registered",
                ErrorContext::new().with_source("builder"),
            ));
        }

        let tier_order: Vec<Backend> = config
            .tier_order
            .iter()
            .copied()
            .filter(|b| {
                let present = self.adapters.contains(*b);
                if !present {
                    debug!(backend = %b, "no adapter registered, leaving out of tier order");
                }
                present
            })
            .collect();
        if tier_order.is_empty() {
            return Err(Error::configuration_with_context(
                "no tiered backend has a registered adapter",
                ErrorContext::new()
                    .with_field_path("tier_order")
                    .with_source("builder"),
            ));
        }

        let cache = Arc::new(ResponseCache::new(config.cache_ttl, config.max_cache_entries));
        let cleanup = spawn_cleanup(&cache, config.cleanup_interval);
        let limiter = RateLimiter::new(config.rate_limiter_config());
        let keys = CacheKeyGenerator::new().with_history_mode(config.history_key_mode);

        info!(
            tiers = ?tier_order,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            max_retries = config.max_retries,
            "query orchestrator ready"
        );

        Ok(QueryOrchestrator {
            config,
            tier_order,
            adapters: self.adapters,
            cache,
            keys,
            limiter,
            metrics: MetricsRecorder::new(),
            cleanup: Mutex::new(Some(cleanup)),
        })
    }
}
