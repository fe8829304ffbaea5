//! Construction-time configuration for [`QueryOrchestrator`](super::QueryOrchestrator).

use crate::cache::HistoryKeyMode;
use crate::resilience::{RateLimiterConfig, RetryPolicy};
use crate::types::Backend;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::str::FromStr;
use std::time::Duration;

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// `limits` entries overlay the per-backend defaults; `~` lifts a backend's ceiling.
mod limits {
    use crate::types::Backend;
    use serde::{Deserialize, Deserializer};
    use std::collections::BTreeMap;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<Backend, u32>, D::Error> {
        let overrides = BTreeMap::<Backend, Option<u32>>::deserialize(d)?;
        let mut merged = super::default_limits();
        for (backend, limit) in overrides {
            match limit {
                Some(n) => merged.insert(backend, n),
                None => merged.remove(&backend),
            };
        }
        Ok(merged)
    }
}

fn default_limits() -> BTreeMap<Backend, u32> {
    Backend::ALL
        .into_iter()
        .map(|b| (b, b.default_limit()))
        .collect()
}

/// Orchestrator settings. `Default` is the reference behaviour.
///
/// ```yaml
/// cache_ttl_secs: 300
/// tier_order: [perplexity, openai, gemini, anthropic]
/// limits: { openai: 200, gemini: ~ }   # others keep 50 / 100
/// max_retries: 2
/// base_delay_ms: 500
/// attempt_timeout_ms: 30000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    #[serde(rename = "cache_ttl_secs", with = "secs")]
    pub cache_ttl: Duration,
    #[serde(rename = "cleanup_interval_secs", with = "secs")]
    pub cleanup_interval: Duration,
    pub max_cache_entries: usize,
    pub history_key_mode: HistoryKeyMode,
    #[serde(rename = "rate_window_secs", with = "secs")]
    pub rate_window: Duration,
    /// Calls per window. Backends missing here are unlimited.
    #[serde(deserialize_with = "limits::deserialize")]
    pub limits: BTreeMap<Backend, u32>,
    /// Fallback priority, tier 1 first. Fixed once the orchestrator is built.
    pub tier_order: Vec<Backend>,
    /// Model overrides; unlisted backends use [`Backend::default_model`].
    pub models: BTreeMap<Backend, String>,
    pub max_retries: u32,
    #[serde(rename = "base_delay_ms", with = "millis")]
    pub base_delay: Duration,
    #[serde(rename = "attempt_timeout_ms", with = "millis")]
    pub attempt_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(60),
            max_cache_entries: 1000,
            history_key_mode: HistoryKeyMode::Include,
            rate_window: Duration::from_secs(60),
            limits: default_limits(),
            tier_order: Backend::ALL.to_vec(),
            models: BTreeMap::new(),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid value '{}'", raw),
                ErrorContext::new()
                    .with_field_path(name)
                    .with_details(e.to_string())
                    .with_source("config_env"),
            )
        }),
        Err(_) => Ok(None),
    }
}

fn parse_tier_order(raw: &str) -> Result<Vec<Backend>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<Backend>)
        .collect()
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `AI_QUERY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = env_parse::<u64>("AI_QUERY_CACHE_TTL_SECS")? {
            cfg.cache_ttl = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<u64>("AI_QUERY_CLEANUP_INTERVAL_SECS")? {
            cfg.cleanup_interval = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<usize>("AI_QUERY_MAX_CACHE_ENTRIES")? {
            cfg.max_cache_entries = v;
        }
        if let Some(v) = env_parse::<u64>("AI_QUERY_RATE_WINDOW_SECS")? {
            cfg.rate_window = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<u32>("AI_QUERY_MAX_RETRIES")? {
            cfg.max_retries = v;
        }
        if let Some(v) = env_parse::<u64>("AI_QUERY_BASE_DELAY_MS")? {
            cfg.base_delay = Duration::from_millis(v);
        }
        if let Some(v) = env_parse::<u64>("AI_QUERY_ATTEMPT_TIMEOUT_MS")? {
            cfg.attempt_timeout = Duration::from_millis(v);
        }
        if let Ok(raw) = env::var("AI_QUERY_TIER_ORDER") {
            cfg.tier_order = parse_tier_order(&raw)?;
        }
        for backend in Backend::ALL {
            let key = backend.env_key();
            if let Some(rpm) = env_parse::<u32>(&format!("AI_QUERY_{}_RPM", key))? {
                cfg.limits.insert(backend, rpm);
            }
            if let Ok(model) = env::var(format!("AI_QUERY_{}_MODEL", key)) {
                cfg.models.insert(backend, model);
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a YAML document; absent fields keep their defaults.
    pub fn from_yaml_str(doc: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(doc)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, msg: &str| {
            Err(Error::configuration_with_context(
                msg.to_string(),
                ErrorContext::new()
                    .with_field_path(field)
                    .with_source("config"),
            ))
        };

        if self.tier_order.is_empty() {
            return invalid("tier_order", "tier order must name at least one backend");
        }
        let mut seen = HashSet::new();
        for b in &self.tier_order {
            if !seen.insert(*b) {
                return invalid(
                    "tier_order",
                    &format!("backend '{}' appears more than once in the tier order", b),
                );
            }
        }
        if self.max_cache_entries == 0 {
            return invalid("max_cache_entries", "cache must hold at least one entry");
        }
        if self.cache_ttl.is_zero() {
            return invalid("cache_ttl_secs", "cache TTL must be positive");
        }
        if self.cleanup_interval.is_zero() {
            return invalid("cleanup_interval_secs", "cleanup interval must be positive");
        }
        if self.rate_window.is_zero() {
            return invalid("rate_window_secs", "rate window must be positive");
        }
        if self.attempt_timeout.is_zero() {
            return invalid("attempt_timeout_ms", "attempt timeout must be positive");
        }
        Ok(())
    }

    pub fn model_for(&self, backend: Backend) -> &str {
        self.models
            .get(&backend)
            .map(String::as_str)
            .unwrap_or_else(|| backend.default_model())
    }

    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            window: self.rate_window,
            limits: self.limits.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.base_delay)
    }

    pub fn with_tier_order(mut self, order: Vec<Backend>) -> Self {
        self.tier_order = order;
        self
    }

    pub fn with_limit(mut self, backend: Backend, limit: u32) -> Self {
        self.limits.insert(backend, limit);
        self
    }

    pub fn with_model(mut self, backend: Backend, model: impl Into<String>) -> Self {
        self.models.insert(backend, model.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_history_key_mode(mut self, mode: HistoryKeyMode) -> Self {
        self.history_key_mode = mode;
        self
    }

    pub fn with_rate_window(mut self, window: Duration) -> Self {
        self.rate_window = window;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}
