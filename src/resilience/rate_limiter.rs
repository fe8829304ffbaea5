use crate::types::Backend;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Live view of one backend's window, for dashboards and `ai-query status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub backend: Backend,
    /// Whether a call issued right now would be admitted.
    pub available_now: bool,
    pub requests_used_in_window: u32,
    /// `None` means the backend is not limited.
    pub limit: Option<u32>,
    /// Time until the current window rolls over, if one is open.
    pub resets_in_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Length of one fixed window.
    pub window: Duration,
    /// Calls admitted per window, per backend.
    pub limits: BTreeMap<Backend, u32>,
}

impl RateLimiterConfig {
    /// Create a new config with the reference per-minute ceilings
    pub fn new() -> Self {
        Self {
            window: Duration::from_secs(60),
            limits: Backend::ALL
                .into_iter()
                .map(|b| (b, b.default_limit()))
                .collect(),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_limit(mut self, backend: Backend, limit: u32) -> Self {
        self.limits.insert(backend, limit);
        self
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Fixed-window request counter, one window per backend.
///
/// - Windows open lazily on a backend's first call.
/// - A refused call does not count against the window.
/// - Bursts of up to twice the limit are possible across a window boundary.
pub struct RateLimiter {
    cfg: RateLimiterConfig,
    state: Mutex<HashMap<Backend, WindowState>>,
}

impl RateLimiter {
    pub fn new(cfg: RateLimiterConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self, backend: Backend) -> Option<u32> {
        self.cfg.limits.get(&backend).copied()
    }

    pub fn window(&self) -> Duration {
        self.cfg.window
    }

    /// Admit one call for `backend` if its window has budget left.
    pub async fn try_consume(&self, backend: Backend) -> bool {
        let Some(limit) = self.limit(backend) else {
            return true;
        };

        let mut state = self.state.lock().await;
        let now = Instant::now();
        let st = state.entry(backend).or_insert(WindowState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(st.window_start) >= self.cfg.window {
            st.count = 0;
            st.window_start = now;
        }

        if st.count >= limit {
            return false;
        }
        st.count += 1;
        true
    }

    /// Read a backend's window without consuming from it.
    pub async fn status(&self, backend: Backend) -> ProviderStatus {
        let state = self.state.lock().await;
        self.status_locked(&state, backend, Instant::now())
    }

    /// Status of every listed backend, in the order given.
    pub async fn snapshot(&self, backends: &[Backend]) -> Vec<ProviderStatus> {
        let state = self.state.lock().await;
        let now = Instant::now();
        backends
            .iter()
            .map(|b| self.status_locked(&state, *b, now))
            .collect()
    }

    fn status_locked(
        &self,
        state: &HashMap<Backend, WindowState>,
        backend: Backend,
        now: Instant,
    ) -> ProviderStatus {
        let limit = self.limit(backend);
        let (used, resets_in_ms) = match state.get(&backend) {
            Some(st) => {
                let elapsed = now.duration_since(st.window_start);
                if elapsed >= self.cfg.window {
                    (0, None)
                } else {
                    let left = self.cfg.window - elapsed;
                    (st.count, Some(left.as_millis() as u64))
                }
            }
            None => (0, None),
        };
        ProviderStatus {
            backend,
            available_now: limit.map_or(true, |l| used < l),
            requests_used_in_window: used,
            limit,
            resets_in_ms,
        }
    }
}
