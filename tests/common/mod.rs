//! Scripted adapters shared by the integration tests.

#![allow(dead_code)]

use ai_query_orchestrator::drivers::{AdapterReply, AdapterRequest, ProviderAdapter};
use ai_query_orchestrator::{
    Backend, Error, OrchestratorConfig, QueryOrchestrator, QueryOrchestratorBuilder, Result,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fails its first `fail_first` calls, then answers with `reply`.
pub struct ScriptedAdapter {
    backend: Backend,
    fail_first: usize,
    delay: Duration,
    reply: AdapterReply,
    calls: AtomicUsize,
    last: Mutex<Option<AdapterRequest>>,
}

impl ScriptedAdapter {
    pub fn ok(backend: Backend, content: &str) -> Self {
        Self::flaky(backend, 0, content)
    }

    pub fn failing(backend: Backend) -> Self {
        Self::flaky(backend, usize::MAX, "unreachable")
    }

    pub fn flaky(backend: Backend, fail_first: usize, content: &str) -> Self {
        Self {
            backend,
            fail_first,
            delay: Duration::ZERO,
            reply: AdapterReply::text(content),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_citations(mut self, citations: &[&str]) -> Self {
        self.reply = self
            .reply
            .with_citations(citations.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<AdapterRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    async fn call(&self, request: &AdapterRequest) -> Result<AdapterReply> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if n < self.fail_first {
            return Err(Error::provider(
                self.backend,
                format!("simulated failure {}", n + 1),
            ));
        }
        Ok(self.reply.clone())
    }
}

pub async fn orchestrator(
    config: OrchestratorConfig,
    adapters: &[(Backend, &Arc<ScriptedAdapter>)],
) -> QueryOrchestrator {
    let mut builder = QueryOrchestratorBuilder::new().config(config);
    for (backend, adapter) in adapters {
        let adapter: Arc<ScriptedAdapter> = Arc::clone(*adapter);
        builder = builder.adapter(*backend, adapter);
    }
    builder.build().await.expect("orchestrator should build")
}
