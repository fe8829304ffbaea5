//! Provider 适配层 — 每个后端实现统一的 `call` 契约，编排器通过查找表分发
//!
//! Provider adapter contract.
//!
//! Every backend integration implements [`ProviderAdapter`]. The orchestrator
//! treats adapters as interchangeable opaque I/O and looks them up through an
//! [`AdapterTable`] keyed by [`Backend`], never by string.
//!
//! The HTTP adapters in this module are one implementation of the contract;
//! tests and embedders can register any other.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod perplexity;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::transport::HttpTransport;
use crate::types::{Backend, Message, MessageRole, QueryRequest};
use crate::Result;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
pub use perplexity::PerplexityAdapter;

/// Everything an adapter needs for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterRequest {
    pub message: String,
    pub context: Option<String>,
    pub history: Vec<Message>,
    pub system_prompt: Option<String>,
    /// Backend-native model name, chosen by the orchestrator.
    pub model: String,
}

impl AdapterRequest {
    pub fn from_query(request: &QueryRequest, model: impl Into<String>) -> Self {
        Self {
            message: request.message.clone(),
            context: request.context.clone(),
            history: request.history.clone(),
            system_prompt: request.system_prompt.clone(),
            model: model.into(),
        }
    }

    /// System prompt and context as the system-level instructions, if any.
    pub fn system_text(&self) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        if let Some(ref p) = self.system_prompt {
            parts.push(p.clone());
        }
        if let Some(ref c) = self.context {
            parts.push(format!("Context:\n{}", c));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Flat conversation: system text, history, then the new user message.
    pub fn to_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system) = self.system_text() {
            messages.push(Message::system(system));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user(self.message.clone()));
        messages
    }

    /// Split into (system text, non-system turns) for APIs that take the
    /// system prompt as a top-level field. System turns found in the history
    /// are appended to the system text.
    pub fn split_system(&self) -> (Option<String>, Vec<Message>) {
        let mut system_parts: Vec<String> = self.system_text().into_iter().collect();
        let mut turns = Vec::with_capacity(self.history.len() + 1);
        for m in &self.history {
            match m.role {
                MessageRole::System => system_parts.push(m.content.clone()),
                _ => turns.push(m.clone()),
            }
        }
        turns.push(Message::user(self.message.clone()));

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system, turns)
    }
}

/// What a backend returned, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterReply {
    pub content: String,
    pub citations: Option<Vec<String>>,
}

impl AdapterReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            citations: None,
        }
    }

    pub fn with_citations(mut self, citations: Vec<String>) -> Self {
        self.citations = Some(citations);
        self
    }
}

/// Uniform call signature every backend integration satisfies.
///
/// Implementations must return `Err` on timeouts, HTTP errors and malformed
/// responses instead of a degraded success.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn call(&self, request: &AdapterRequest) -> Result<AdapterReply>;
}

/// Lookup table from backend variant to its adapter.
#[derive(Clone, Default)]
pub struct AdapterTable {
    adapters: HashMap<Backend, Arc<dyn ProviderAdapter>>,
}

impl AdapterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, backend: Backend, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(backend, adapter);
    }

    pub fn with(mut self, backend: Backend, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.insert(backend, adapter);
        self
    }

    pub fn get(&self, backend: Backend) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(&backend)
    }

    pub fn contains(&self, backend: Backend) -> bool {
        self.adapters.contains_key(&backend)
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Registered backends in default tier order.
    pub fn backends(&self) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|b| self.adapters.contains_key(b))
            .collect()
    }
}

impl fmt::Debug for AdapterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterTable")
            .field("backends", &self.backends())
            .finish()
    }
}

/// Factory for the HTTP adapter of a backend.
pub fn create_http_adapter(transport: HttpTransport) -> Arc<dyn ProviderAdapter> {
    match transport.backend() {
        Backend::Perplexity => Arc::new(PerplexityAdapter::new(transport)),
        Backend::OpenAi => Arc::new(OpenAiAdapter::new(transport)),
        Backend::Gemini => Arc::new(GeminiAdapter::new(transport)),
        Backend::Anthropic => Arc::new(AnthropicAdapter::new(transport)),
    }
}

/// HTTP adapters for every backend, with credentials from the keyring or env.
pub fn http_adapters() -> Result<AdapterTable> {
    let mut table = AdapterTable::new();
    for backend in Backend::ALL {
        let transport = HttpTransport::from_env(backend)?;
        table.insert(backend, create_http_adapter(transport));
    }
    Ok(table)
}
