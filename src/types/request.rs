//! Query request submitted to the orchestrator.

use super::backend::Backend;
use super::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend should answer a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderPreference {
    /// Walk the tier order with retries and fallback.
    #[default]
    Auto,
    /// Exactly one attempt against this backend; never falls back.
    Explicit(Backend),
}

impl ProviderPreference {
    pub fn explicit(&self) -> Option<Backend> {
        match self {
            ProviderPreference::Auto => None,
            ProviderPreference::Explicit(b) => Some(*b),
        }
    }
}

impl fmt::Display for ProviderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderPreference::Auto => f.write_str("auto"),
            ProviderPreference::Explicit(b) => f.write_str(b.id()),
        }
    }
}

impl From<ProviderPreference> for String {
    fn from(p: ProviderPreference) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for ProviderPreference {
    type Error = crate::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(ProviderPreference::Auto)
        } else {
            s.parse::<Backend>().map(ProviderPreference::Explicit)
        }
    }
}

/// A natural-language request. Treated as immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, rename = "preferredProvider")]
    pub provider: ProviderPreference,
}

impl QueryRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            history: Vec::new(),
            system_prompt: None,
            provider: ProviderPreference::Auto,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_provider(mut self, backend: Backend) -> Self {
        self.provider = ProviderPreference::Explicit(backend);
        self
    }

    pub fn with_preference(mut self, preference: ProviderPreference) -> Self {
        self.provider = preference;
        self
    }
}
