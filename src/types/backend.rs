//! The closed set of text-generation backends the orchestrator can route to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One interchangeable external text-generation service.
///
/// Adding or removing a backend is a compile-time change: every `match` over
/// this enum (default model, default ceiling, adapter factory) must be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Perplexity,
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
    Anthropic,
}

impl Backend {
    /// Every backend, in default tier order.
    pub const ALL: [Backend; 4] = [
        Backend::Perplexity,
        Backend::OpenAi,
        Backend::Gemini,
        Backend::Anthropic,
    ];

    /// Stable identifier used in config, env vars, logs and error messages.
    #[inline]
    pub fn id(&self) -> &'static str {
        match self {
            Backend::Perplexity => "perplexity",
            Backend::OpenAi => "openai",
            Backend::Gemini => "gemini",
            Backend::Anthropic => "anthropic",
        }
    }

    /// Model requested from this backend unless configuration overrides it.
    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::Perplexity => "sonar",
            Backend::OpenAi => "gpt-4o-mini",
            Backend::Gemini => "gemini-1.5-flash",
            Backend::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    /// Requests allowed per rate window (one minute by default).
    pub fn default_limit(&self) -> u32 {
        match self {
            Backend::Perplexity => 50,
            Backend::OpenAi => 100,
            Backend::Gemini => 60,
            Backend::Anthropic => 100,
        }
    }

    /// Whether this backend embeds numbered citation markers in its prose.
    pub fn embeds_citations(&self) -> bool {
        matches!(self, Backend::Perplexity)
    }

    /// Upper-case form used as an env var segment (`AI_QUERY_OPENAI_RPM`).
    pub fn env_key(&self) -> String {
        self.id().to_uppercase()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Backend {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Backend::ALL
            .into_iter()
            .find(|b| b.id() == normalized)
            .ok_or_else(|| {
                crate::Error::configuration_with_context(
                    format!("unknown backend '{}'", s.trim()),
                    crate::ErrorContext::new()
                        .with_details("expected one of: perplexity, openai, gemini, anthropic"),
                )
            })
    }
}
