use crate::types::Backend;
use std::fmt;
use thiserror::Error;

/// Structured error context for configuration and setup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key that caused the error (e.g., "tier_order", "AI_QUERY_MAX_RETRIES")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_env", "builder")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The last error a backend produced before the orchestrator gave up on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub backend: Backend,
    pub attempts: u32,
    pub last_error: String,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} attempt{}): {}",
            self.backend,
            self.attempts,
            if self.attempts == 1 { "" } else { "s" },
            self.last_error
        )
    }
}

/// Unified error type for the orchestrator.
///
/// Per-attempt failures (`RateLimitExceeded`, `Provider`, `Timeout`) stay inside the
/// retry loop. Callers only ever see a single explicit-backend failure or
/// `AllBackendsExhausted`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Rate limit exceeded for {backend}: request refused locally")]
    RateLimitExceeded { backend: Backend },

    #[error("Provider error from {backend}{}: {message}", format_status(.status))]
    Provider {
        backend: Backend,
        status: Option<u16>,
        message: String,
    },

    #[error("Attempt against {backend} timed out after {timeout_ms}ms")]
    Timeout { backend: Backend, timeout_ms: u64 },

    #[error("All backends exhausted: {}", format_failures(.failures))]
    AllBackendsExhausted { failures: Vec<BackendFailure> },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Configuration document error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (HTTP {})", s),
        None => String::new(),
    }
}

fn format_failures(failures: &[BackendFailure]) -> String {
    if failures.is_empty() {
        return "no backends were tried".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a provider error without an HTTP status (malformed body, empty content).
    pub fn provider(backend: Backend, msg: impl Into<String>) -> Self {
        Error::Provider {
            backend,
            status: None,
            message: msg.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Backends named by this error, in the order they were tried.
    pub fn backends(&self) -> Vec<Backend> {
        match self {
            Error::RateLimitExceeded { backend }
            | Error::Provider { backend, .. }
            | Error::Timeout { backend, .. } => vec![*backend],
            Error::AllBackendsExhausted { failures } => {
                failures.iter().map(|f| f.backend).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_lists_every_backend() {
        let err = Error::AllBackendsExhausted {
            failures: vec![
                BackendFailure {
                    backend: Backend::Perplexity,
                    attempts: 3,
                    last_error: "timed out".into(),
                },
                BackendFailure {
                    backend: Backend::OpenAi,
                    attempts: 1,
                    last_error: "HTTP 500".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("perplexity (3 attempts): timed out"));
        assert!(msg.contains("openai (1 attempt): HTTP 500"));
        assert_eq!(err.backends(), vec![Backend::Perplexity, Backend::OpenAi]);
    }

    #[test]
    fn test_provider_error_display_includes_status() {
        let err = Error::Provider {
            backend: Backend::Gemini,
            status: Some(503),
            message: "overloaded".into(),
        };
        assert_eq!(
            err.to_string(),
            "Provider error from gemini (HTTP 503): overloaded"
        );
    }

    #[test]
    fn test_configuration_context_formatting() {
        let err = Error::configuration_with_context(
            "tier order is empty",
            ErrorContext::new()
                .with_field_path("tier_order")
                .with_source("builder"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: tier order is empty (field: tier_order, source: builder)"
        );
        assert!(err.context().is_some());
    }
}
