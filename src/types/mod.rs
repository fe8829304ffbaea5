//! 类型系统模块：查询请求、响应与后端标识。
//!
//! # Types Module
//!
//! Strongly-typed representations of everything that crosses the orchestrator
//! boundary.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Backend`] | Closed set of text-generation backends |
//! | [`QueryRequest`] | Message, optional context/history/system prompt, provider preference |
//! | [`ProviderPreference`] | `auto` or one explicit backend |
//! | [`QueryResponse`] | Normalized answer with provider, model, latency, tier |
//! | [`Message`] | One turn of conversation history |
//!
//! ## Example
//!
//! ```rust
//! use ai_query_orchestrator::types::{Backend, Message, QueryRequest};
//!
//! let req = QueryRequest::new("And in base 3?")
//!     .with_history(vec![
//!         Message::user("What is 2+2?"),
//!         Message::assistant("4"),
//!     ])
//!     .with_provider(Backend::Anthropic);
//! assert_eq!(req.provider.explicit(), Some(Backend::Anthropic));
//! ```

pub mod backend;
pub mod message;
pub mod request;
pub mod response;

pub use backend::Backend;
pub use message::{Message, MessageRole};
pub use request::{ProviderPreference, QueryRequest};
pub use response::QueryResponse;
