//! HTTP plumbing shared by the concrete provider adapters.

mod http;

pub use http::{default_base_url, HttpTransport};
