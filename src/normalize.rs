//! Response normalization: strips backend-specific artifacts so every backend's
//! reply has the same shape.

use crate::drivers::AdapterReply;
use crate::types::Backend;
use once_cell::sync::Lazy;
use regex::Regex;

// Runs of numeric markers such as `[1]` or `[2][12]`. A run that opens a line
// takes the blanks after it; anywhere else it takes the blanks before it.
static CITATION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:\[\d+\])+[ \t]*|[ \t]*(?:\[\d+\])+")
        .expect("citation pattern is a valid regex")
});

/// Remove numbered citation markers from prose.
///
/// Bracketed text that is not purely numeric (`[note]`, `[a1]`) is left alone,
/// as is whitespace that does not touch a marker.
pub fn strip_citation_markers(content: &str) -> String {
    CITATION_MARKER.replace_all(content, "").into_owned()
}

/// Normalized content and citations for a reply from `backend`.
///
/// Only backends that embed markers are rewritten; the citation list itself is
/// carried through untouched. An empty citation list becomes `None`.
pub fn normalize_reply(backend: Backend, reply: AdapterReply) -> (String, Option<Vec<String>>) {
    let content = if backend.embeds_citations() {
        strip_citation_markers(&reply.content)
    } else {
        reply.content
    };
    let citations = reply.citations.filter(|c| !c.is_empty());
    (content, citations)
}
