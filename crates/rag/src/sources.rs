//! Source list construction.

use crate::types::{Passage, UNKNOWN_SOURCE};
use std::collections::HashSet;

/// Collapse passages into unique source identifiers, keeping the order of
/// first appearance so the most relevant document comes first.
pub fn dedupe_sources(passages: &[Passage]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for passage in passages {
        let source = passage.source.as_deref().unwrap_or(UNKNOWN_SOURCE);
        if seen.insert(source) {
            sources.push(source.to_string());
        }
    }

    sources
}
