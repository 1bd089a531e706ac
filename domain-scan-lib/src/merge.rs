//! Deduplicating merge of candidate sources.

use std::collections::HashSet;

/// Chains candidate sources in order and drops every value seen before.
///
/// Sources are consumed one after another, so the output order is the
/// strategy-selection order, and within a source its own order. A value
/// produced by an earlier source (or earlier by the same source) is never
/// emitted again.
pub struct Merger<I: Iterator<Item = String>> {
    inner: std::iter::Flatten<std::vec::IntoIter<I>>,
    seen: HashSet<String>,
    duplicates: usize,
}

impl<I: Iterator<Item = String>> Merger<I> {
    pub fn new(sources: Vec<I>) -> Self {
        Self {
            inner: sources.into_iter().flatten(),
            seen: HashSet::new(),
            duplicates: 0,
        }
    }

    /// Number of values dropped so far because they had already been emitted.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

impl<I: Iterator<Item = String>> Iterator for Merger<I> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for candidate in self.inner.by_ref() {
            if self.seen.insert(candidate.clone()) {
                return Some(candidate);
            }
            self.duplicates += 1;
        }
        None
    }
}
