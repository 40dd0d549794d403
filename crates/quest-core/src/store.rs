//! Deduplicated collection of crawled text snippets.
//!
//! The store is append-only in spirit: records are merged in, never mutated.
//! Link and query sets are derived views used by the crawler as its skip-list
//! and duplicate-query guard.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// Fragments at or below this many characters are treated as noise.
pub const MIN_FRAGMENT_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnippetRecord {
    pub text: String,
    pub link: Url,
    pub query: String,
}

impl SnippetRecord {
    /// Whether a page fragment is worth keeping as a record.
    pub fn is_useful_fragment(text: &str) -> bool {
        text.trim().chars().count() > MIN_FRAGMENT_CHARS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetStore {
    records: Vec<SnippetRecord>,
}

impl SnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SnippetRecord>) -> Self {
        let mut store = Self::new();
        store.merge(records);
        store
    }

    pub fn records(&self) -> &[SnippetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Set union by full-record equality. Duplicates are dropped silently;
    /// existing order is kept, incoming records keep first-seen order.
    /// Returns how many records were actually new.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = SnippetRecord>) -> usize {
        let mut seen: HashSet<SnippetRecord> = self.records.iter().cloned().collect();
        let mut added = 0usize;
        for record in incoming {
            if seen.insert(record.clone()) {
                self.records.push(record);
                added += 1;
            }
        }
        added
    }

    /// Distinct links across the whole store. A link recorded for *any*
    /// prior query is never re-fetched.
    pub fn links_already_seen(&self) -> BTreeSet<Url> {
        self.records.iter().map(|r| r.link.clone()).collect()
    }

    /// Distinct queries across the whole store, used to short-circuit a
    /// resubmitted query before any network call.
    pub fn queries_already_seen(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.query.clone()).collect()
    }

    pub fn has_query(&self, query: &str) -> bool {
        self.records.iter().any(|r| r.query == query)
    }

    /// Records tied to one originating query, in stored order.
    pub fn findings_for(&self, query: &str) -> Vec<&SnippetRecord> {
        self.records.iter().filter(|r| r.query == query).collect()
    }
}
