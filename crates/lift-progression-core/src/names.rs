//! Distinct lifter names plus a fuzzy index over the same set.

use std::fmt;

use crate::fuzzy::{EditDistanceMatcher, FuzzyIndex, FuzzyMatcher, NameMatch};
use crate::models::LifterRecord;

/// Sorted, duplicate-free display names and a fuzzy index over them.
///
/// Immutable once built. A changed record sequence means building a new
/// index (see [`Dataset`](crate::dataset::Dataset)), never patching this one.
pub struct NameIndex {
    names: Vec<String>,
    fuzzy: Box<dyn FuzzyIndex>,
}

impl NameIndex {
    /// Build with the default [`EditDistanceMatcher`].
    pub fn build(records: &[LifterRecord]) -> Self {
        Self::build_with(records, &EditDistanceMatcher::default())
    }

    /// Build with a caller-supplied matcher.
    pub fn build_with(records: &[LifterRecord], matcher: &dyn FuzzyMatcher) -> Self {
        let mut names: Vec<String> = records
            .iter()
            .filter(|r| !r.name.is_empty())
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        names.dedup();

        let fuzzy = matcher.build(&names);
        Self { names, fuzzy }
    }

    /// Every distinct non-empty name, sorted.
    pub fn list_names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names
            .binary_search_by(|n| n.as_str().cmp(name))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All names above the similarity threshold, best first.
    pub fn search(&self, query: &str) -> Vec<String> {
        self.search_scored(query, usize::MAX)
            .into_iter()
            .map(|m| m.name)
            .collect()
    }

    /// Up to `limit` scored matches, best first.
    pub fn search_scored(&self, query: &str, limit: usize) -> Vec<NameMatch> {
        self.fuzzy.search(query, limit)
    }
}

impl fmt::Debug for NameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameIndex")
            .field("names", &self.names.len())
            .field("indexed", &self.fuzzy.len())
            .finish()
    }
}
