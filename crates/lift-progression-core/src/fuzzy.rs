//! Fuzzy name matching behind a swappable interface.
//!
//! [`FuzzyMatcher`] builds a [`FuzzyIndex`] over a name set; callers only
//! ever see ranked [`NameMatch`]es, so the algorithm can be replaced
//! (trigram, phonetic, ...) without touching the name index or the query
//! layer.
//!
//! # Default scoring ([`EditDistanceMatcher`])
//!
//! Query and candidate are both compared in [`normalize_name`] form, so
//! case and punctuation never matter. The score in `[0.0, 1.0]` is the
//! maximum of:
//!
//! 1. full-string normalized Damerau–Levenshtein similarity,
//! 2. the same on whitespace tokens sorted alphabetically, × 0.95
//!    (`"doe john"` ~ `"john doe"`),
//! 3. the best similarity between the query and any run of consecutive
//!    candidate words with the same word count as the query, × 0.9
//!    (`"john"` ~ `"john doe"`).
//!
//! Candidates scoring below the threshold are dropped entirely; a score
//! equal to the threshold is kept. Ties are broken by display name, so
//! results are deterministic.

use serde::Serialize;
use strsim::normalized_damerau_levenshtein;

use crate::coerce::normalize_name;

/// Default similarity cutoff.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

const TOKEN_SORT_WEIGHT: f64 = 0.95;
const PARTIAL_WEIGHT: f64 = 0.9;

/// One ranked match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameMatch {
    pub name: String,
    /// Similarity in `[0.0, 1.0]`.
    pub score: f64,
}

/// A searchable index over a fixed name set.
pub trait FuzzyIndex: Send + Sync {
    /// Ranked matches for `query`, best first, at most `limit` entries.
    ///
    /// An empty query returns no matches.
    fn search(&self, query: &str, limit: usize) -> Vec<NameMatch>;

    /// Number of names in the index.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds a [`FuzzyIndex`] for a name set.
pub trait FuzzyMatcher: Send + Sync {
    fn build(&self, names: &[String]) -> Box<dyn FuzzyIndex>;
}

/// Edit-distance matcher with a single similarity threshold.
#[derive(Debug, Clone, Copy)]
pub struct EditDistanceMatcher {
    threshold: f64,
}

impl EditDistanceMatcher {
    /// `threshold` is clamped to `[0.0, 1.0]`.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for EditDistanceMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl FuzzyMatcher for EditDistanceMatcher {
    fn build(&self, names: &[String]) -> Box<dyn FuzzyIndex> {
        let entries = names
            .iter()
            .map(|name| Entry::new(name))
            .filter(|e| !e.key.is_empty())
            .collect();
        Box::new(EditDistanceIndex {
            entries,
            threshold: self.threshold,
        })
    }
}

struct Entry {
    display: String,
    key: String,
    tokens: Vec<String>,
    sorted: String,
}

impl Entry {
    fn new(display: &str) -> Self {
        let key = normalize_name(display);
        let tokens: Vec<String> = key.split(' ').map(str::to_string).collect();
        let sorted = sorted_tokens(&tokens);
        Self {
            display: display.to_string(),
            key,
            tokens,
            sorted,
        }
    }
}

struct EditDistanceIndex {
    entries: Vec<Entry>,
    threshold: f64,
}

impl FuzzyIndex for EditDistanceIndex {
    fn search(&self, query: &str, limit: usize) -> Vec<NameMatch> {
        let query = Entry::new(query);
        if query.key.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut matches: Vec<NameMatch> = self
            .entries
            .iter()
            .filter_map(|candidate| {
                let score = similarity(&query, candidate);
                (score >= self.threshold).then(|| NameMatch {
                    name: candidate.display.clone(),
                    score,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        matches.truncate(limit);
        matches
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn sorted_tokens(tokens: &[String]) -> String {
    let mut sorted: Vec<&str> = tokens.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}

fn similarity(query: &Entry, candidate: &Entry) -> f64 {
    if query.key == candidate.key {
        return 1.0;
    }

    let full = normalized_damerau_levenshtein(&query.key, &candidate.key);
    let token_sort = normalized_damerau_levenshtein(&query.sorted, &candidate.sorted) * TOKEN_SORT_WEIGHT;

    let width = query.tokens.len();
    let partial = if width < candidate.tokens.len() {
        candidate
            .tokens
            .windows(width)
            .map(|w| normalized_damerau_levenshtein(&query.key, &w.join(" ")))
            .fold(0.0, f64::max)
            * PARTIAL_WEIGHT
    } else {
        0.0
    };

    full.max(token_sort).max(partial)
}

/// Score one query/candidate pair with the default algorithm.
pub fn score(query: &str, candidate: &str) -> f64 {
    let q = Entry::new(query);
    let c = Entry::new(candidate);
    if q.key.is_empty() || c.key.is_empty() {
        return 0.0;
    }
    similarity(&q, &c)
}
