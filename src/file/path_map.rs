//! URL prefix → backing path mapping.
//!
//! # Design Decisions
//! - Compiled once, immutable afterwards
//! - Longest prefix wins; equal lengths fall back to lexicographic order
//! - Plain string prefix semantics: `/css` also matches `/cssx`

use std::collections::HashMap;

/// Mapping between URL path prefixes (keys) and backing paths (values).
///
/// Backing paths are relative to the file source root.
pub type PathMap = HashMap<String, String>;

/// Compiled prefix table.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    /// Sorted most specific first.
    entries: Vec<(String, String)>,
}

impl PathMapper {
    pub fn new<I, K, V>(map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries: Vec<(String, String)> = map
            .into_iter()
            .map(|(from, to)| (from.into(), to.into()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        // Unique keys are only guaranteed for map inputs.
        entries.dedup_by(|later, earlier| later.0 == earlier.0);
        Self { entries }
    }

    /// Resolve `path` against the most specific matching prefix.
    pub fn matches(&self, path: &str) -> Option<String> {
        self.entries.iter().find_map(|(from, to)| {
            path.strip_prefix(from.as_str())
                .map(|rest| format!("{to}{rest}"))
        })
    }

    /// Prefixes in match order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(from, _)| from.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
