//! Fuzzy name resolution against the institution and city catalogs
//!
//! Operators type catalog names free-hand into spreadsheets, so matching is
//! deliberately lenient: case and surrounding/internal whitespace are
//! ignored, and a partial or superset name still resolves. The tradeoff is
//! a possible false positive when one catalog name contains another; catalog
//! order breaks the tie.

use std::collections::HashMap;

use crate::api::models::CatalogEntry;

/// Normalize a free-text name for catalog matching
///
/// Lowercases, trims, and collapses internal whitespace runs to one space.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Pre-normalized catalog index, built once per import run
///
/// Equality hits go through the name map; otherwise a linear scan in
/// catalog order looks for a bidirectional substring match, first match
/// wins.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    by_name: HashMap<String, i64>,
    entries: Vec<(String, i64)>,
}

impl CatalogIndex {
    pub fn build(catalog: &[CatalogEntry]) -> Self {
        let mut by_name = HashMap::new();
        let mut entries = Vec::with_capacity(catalog.len());

        for entry in catalog {
            let normalized = normalize_name(&entry.name);
            if normalized.is_empty() {
                continue;
            }
            // First entry wins when two catalog names normalize identically.
            by_name.entry(normalized.clone()).or_insert(entry.id);
            entries.push((normalized, entry.id));
        }

        Self { by_name, entries }
    }

    /// Resolve a free-text name to a catalog id
    pub fn resolve(&self, raw: &str) -> Option<i64> {
        let needle = normalize_name(raw);
        if needle.is_empty() {
            return None;
        }

        if let Some(id) = self.by_name.get(&needle) {
            return Some(*id);
        }

        self.entries
            .iter()
            .find(|(name, _)| name.contains(&needle) || needle.contains(name.as_str()))
            .map(|(_, id)| *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
