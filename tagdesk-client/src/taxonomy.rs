//! Canonical tag taxonomy and custom tag derivation

use crate::models::{Document, TagGroup};
use std::collections::HashSet;

/// Read-only view of the backend taxonomy
///
/// Replaced wholesale whenever the taxonomy is re-fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyIndex {
    groups: Vec<TagGroup>,
    known: HashSet<String>,
}

impl TaxonomyIndex {
    pub fn new(groups: Vec<TagGroup>) -> Self {
        let known = groups
            .iter()
            .flat_map(|g| g.tags.iter().cloned())
            .collect();
        Self { groups, known }
    }

    /// Groups in backend order
    pub fn groups(&self) -> &[TagGroup] {
        &self.groups
    }

    /// Union of all group tags
    pub fn known_tags(&self) -> &HashSet<String> {
        &self.known
    }

    pub fn is_known(&self, tag: &str) -> bool {
        self.known.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Taxonomy tags in order of first appearance across groups
    pub fn ordered_tags(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.groups
            .iter()
            .flat_map(|g| g.tags.iter())
            .filter(|t| seen.insert(t.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Tags used by any document but absent from the taxonomy,
    /// de-duplicated in first-seen order over `documents`
    pub fn custom_tags(&self, documents: &[Document]) -> Vec<String> {
        let mut seen = HashSet::new();
        documents
            .iter()
            .flat_map(|d| d.tags.iter())
            .filter(|t| !self.is_known(t))
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect()
    }
}
