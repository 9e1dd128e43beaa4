//! Active multi-tag filter
//!
//! A document is visible iff it carries every tag in the set (logical AND).
//! An empty set matches everything.

use crate::models::Document;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    tags: BTreeSet<String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tag` if absent, remove it if present.
    ///
    /// Returns true when the tag is a member afterwards.
    pub fn toggle(&mut self, tag: &str) -> bool {
        if self.tags.remove(tag) {
            false
        } else {
            self.tags.insert(tag.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Member tags in stable (sorted) display order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.tags.iter().all(|t| document.has_tag(t))
    }

    /// Documents passing the filter, in input order
    pub fn visible_documents<'a>(&self, all: &'a [Document]) -> Vec<&'a Document> {
        all.iter().filter(|d| self.matches(d)).collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for FilterSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }
}
