//! Deterministic tag → color assignment
//!
//! Colors are derived from the taxonomy and the current document set only,
//! recomputed from scratch on every change. Same inputs, same colors.

use crate::models::{Document, TagGroup};
use crate::taxonomy::TaxonomyIndex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Display color class for a tag chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ColorToken(&'static str);

impl ColorToken {
    pub const fn new(class: &'static str) -> Self {
        Self(class)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Ordered palette cycled through by the assigner
pub const PALETTE: [ColorToken; 12] = [
    ColorToken::new("bg-blue-100 text-blue-800"),
    ColorToken::new("bg-green-100 text-green-800"),
    ColorToken::new("bg-yellow-100 text-yellow-800"),
    ColorToken::new("bg-purple-100 text-purple-800"),
    ColorToken::new("bg-pink-100 text-pink-800"),
    ColorToken::new("bg-indigo-100 text-indigo-800"),
    ColorToken::new("bg-red-100 text-red-800"),
    ColorToken::new("bg-orange-100 text-orange-800"),
    ColorToken::new("bg-teal-100 text-teal-800"),
    ColorToken::new("bg-cyan-100 text-cyan-800"),
    ColorToken::new("bg-lime-100 text-lime-800"),
    ColorToken::new("bg-amber-100 text-amber-800"),
];

/// Reserved token for override tags; never part of the palette
pub const NEUTRAL: ColorToken = ColorToken::new("bg-gray-100 text-gray-800");

/// Tags always shown in the neutral color. They do not consume a palette slot.
pub const NEUTRAL_OVERRIDES: [&str; 2] = ["Owner Issues", "Governance"];

/// Token used for tags missing from a map
pub const FALLBACK: ColorToken = PALETTE[0];

pub fn is_override(tag: &str) -> bool {
    NEUTRAL_OVERRIDES.contains(&tag)
}

/// Result of one color derivation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagColorMap {
    colors: HashMap<String, ColorToken>,
    /// Tags in assignment order
    order: Vec<String>,
}

impl TagColorMap {
    /// Color for `tag`, falling back to the first palette entry
    pub fn get(&self, tag: &str) -> ColorToken {
        self.colors.get(tag).copied().unwrap_or(FALLBACK)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.colors.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// (tag, color) pairs in assignment order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColorToken)> + '_ {
        self.order
            .iter()
            .map(move |t| (t.as_str(), self.colors[t.as_str()]))
    }

    fn place(&mut self, tag: &str, counter: &mut usize) {
        if self.colors.contains_key(tag) {
            return;
        }
        let token = if is_override(tag) {
            NEUTRAL
        } else {
            let token = PALETTE[*counter % PALETTE.len()];
            *counter += 1;
            token
        };
        self.colors.insert(tag.to_string(), token);
        self.order.push(tag.to_string());
    }
}

/// Assign colors to taxonomy tags, then to document tags outside the taxonomy.
///
/// Taxonomy tags are walked group by group in order; `document_tags` is walked
/// in the order given, so custom tags are colored in first-seen order and
/// continue the same palette counter.
pub fn assign<'a, I>(groups: &[TagGroup], document_tags: I) -> TagColorMap
where
    I: IntoIterator<Item = &'a str>,
{
    let mut map = TagColorMap::default();
    let mut counter = 0usize;

    for tag in groups.iter().flat_map(|g| g.tags.iter()) {
        map.place(tag, &mut counter);
    }
    for tag in document_tags {
        map.place(tag, &mut counter);
    }

    map
}

/// Color map for a taxonomy and the documents currently loaded
pub fn assign_for(taxonomy: &TaxonomyIndex, documents: &[Document]) -> TagColorMap {
    assign(
        taxonomy.groups(),
        documents.iter().flat_map(|d| d.tags.iter().map(String::as_str)),
    )
}
