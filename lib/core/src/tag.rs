//! Tags and tag lookup
//!
//! A tag is a `(name, confidence)` pair as reported by the tagging service.
//! Tag-sets are plain ordered slices; [`TagIndex`] turns one into a
//! name → confidence table where the last occurrence of a name wins.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Maximum number of tags taken from the tagging service for a query.
///
/// Scores are normalized by this constant, not by the actual query size.
/// An extractor returning more tags than this raises the score ceiling
/// above the confidence scale.
pub const QUERY_TAG_LIMIT: usize = 5;

/// A single descriptive tag with the confidence reported for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name, serialized as `tag`
    #[serde(rename = "tag")]
    pub name: String,
    /// Source-reported confidence, conventionally in `[0, 100]`
    pub confidence: f64,
}

impl Tag {
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// Round a value to two decimal places.
///
/// Rounding is decided on the exact decimal expansion of `value`, so
/// `6.1049999999999995` gives `6.1` even though `value * 100.0` lands on
/// `610.5`. Exact ties go to the even digit.
#[inline]
#[must_use]
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Name → confidence lookup built from a tag-set
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    confidences: AHashMap<String, f64>,
}

impl TagIndex {
    /// Build the lookup in tag order; later duplicates overwrite earlier ones.
    pub fn from_tags(tags: &[Tag]) -> Self {
        let mut confidences = AHashMap::with_capacity(tags.len());
        for tag in tags {
            confidences.insert(tag.name.clone(), tag.confidence);
        }
        Self { confidences }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.confidences.get(name).copied()
    }

    /// Sum of the indexed confidences for every query tag name.
    /// Names missing from the index contribute zero.
    pub fn overlap(&self, query: &[Tag]) -> f64 {
        query
            .iter()
            .map(|tag| self.get(&tag.name).unwrap_or(0.0))
            .sum()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.confidences.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.confidences.is_empty()
    }
}
