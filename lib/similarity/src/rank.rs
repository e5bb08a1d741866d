//! Catalog ranking
//!
//! Scores every product against a query tag-set, drops products below the
//! threshold, sorts by score and truncates to the limit.

use crate::score::score_indexed;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Ordering;
use tagmatch_core::{Product, Tag};

/// Field added to each returned product
pub const SCORE_FIELD: &str = "similarity_score";

/// Default minimum score for a product to be returned
pub const DEFAULT_THRESHOLD: f64 = 30.0;

/// Default maximum number of returned products
pub const DEFAULT_LIMIT: i64 = 20;

/// Per-request ranking parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankParams {
    /// Minimum score (inclusive). Negative values are allowed.
    pub threshold: f64,
    /// Maximum number of results. Zero or negative yields no results.
    pub limit: i64,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl RankParams {
    pub fn new(threshold: f64, limit: i64) -> Self {
        Self { threshold, limit }
    }

    /// Effective truncation length
    #[inline]
    pub fn max_results(&self) -> usize {
        usize::try_from(self.limit).unwrap_or(0)
    }
}

/// A catalog product with the score it got for one request
#[derive(Debug, Clone, Copy)]
pub struct ScoredProduct<'a> {
    pub product: &'a Product,
    pub similarity_score: f64,
}

impl Serialize for ScoredProduct<'_> {
    /// Serializes as the product's own fields plus `similarity_score`,
    /// replacing any stored field of that name.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.product.fields();
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in fields.iter().filter(|(key, _)| key.as_str() != SCORE_FIELD) {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(SCORE_FIELD, &self.similarity_score)?;
        map.end()
    }
}

/// Rank catalog products by similarity to the query tags.
///
/// Products scoring below `params.threshold` are dropped. The rest are
/// sorted by score descending with a stable sort, so equal scores keep
/// their catalog order, then truncated to `params.limit`.
pub fn rank<'a>(
    query_tags: &[Tag],
    products: &'a [Product],
    params: &RankParams,
) -> Vec<ScoredProduct<'a>> {
    let max_results = params.max_results();
    if max_results == 0 {
        return Vec::new();
    }

    let mut results: Vec<ScoredProduct<'a>> = products
        .iter()
        .filter_map(|product| {
            let similarity_score = score_indexed(query_tags, product.tag_index());
            (similarity_score >= params.threshold).then_some(ScoredProduct {
                product,
                similarity_score,
            })
        })
        .collect();

    // Vec::sort_by is stable; 0.0 and -0.0 compare equal
    results.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(Ordering::Equal)
    });
    results.truncate(max_results);

    results
}
