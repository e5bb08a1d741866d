//! Tag-overlap scoring
//!
//! A product's score against a query is the sum of the product's own
//! confidences for every query tag name it carries, divided by
//! [`QUERY_TAG_LIMIT`] and rounded to two decimals.

use tagmatch_core::{round2, Tag, TagIndex, QUERY_TAG_LIMIT};

/// Score a product tag-set against a query tag-set.
///
/// Only query tag *names* are used; the values summed are the product's
/// confidences, so the function is not symmetric. Duplicate names in
/// `product_tags` resolve to their last occurrence.
///
/// # Returns
/// `0.0` when either side is empty. With at most five query tags and
/// confidences in `[0, 100]` the score stays in `[0, 100]`.
pub fn score(query_tags: &[Tag], product_tags: &[Tag]) -> f64 {
    score_indexed(query_tags, &TagIndex::from_tags(product_tags))
}

/// Same as [`score`] against a prebuilt product index.
#[inline]
pub fn score_indexed(query_tags: &[Tag], product_index: &TagIndex) -> f64 {
    round2(product_index.overlap(query_tags) / QUERY_TAG_LIMIT as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, f64)]) -> Vec<Tag> {
        pairs.iter().map(|(n, c)| Tag::new(*n, *c)).collect()
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        let query = tags(&[("cat", 99.0), ("pet", 50.0)]);
        assert_eq!(score(&query, &[]), 0.0);
        assert_eq!(score(&[], &tags(&[("cat", 80.0)])), 0.0);
        assert_eq!(score(&[], &[]), 0.0);
    }

    #[test]
    fn test_uses_product_confidence_not_query() {
        let query = tags(&[("cat", 99.0)]);
        let product = tags(&[("cat", 80.0), ("dog", 10.0)]);
        assert_eq!(score(&query, &product), 16.0);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let query = tags(&[("red", 100.0)]);
        let product = tags(&[("red", 10.0), ("red", 90.0)]);
        assert_eq!(score(&query, &product), 18.0);
    }

    #[test]
    fn test_asymmetric() {
        let a = tags(&[("cat", 90.0), ("dog", 20.0)]);
        let b = tags(&[("cat", 40.0)]);
        assert_eq!(score(&a, &b), 8.0);
        assert_eq!(score(&b, &a), 18.0);
    }

    #[test]
    fn test_fixed_normalization_not_query_size() {
        // One matching tag at full confidence is still divided by five
        let query = tags(&[("cat", 100.0)]);
        let product = tags(&[("cat", 100.0)]);
        assert_eq!(score(&query, &product), 20.0);
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        let query = tags(&[("a", 1.0), ("b", 1.0)]);
        let product = tags(&[("a", 33.337), ("b", 0.0)]);
        assert_eq!(score(&query, &product), 6.67);
    }

    #[test]
    fn test_rounding_follows_decimal_value() {
        let query = tags(&[("a", 1.0)]);
        assert_eq!(score(&query, &tags(&[("a", 30.525)])), 6.1);
        assert_eq!(score(&query, &tags(&[("a", 40.675)])), 8.13);
        assert_eq!(score(&query, &tags(&[("a", 0.625)])), 0.12);
    }

    #[test]
    fn test_bounded_for_full_confidence_query() {
        let names = ["a", "b", "c", "d", "e"];
        let query: Vec<Tag> = names.iter().map(|n| Tag::new(*n, 50.0)).collect();
        let product: Vec<Tag> = names.iter().map(|n| Tag::new(*n, 100.0)).collect();
        assert_eq!(score(&query, &product), 100.0);

        for take in 0..=names.len() {
            let s = score(&query[..take], &product);
            assert!((0.0..=100.0).contains(&s), "score {} out of range", s);
            assert!(s <= take as f64 * 100.0 / 5.0);
        }
    }

    #[test]
    fn test_more_than_five_query_tags_exceed_scale() {
        let names = ["a", "b", "c", "d", "e", "f"];
        let query: Vec<Tag> = names.iter().map(|n| Tag::new(*n, 1.0)).collect();
        let product: Vec<Tag> = names.iter().map(|n| Tag::new(*n, 100.0)).collect();
        assert_eq!(score(&query, &product), 120.0);
    }

    #[test]
    fn test_indexed_matches_plain() {
        let query = tags(&[("cat", 99.0), ("toy", 40.0), ("fur", 30.0)]);
        let product = tags(&[("toy", 12.5), ("cat", 61.25), ("toy", 47.0)]);
        assert_eq!(
            score(&query, &product),
            score_indexed(&query, &TagIndex::from_tags(&product))
        );
    }
}
