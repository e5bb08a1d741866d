//! # tagmatch Similarity
//!
//! Tag-overlap similarity engine: scores catalog products against the tags
//! extracted from a query image, then filters and ranks them.
//!
//! ## Example
//!
//! ```rust
//! use tagmatch_core::{Catalog, Tag};
//! use tagmatch_similarity::{rank, score, RankParams};
//! use serde_json::json;
//!
//! let query = vec![Tag::new("cat", 99.0)];
//! assert_eq!(score(&query, &[Tag::new("cat", 80.0), Tag::new("dog", 10.0)]), 16.0);
//!
//! let catalog = Catalog::from_document(json!({
//!     "products": [
//!         {"id": 1, "imagga_tags": [{"tag": "cat", "confidence": 80}]},
//!         {"id": 2, "imagga_tags": [{"tag": "cat", "confidence": 40}]}
//!     ]
//! }))
//! .unwrap();
//!
//! let matches = rank(&query, catalog.products(), &RankParams::new(10.0, 20));
//! assert_eq!(matches.len(), 1);
//! ```
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Query tags  │────>│    score    │────>│  threshold  │
//! │ (≤ 5 tags)  │     │ per product │     │   filter    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │  truncate   │<────│ stable sort │
//!                     │  to limit   │     │ score desc  │
//!                     └─────────────┘     └─────────────┘
//! ```

pub mod rank;
pub mod score;

pub use rank::{rank, RankParams, ScoredProduct, DEFAULT_LIMIT, DEFAULT_THRESHOLD, SCORE_FIELD};
pub use score::{score, score_indexed};
