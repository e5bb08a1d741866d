//! # tagmatch Core
//!
//! Core data model for tagmatch.
//!
//! - [`Tag`] - A `(name, confidence)` pair reported by the tagging service
//! - [`TagIndex`] - Name → confidence lookup where the last duplicate wins
//! - [`Product`] - A catalog entry: its raw JSON fields plus parsed tags
//! - [`Catalog`] - The immutable, ordered product collection
//!
//! ## Example
//!
//! ```rust
//! use tagmatch_core::{Catalog, Tag};
//! use serde_json::json;
//!
//! let catalog = Catalog::from_document(json!({
//!     "products": [
//!         {"id": 1, "imagga_tags": [{"tag": "cat", "confidence": 80.0}]}
//!     ]
//! }))
//! .unwrap();
//!
//! let query = vec![Tag::new("cat", 99.0)];
//! let product = &catalog.products()[0];
//! assert_eq!(product.tag_index().overlap(&query), 80.0);
//! ```

pub mod catalog;
pub mod error;
pub mod product;
pub mod tag;

pub use catalog::{Catalog, PRODUCTS_KEY};
pub use error::{Error, Result};
pub use product::{Product, TAGS_FIELD};
pub use tag::{round2, Tag, TagIndex, QUERY_TAG_LIMIT};
