//! # tagmatch
//!
//! Match an image against a catalog of pre-tagged products.
//!
//! The image (an upload or a URL) is tagged by the Imagga API, and every
//! catalog product is scored by how many of the image's top tags it carries
//! and with what confidence. Products above a threshold are returned best
//! first.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! export IMAGGA_API_KEY=... IMAGGA_API_SECRET=...
//! tagmatch --catalog products.json --port 5000
//! curl -F image=@shoe.jpg 'http://localhost:5000/api/match?threshold=20&limit=10'
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use tagmatch::prelude::*;
//! use serde_json::json;
//!
//! let catalog = Catalog::from_document(json!({
//!     "products": [
//!         {"id": 1, "imagga_tags": [{"tag": "cat", "confidence": 80}, {"tag": "dog", "confidence": 10}]},
//!         {"id": 2, "imagga_tags": [{"tag": "cat", "confidence": 40}]}
//!     ]
//! }))
//! .unwrap();
//!
//! let query = vec![Tag::new("cat", 99.0)];
//! let matches = rank(&query, catalog.products(), &RankParams::new(0.0, 20));
//! assert_eq!(matches[0].similarity_score, 16.0);
//! ```
//!
//! ## Crate Structure
//!
//! - `tagmatch-core` - Tags, tag indexes, products and the catalog
//! - `tagmatch-similarity` - Scoring and ranking
//! - `tagmatch-storage` - Catalog snapshot loading
//! - `tagmatch-api` - Imagga client, image input handling, REST API

// Re-export core types
pub use tagmatch_core::{Catalog, Error, Product, Result, Tag, TagIndex, QUERY_TAG_LIMIT};

// Re-export the similarity engine
pub use tagmatch_similarity::{rank, score, RankParams, ScoredProduct};

// Re-export storage
pub use tagmatch_storage::{load_catalog, load_catalog_from_path, CatalogSource};

// Re-export API
pub use tagmatch_api::{ApiError, ImaggaTagger, Matcher, RestApi, Tagger};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_catalog, load_catalog_from_path, rank, score, ApiError, Catalog, CatalogSource,
        Error, ImaggaTagger, Matcher, Product, RankParams, RestApi, Result, ScoredProduct, Tag,
        TagIndex, Tagger, QUERY_TAG_LIMIT,
    };
}
