//! # tagmatch Storage
//!
//! Loads the product catalog snapshot once at startup. The catalog is
//! never written back; a changed snapshot requires a restart.

pub mod snapshot;

pub use snapshot::{
    catalog_from_slice, load_catalog, load_catalog_from_path, load_catalog_with_timeout,
    CatalogSource, DEFAULT_DOWNLOAD_TIMEOUT,
};
