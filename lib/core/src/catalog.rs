use crate::error::{Error, Result};
use crate::product::Product;
use serde_json::Value;

/// Top-level key holding the product array in a catalog document
pub const PRODUCTS_KEY: &str = "products";

/// Immutable, ordered collection of catalog products.
///
/// Built once at startup and shared read-only between requests, usually
/// behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Build a catalog from a parsed catalog document.
    ///
    /// A document without a `products` key is an empty catalog.
    pub fn from_document(document: Value) -> Result<Self> {
        let mut document = match document {
            Value::Object(map) => map,
            _ => {
                return Err(Error::CatalogLoad(
                    "catalog document must be a JSON object".to_string(),
                ))
            }
        };

        let products = match document.remove(PRODUCTS_KEY) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| Product::from_value(index, item))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(Error::CatalogLoad(format!(
                    "'{}' must be an array",
                    PRODUCTS_KEY
                )))
            }
        };

        Ok(Self::new(products))
    }

    #[inline]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
