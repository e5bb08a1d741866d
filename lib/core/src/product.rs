use crate::error::{Error, Result};
use crate::tag::{Tag, TagIndex};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Field holding the precomputed tag-set of a catalog product
pub const TAGS_FIELD: &str = "imagga_tags";

/// A catalog product: its raw JSON fields plus the parsed tag-set
#[derive(Debug, Clone)]
pub struct Product {
    fields: Map<String, Value>,
    tags: Vec<Tag>,
    index: TagIndex,
}

impl Product {
    /// Build a product from its raw fields and an already parsed tag-set.
    pub fn new(fields: Map<String, Value>, tags: Vec<Tag>) -> Self {
        let index = TagIndex::from_tags(&tags);
        Self { fields, tags, index }
    }

    /// Parse a product from a catalog JSON value.
    ///
    /// A missing or `null` tag field is an empty tag-set; anything else in
    /// that field must be an array of `{tag, confidence}` objects.
    pub fn from_value(index: usize, value: Value) -> Result<Self> {
        let fields = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidProduct {
                    index,
                    reason: format!("expected an object, got {}", json_kind(&other)),
                })
            }
        };

        let tags = match fields.get(TAGS_FIELD) {
            None | Some(Value::Null) => Vec::new(),
            Some(raw) => Vec::<Tag>::deserialize(raw).map_err(|e| Error::InvalidProduct {
                index,
                reason: format!("malformed {}: {}", TAGS_FIELD, e),
            })?,
        };

        Ok(Self::new(fields, tags))
    }

    /// All raw fields, including the tag field
    #[inline]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[inline]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[inline]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Lookup table over [`Product::tags`], built once at construction
    #[inline]
    pub fn tag_index(&self) -> &TagIndex {
        &self.index
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
