use crate::{Error, Result};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use serde::Serialize;
use serde_dynamo::to_attribute_value;
use std::collections;

/// Separator joining hash and range values when a model does not choose one.
pub const DEFAULT_SEPARATOR: &str = "--x--";

/// Name the composite primary key must carry.
pub const COMPOSITE_KEY_NAME: &str = "id";

/// Key component.
///
/// ```rust
/// use dynamodb_connector::common::key;
///
/// let key = key::Key {
///     name: "id".to_string(),
///     value: "1".to_string(),
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Key<T> {
    /// The attribute name of the key.
    pub name: String,
    /// The value of the key.
    pub value: T,
}

/// Table key of one record (hash key and optional range key).
///
/// ```rust
/// use dynamodb_connector::common::key;
///
/// let keys = key::Keys {
///     partition_key: key::Key {
///         name: "id".to_string(),
///         value: "1".to_string(),
///     },
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keys<T> {
    /// The hash key (required).
    pub partition_key: Key<T>,
    /// The range key (only for tables with a range key).
    pub sort_key: Option<Key<T>>,
}

impl<T: Serialize> TryFrom<Keys<T>> for collections::HashMap<String, types::AttributeValue> {
    type Error = Error;

    fn try_from(key: Keys<T>) -> Result<Self> {
        let partition_key_value = to_attribute_value(key.partition_key.value)?;
        let mut keys = Self::from([(key.partition_key.name, partition_key_value)]);
        if let Some(sort_key) = key.sort_key {
            let sort_key_value = to_attribute_value(sort_key.value)?;
            keys.insert(sort_key.name, sort_key_value);
        }
        Ok(keys)
    }
}

/// Synthesized primary key joining the hash and range values.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeKey {
    /// Attribute holding the joined value; always `id`.
    pub name: String,
    /// Text placed between the hash and range values.
    pub separator: String,
}

/// Key attributes of a secondary index.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexKey {
    /// Hash attribute of the index.
    pub hash: String,
    /// Range attribute of the index, if any.
    pub range: Option<String>,
    /// Index name sent as `IndexName`.
    pub index_name: String,
}

/// One key schema a query can target: the table itself or one of its indexes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeySchema<'a> {
    /// `None` for the table, otherwise the index name.
    pub index_name: Option<&'a str>,
    /// Hash attribute.
    pub hash: &'a str,
    /// Range attribute.
    pub range: Option<&'a str>,
}

/// Static key description of a model.
///
/// Local and global indexes are keyed by the attribute that declared them and keep
/// their definition order, which is the order key schemas are tried in.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyModel {
    /// Table hash key.
    pub hash_key: String,
    /// Table range key.
    pub range_key: Option<String>,
    /// Composite primary key; required when `range_key` is set.
    pub composite_key: Option<CompositeKey>,
    /// Local secondary indexes.
    pub local_indexes: IndexMap<String, IndexKey>,
    /// Global secondary indexes.
    pub global_indexes: IndexMap<String, IndexKey>,
}

impl KeyModel {
    /// Key model with only a hash key.
    pub fn new(hash_key: impl Into<String>) -> Self {
        Self {
            hash_key: hash_key.into(),
            range_key: None,
            composite_key: None,
            local_indexes: IndexMap::new(),
            global_indexes: IndexMap::new(),
        }
    }

    /// Add a range key and the composite `id` key with the given separator.
    pub fn with_range_key(mut self, range_key: impl Into<String>, separator: impl Into<String>) -> Self {
        self.range_key = Some(range_key.into());
        self.composite_key = Some(CompositeKey {
            name: COMPOSITE_KEY_NAME.to_string(),
            separator: separator.into(),
        });
        self
    }

    /// Add a local secondary index ranged on `attribute`.
    pub fn with_local_index(mut self, attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        let index = IndexKey {
            hash: self.hash_key.clone(),
            range: Some(attribute.clone()),
            index_name: format!("{attribute}LocalIndex"),
        };
        self.local_indexes.insert(attribute, index);
        self
    }

    /// Add a global secondary index hashed on `attribute`.
    pub fn with_global_index(mut self, attribute: impl Into<String>, range: Option<String>) -> Self {
        let attribute = attribute.into();
        let index = IndexKey {
            hash: attribute.clone(),
            range,
            index_name: format!("{attribute}GlobalIndex"),
        };
        self.global_indexes.insert(attribute, index);
        self
    }

    /// Check the range-key invariant.
    pub fn validate(&self) -> Result<()> {
        match (&self.range_key, &self.composite_key) {
            (Some(_), None) => Err(Error::Configuration(
                "range key is present, but primary key not specified in schema".to_string(),
            )),
            (Some(_), Some(composite)) if composite.name != COMPOSITE_KEY_NAME => {
                Err(Error::Configuration(format!(
                    "primary key must be named `{COMPOSITE_KEY_NAME}`, got `{}`",
                    composite.name
                )))
            }
            _ => Ok(()),
        }
    }

    /// Key schemas in lookup order: the table, local indexes, then global indexes.
    pub fn key_schemas(&self) -> impl Iterator<Item = KeySchema<'_>> {
        let table = KeySchema {
            index_name: None,
            hash: &self.hash_key,
            range: self.range_key.as_deref(),
        };
        let indexes = self
            .local_indexes
            .values()
            .chain(self.global_indexes.values())
            .map(|index| KeySchema {
                index_name: Some(&index.index_name),
                hash: &index.hash,
                range: index.range.as_deref(),
            });
        std::iter::once(table).chain(indexes)
    }

    /// Whether `attribute` is the hash side of the table or of an index.
    pub fn is_hash_attribute(&self, attribute: &str) -> bool {
        self.key_schemas().any(|schema| schema.hash == attribute)
    }

    /// Attribute records are ordered by when the filter names none.
    pub fn default_order_field(&self) -> &str {
        match (&self.range_key, &self.composite_key) {
            (Some(_), Some(composite)) => &composite.name,
            _ => &self.hash_key,
        }
    }

    /// Join hash and range values into the composite id.
    pub fn compose_id(&self, hash: &types::AttributeValue, range: &types::AttributeValue) -> Result<Option<String>> {
        let Some(composite) = &self.composite_key else {
            return Ok(None);
        };
        let hash = key_text(&self.hash_key, hash)?;
        let range_key = self.range_key.as_deref().unwrap_or_default();
        let range = key_text(range_key, range)?;
        Ok(Some(format!("{hash}{}{range}", composite.separator)))
    }

    /// Split a composite id into its hash and range parts.
    pub fn split_id<'a>(&self, id: &'a str) -> Result<(&'a str, &'a str)> {
        let separator = self
            .composite_key
            .as_ref()
            .map_or(DEFAULT_SEPARATOR, |composite| composite.separator.as_str());
        id.split_once(separator).ok_or_else(|| {
            Error::Validation(format!(
                "primary key `{id}` does not contain separator `{separator}`"
            ))
        })
    }
}

/// Text form of a scalar key value.
pub(crate) fn key_text(name: &str, value: &types::AttributeValue) -> Result<String> {
    match value {
        types::AttributeValue::S(text) => Ok(text.clone()),
        types::AttributeValue::N(number) => Ok(number.clone()),
        types::AttributeValue::Bool(flag) => Ok(flag.to_string()),
        _ => Err(Error::Validation(format!(
            "key `{name}` must be a string, number or boolean"
        ))),
    }
}
