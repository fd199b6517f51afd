use crate::{
    Error, Result,
    common::key::{self, KeyModel},
};

use indexmap::{IndexMap, map};
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// Declared type of a model property.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum AttributeType {
    /// `string`
    #[default]
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `date`, stored as epoch milliseconds.
    Date,
    /// Anything else (`object`, `array`, `any`, ...).
    Other,
}

impl AttributeType {
    fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            _ => Self::Other,
        }
    }

    /// Whether key values of this type travel as numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Date)
    }
}

impl<'de> Deserialize<'de> for AttributeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Role of a property in the table key.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Table hash key.
    Hash,
    /// Table range key.
    Range,
    /// Composite primary key joining hash and range.
    Pk,
}

/// Global index options.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalIndexDefinition {
    /// Range attribute of the index.
    pub range_key: Option<String>,
}

/// Secondary indexes declared on a property.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexSpecification {
    /// Local index ranged on the property; its options are not used.
    pub local: Option<Value>,
    /// Global index hashed on the property.
    pub global: Option<GlobalIndexDefinition>,
}

/// `index` entry of a property.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum IndexDefinition {
    /// `index: true`, an ORM-level hint that creates no store index.
    Flag(bool),
    /// `index: {local: {...}, global: {...}}`
    Specification(IndexSpecification),
}

/// One property of a model definition.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyDefinition {
    /// Declared type.
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    /// Key role, if any.
    pub key_type: Option<KeyType>,
    /// Separator of a `pk` property.
    pub separator: Option<String>,
    /// Generate a UUID for this hash key on create.
    pub uuid: bool,
    /// Secondary indexes.
    pub index: Option<IndexDefinition>,
}

/// Model definition as handed over by the ORM.
///
/// ```rust
/// use dynamodb_connector::model::{Model, ModelDefinition};
/// use serde_json::json;
///
/// let definition: ModelDefinition = serde_json::from_value(json!({
///     "name": "User",
///     "properties": {
///         "id": {"type": "string", "keyType": "hash"},
///         "name": {"type": "string"},
///     },
/// }))
/// .unwrap();
/// let model = Model::try_from(definition).unwrap();
/// assert_eq!(model.table_name, "User");
/// assert_eq!(model.keys.hash_key, "id");
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ModelDefinition {
    /// Model name.
    pub name: String,
    /// Table name; defaults to the model name.
    #[serde(default)]
    pub table: Option<String>,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDefinition>,
}

/// A defined model.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Model name.
    pub name: String,
    /// Backing table.
    pub table_name: String,
    /// Key schema.
    pub keys: KeyModel,
    /// Declared type per property.
    pub attribute_types: IndexMap<String, AttributeType>,
    /// Generate a UUID for the hash key on create when none is supplied.
    pub hash_key_uuid: bool,
}

fn single(slot: &mut Option<String>, attribute: &str, role: &str) -> Result<()> {
    match slot {
        Some(existing) => Err(Error::Configuration(format!(
            "{role} declared on both `{existing}` and `{attribute}`"
        ))),
        None => {
            *slot = Some(attribute.to_string());
            Ok(())
        }
    }
}

impl TryFrom<ModelDefinition> for Model {
    type Error = Error;

    fn try_from(definition: ModelDefinition) -> Result<Self> {
        let mut hash_key = None;
        let mut range_key = None;
        let mut primary_key = None;
        let mut separator = None;
        let mut hash_key_uuid = false;
        let mut local_indexes = Vec::new();
        let mut global_indexes = Vec::new();
        let mut attribute_types = IndexMap::with_capacity(definition.properties.len());

        for (attribute, property) in &definition.properties {
            attribute_types.insert(attribute.clone(), property.attribute_type);
            match property.key_type {
                Some(KeyType::Hash) => {
                    single(&mut hash_key, attribute, "hash key")?;
                    if property.uuid {
                        if attribute != key::COMPOSITE_KEY_NAME {
                            return Err(Error::Configuration(format!(
                                "UUID generation is only allowed for attribute name `{}`, got `{attribute}`",
                                key::COMPOSITE_KEY_NAME
                            )));
                        }
                        hash_key_uuid = true;
                    }
                }
                Some(KeyType::Range) => single(&mut range_key, attribute, "range key")?,
                Some(KeyType::Pk) => {
                    single(&mut primary_key, attribute, "primary key")?;
                    separator = property.separator.clone();
                }
                None => {}
            }
            if let Some(IndexDefinition::Specification(index)) = &property.index {
                if index.local.is_some() {
                    local_indexes.push(attribute.clone());
                }
                if let Some(global) = &index.global {
                    global_indexes.push((attribute.clone(), global.range_key.clone()));
                }
            }
        }

        if let Some(primary_key) = &primary_key {
            if range_key.is_none() {
                return Err(Error::Configuration(format!(
                    "primary key `{primary_key}` is declared, but no range key"
                )));
            }
            if primary_key != key::COMPOSITE_KEY_NAME {
                return Err(Error::Configuration(format!(
                    "primary key must be named `{}`, got `{primary_key}`",
                    key::COMPOSITE_KEY_NAME
                )));
            }
        }
        if range_key.is_some() && primary_key.is_none() {
            return Err(Error::Configuration(
                "range key is present, but primary key not specified in schema".to_string(),
            ));
        }

        let hash_key = match hash_key {
            Some(hash_key) => hash_key,
            None => match definition.properties.get(key::COMPOSITE_KEY_NAME) {
                Some(_) if primary_key.is_some() => {
                    return Err(Error::Configuration(
                        "range key is present, but no hash key".to_string(),
                    ));
                }
                Some(id) => {
                    hash_key_uuid = id.uuid;
                    key::COMPOSITE_KEY_NAME.to_string()
                }
                None => {
                    hash_key_uuid = true;
                    attribute_types.insert(key::COMPOSITE_KEY_NAME.to_string(), AttributeType::String);
                    key::COMPOSITE_KEY_NAME.to_string()
                }
            },
        };

        let mut keys = KeyModel::new(hash_key);
        if let Some(range_key) = range_key {
            let separator = separator.unwrap_or_else(|| key::DEFAULT_SEPARATOR.to_string());
            keys = keys.with_range_key(range_key, separator);
        }
        for attribute in local_indexes {
            keys = keys.with_local_index(attribute);
        }
        for (attribute, range) in global_indexes {
            keys = keys.with_global_index(attribute, range);
        }
        keys.validate()?;

        let table_name = definition.table.unwrap_or_else(|| definition.name.clone());
        debug!(model = %definition.name, table = %table_name, hash_key = %keys.hash_key, "model defined");
        Ok(Self {
            name: definition.name,
            table_name,
            keys,
            attribute_types,
            hash_key_uuid,
        })
    }
}

impl Model {
    /// Declared type of `attribute`, `Other` when undeclared.
    pub fn attribute_type(&self, attribute: &str) -> AttributeType {
        self.attribute_types
            .get(attribute)
            .copied()
            .unwrap_or(AttributeType::Other)
    }

    /// Convert one textual key part to the value stored under `attribute`.
    pub fn key_value(&self, attribute: &str, text: &str) -> Result<Value> {
        if !self.attribute_type(attribute).is_numeric() {
            return Ok(Value::String(text.to_string()));
        }
        let text = text.trim();
        if let Ok(integer) = text.parse::<i64>() {
            return Ok(Value::from(integer));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| {
                Error::Validation(format!("key `{attribute}` expects a number, got `{text}`"))
            })
    }
}

/// Models defined on one adapter.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    models: IndexMap<String, Model>,
}

impl Registry {
    /// Validate and register a model, replacing any earlier model with the same name.
    pub fn define(&mut self, definition: ModelDefinition) -> Result<&Model> {
        let model = Model::try_from(definition)?;
        let model = match self.models.entry(model.name.clone()) {
            map::Entry::Occupied(mut entry) => {
                entry.insert(model);
                entry.into_mut()
            }
            map::Entry::Vacant(entry) => entry.insert(model),
        };
        Ok(model)
    }

    /// Look up a defined model.
    pub fn get(&self, name: &str) -> Result<&Model> {
        self.models
            .get(name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    /// Names of the defined models in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Number of defined models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model is defined.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
