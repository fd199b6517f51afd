use crate::{
    Error, Result,
    common::{
        Item,
        key::{Key, Keys},
    },
    model::Model,
};

use aws_sdk_dynamodb::types;
use serde_json::Value;
use uuid::Uuid;

fn is_null(value: &types::AttributeValue) -> bool {
    matches!(value, types::AttributeValue::Null(true))
}

/// Check the key attributes of a record about to be written and fill in derived keys.
///
/// A UUID is generated for the hash key when the model asks for one and the record
/// brings none. On composite models the joined id is stored under `id`. Returns the
/// record's public id: the composite id, or the hash value otherwise.
pub(crate) fn prepare_item(model: &Model, item: &mut Item) -> Result<types::AttributeValue> {
    let keys = &model.keys;
    if model.hash_key_uuid && item.get(&keys.hash_key).is_none_or(is_null) {
        let id = Uuid::new_v4().to_string();
        debug!(hash_key = %keys.hash_key, %id, "generated hash key");
        item.insert(keys.hash_key.clone(), types::AttributeValue::S(id));
    }
    let hash = match item.get(&keys.hash_key) {
        None => {
            return Err(Error::Validation(format!(
                "hash key `{}` is undefined",
                keys.hash_key
            )));
        }
        Some(value) if is_null(value) => {
            return Err(Error::Validation(format!(
                "hash key `{}` cannot be NULL",
                keys.hash_key
            )));
        }
        Some(value) => value,
    };
    let Some(range_key) = &keys.range_key else {
        return Ok(hash.clone());
    };
    let range = match item.get(range_key) {
        Some(value) if !is_null(value) => value,
        _ => {
            return Err(Error::Validation(format!(
                "range key `{range_key}` cannot be null or undefined"
            )));
        }
    };
    match (keys.compose_id(hash, range)?, &keys.composite_key) {
        (Some(id), Some(composite)) => {
            let id = types::AttributeValue::S(id);
            item.insert(composite.name.clone(), id.clone());
            Ok(id)
        }
        _ => Ok(hash.clone()),
    }
}

/// Table key addressed by a primary key as the ORM passes it around.
///
/// On composite models `pk` is `"<hash><separator><range>"`; key parts are turned
/// back into numbers when the attribute is declared `number` or `date`.
pub(crate) fn table_key(model: &Model, pk: &Value) -> Result<Item> {
    let keys = &model.keys;
    let key_value = |attribute: &str, value: &Value| match value {
        Value::String(text) => model.key_value(attribute, text),
        Value::Number(_) | Value::Bool(_) => Ok(value.clone()),
        _ => Err(Error::Validation(format!(
            "key `{attribute}` must be a string, number or boolean"
        ))),
    };
    let table_keys = match &keys.range_key {
        Some(range_key) => {
            let Value::String(pk) = pk else {
                return Err(Error::Validation(format!(
                    "primary key of `{}` must be a string",
                    model.name
                )));
            };
            let (hash, range) = keys.split_id(pk)?;
            Keys {
                partition_key: Key {
                    name: keys.hash_key.clone(),
                    value: model.key_value(&keys.hash_key, hash)?,
                },
                sort_key: Some(Key {
                    name: range_key.clone(),
                    value: model.key_value(range_key, range)?,
                }),
            }
        }
        None => Keys {
            partition_key: Key {
                name: keys.hash_key.clone(),
                value: key_value(&keys.hash_key, pk)?,
            },
            sort_key: None,
        },
    };
    table_keys.try_into()
}

/// Table key of a stored record.
pub(crate) fn item_key(model: &Model, item: &Item) -> Result<Item> {
    let keys = &model.keys;
    let mut table_key = Item::with_capacity(2);
    for attribute in std::iter::once(&keys.hash_key).chain(keys.range_key.as_ref()) {
        let value = item.get(attribute).ok_or_else(|| {
            Error::Validation(format!("record has no key attribute `{attribute}`"))
        })?;
        table_key.insert(attribute.clone(), value.clone());
    }
    Ok(table_key)
}

/// Whether `attribute` belongs to the table key or is the composite id.
pub(crate) fn is_key_attribute(model: &Model, attribute: &str) -> bool {
    let keys = &model.keys;
    attribute == keys.hash_key
        || keys.range_key.as_deref() == Some(attribute)
        || keys
            .composite_key
            .as_ref()
            .is_some_and(|composite| composite.name == attribute)
}
