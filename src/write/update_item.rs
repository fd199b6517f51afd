use crate::{common::Item, model::Model, write};

use aws_sdk_dynamodb::types;
use std::collections;

/// Attribute-level update of one record.
///
/// Updates use the legacy `AttributeUpdates` map with a `PUT` action per attribute
/// and ask for the whole updated record back (`ALL_NEW`).
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateRequest {
    /// Table to write to.
    pub table_name: String,
    /// Hash key and, for composite models, range key.
    pub key: Item,
    /// New value per updated attribute.
    pub attribute_updates: collections::HashMap<String, types::AttributeValueUpdate>,
    /// Attributes returned by the store.
    pub return_values: types::ReturnValue,
}

impl UpdateRequest {
    /// Overwrite the non-key attributes of `data` on the record at `key`.
    ///
    /// Key attributes, the composite id and null values are left out; a record's key
    /// cannot change and a null does not clear anything.
    pub fn new(model: &Model, key: Item, data: Item) -> Self {
        let attribute_updates = data
            .into_iter()
            .filter(|(attribute, value)| {
                !write::common::is_key_attribute(model, attribute)
                    && !matches!(value, types::AttributeValue::Null(_))
            })
            .map(|(attribute, value)| {
                let update = types::AttributeValueUpdate::builder()
                    .value(value)
                    .action(types::AttributeAction::Put)
                    .build();
                (attribute, update)
            })
            .collect();
        Self {
            table_name: model.table_name.clone(),
            key,
            attribute_updates,
            return_values: types::ReturnValue::AllNew,
        }
    }
}
