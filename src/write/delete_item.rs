use crate::common::Item;

use aws_sdk_dynamodb::types;

/// Removal of one record by table key.
///
/// The store hands back the removed record (`ALL_OLD`).
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteRequest {
    /// Table to delete from.
    pub table_name: String,
    /// Hash key and, for composite models, range key.
    pub key: Item,
    /// Attributes returned by the store.
    pub return_values: types::ReturnValue,
}

impl DeleteRequest {
    /// Delete `key` from `table_name`, returning the old record.
    pub fn new(table_name: &str, key: Item) -> Self {
        Self {
            table_name: table_name.to_string(),
            key,
            return_values: types::ReturnValue::AllOld,
        }
    }
}
