use crate::common::Item;

/// Single-record lookup by table key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetRequest {
    /// Table to read from.
    pub table_name: String,
    /// Hash key and, for composite models, range key.
    pub key: Item,
}

impl GetRequest {
    /// Lookup of `key` in `table_name`.
    pub fn new(table_name: &str, key: Item) -> Self {
        Self {
            table_name: table_name.to_string(),
            key,
        }
    }
}
