use crate::common::Item;

/// Create-or-replace of one record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutRequest {
    /// Table to write to.
    pub table_name: String,
    /// The full record, keys included.
    pub item: Item,
}

impl PutRequest {
    /// Put `item` into `table_name`.
    pub fn new(table_name: &str, item: Item) -> Self {
        Self {
            table_name: table_name.to_string(),
            item,
        }
    }
}
