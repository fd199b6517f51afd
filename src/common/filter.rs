use crate::{Error, Result};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Sort direction of an `order` entry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    /// `ASC` or no suffix.
    #[default]
    Ascending,
    /// `DESC`.
    Descending,
}

/// The single field results are sorted by.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    /// Attribute compared by the sort.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

/// Raw `order` value: `"title DESC"`, `"a, b ASC"` or `["a", "b DESC"]`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Order {
    /// Comma separated fields.
    Fields(String),
    /// One field per entry.
    List(Vec<String>),
}

/// Loopback-style filter.
///
/// ```rust
/// use dynamodb_connector::common::filter::{Direction, Filter};
/// use serde_json::json;
///
/// let filter = Filter::from_value(json!({
///     "where": {"role": "lead"},
///     "order": "name DESC",
///     "limit": 2,
/// }))
/// .unwrap();
/// let order = filter.order_by("id");
/// assert_eq!(order.field, "name");
/// assert_eq!(order.direction, Direction::Descending);
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Filter {
    /// Conditions keyed by attribute, in the order they were written.
    #[serde(rename = "where")]
    pub where_clause: Option<IndexMap<String, Value>>,
    /// Requested ordering.
    pub order: Option<Order>,
    /// Maximum number of records returned.
    pub limit: Option<usize>,
    /// Records skipped before `limit` applies.
    pub skip: Option<usize>,
    /// Same as `skip`; wins when both are given.
    pub offset: Option<usize>,
    /// Relations to expand, handed to the include hook untouched.
    pub include: Option<Value>,
}

impl Filter {
    /// Deserialize a filter, reporting shape errors as validation errors.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|error| Error::Validation(error.to_string()))
    }

    /// Filter with only a `where` clause.
    pub fn with_where(where_clause: IndexMap<String, Value>) -> Self {
        Self {
            where_clause: Some(where_clause),
            ..Default::default()
        }
    }

    /// Resolve `order` into the field the results are sorted by.
    ///
    /// Only the last listed field is kept; earlier ones are overridden rather than used
    /// as tie-breakers.
    pub fn order_by(&self, default_field: &str) -> OrderBy {
        let fields: Vec<&str> = match &self.order {
            Some(Order::Fields(fields)) => fields.split(',').collect(),
            Some(Order::List(list)) => list.iter().map(String::as_str).collect(),
            None => Vec::new(),
        };
        fields
            .into_iter()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .next_back()
            .map_or_else(
                || OrderBy {
                    field: default_field.to_string(),
                    direction: Direction::Ascending,
                },
                parse_order_field,
            )
    }

    /// Records to skip: `offset`, else `skip`.
    pub fn offset(&self) -> Option<usize> {
        self.offset.or(self.skip)
    }
}

fn parse_order_field(entry: &str) -> OrderBy {
    if let Some((field, suffix)) = entry.rsplit_once(char::is_whitespace) {
        let field = field.trim_end();
        if !field.is_empty() {
            if suffix.eq_ignore_ascii_case("desc") {
                return OrderBy {
                    field: field.to_string(),
                    direction: Direction::Descending,
                };
            }
            if suffix.eq_ignore_ascii_case("asc") {
                return OrderBy {
                    field: field.to_string(),
                    direction: Direction::Ascending,
                };
            }
        }
    }
    OrderBy {
        field: entry.to_string(),
        direction: Direction::Ascending,
    }
}
