use crate::common::{
    Item,
    filter::{Direction, Filter, OrderBy},
};

use aws_sdk_dynamodb::types;
use std::cmp;

/// How a fetched result set is ordered and bounded.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessOptions {
    /// Sort field and direction.
    pub order_by: OrderBy,
    /// Records skipped after sorting.
    pub offset: Option<usize>,
    /// Records kept after skipping.
    pub limit: Option<usize>,
}

impl ProcessOptions {
    /// Options requested by `filter`, sorting by `default_field` when it names no order.
    pub fn from_filter(filter: &Filter, default_field: &str) -> Self {
        Self {
            order_by: filter.order_by(default_field),
            offset: filter.offset(),
            limit: filter.limit,
        }
    }
}

/// Compare two attribute values the way result sets are ordered.
///
/// Strings compare case-insensitively and numbers numerically. Anything else,
/// including a missing attribute or values of different kinds, compares equal.
pub fn compare(left: Option<&types::AttributeValue>, right: Option<&types::AttributeValue>) -> cmp::Ordering {
    match (left, right) {
        (Some(types::AttributeValue::S(left)), Some(types::AttributeValue::S(right))) => {
            left.to_lowercase().cmp(&right.to_lowercase())
        }
        (Some(types::AttributeValue::N(left)), Some(types::AttributeValue::N(right))) => {
            match (left.parse::<f64>(), right.parse::<f64>()) {
                (Ok(left), Ok(right)) => left.partial_cmp(&right).unwrap_or(cmp::Ordering::Equal),
                _ => cmp::Ordering::Equal,
            }
        }
        (Some(types::AttributeValue::Bool(left)), Some(types::AttributeValue::Bool(right))) => {
            left.cmp(right)
        }
        _ => cmp::Ordering::Equal,
    }
}

/// Sort the whole result set, then apply offset and limit.
///
/// Slicing happens only after every page was fetched and sorted so that offset and
/// limit refer to the global order. This materializes the full table or key range.
/// The sort is stable; records with equal sort values keep their fetch order.
/// A zero `limit` means no limit.
pub fn process(mut items: Vec<Item>, options: &ProcessOptions) -> Vec<Item> {
    let field = options.order_by.field.as_str();
    debug!(
        field,
        direction = ?options.order_by.direction,
        offset = ?options.offset,
        limit = ?options.limit,
        "sort and slice"
    );
    match options.order_by.direction {
        Direction::Ascending => items.sort_by(|a, b| compare(a.get(field), b.get(field))),
        Direction::Descending => items.sort_by(|a, b| compare(b.get(field), a.get(field))),
    }
    let skipped = items.into_iter().skip(options.offset.unwrap_or_default());
    match options.limit.filter(|limit| *limit > 0) {
        Some(limit) => skipped.take(limit).collect(),
        None => skipped.collect(),
    }
}
