//! Common utilities for DynamoDB requests.
//!
//! This module provides shared types used across read and write operations,
//! including records, key handling, condition expressions, filters and
//! attribute-name placeholder allocation.

/// Condition parsing and expression fragments for `where` filters.
pub mod condition;

/// Loopback-style filters (`where`, `order`, `limit`, `skip`).
pub mod filter;

/// Key types and the per-model key schema.
pub mod key;

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use std::collections;

/// A record as stored in DynamoDB.
pub type Item = collections::HashMap<String, types::AttributeValue>;

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

fn placeholder_chars(source: impl Iterator<Item = char>) -> String {
    source
        .flat_map(char::to_uppercase)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Attribute-name placeholders handed out during one planning pass.
///
/// A placeholder is `#` followed by the uppercased first character of the attribute.
/// When that name is already bound to another attribute the prefix grows by one source
/// character at a time (`#N`, `#NA`, `#NAM`, ...); once the whole name is used up a
/// numeric suffix is appended. Asking twice for the same attribute returns the same name.
///
/// Value placeholders are reserved through the same instance, so no two clauses of one
/// request ever bind the same value name.
///
/// ```rust
/// use dynamodb_connector::common::Placeholders;
///
/// let mut placeholders = Placeholders::default();
/// assert_eq!(placeholders.allocate("name"), "#N");
/// assert_eq!(placeholders.allocate("nickname"), "#NI");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Placeholders {
    names: IndexMap<String, String>,
    values: collections::HashSet<String>,
}

impl Placeholders {
    /// Return the placeholder bound to `attribute`, allocating one if needed.
    pub fn allocate(&mut self, attribute: &str) -> String {
        let length = attribute.chars().count();
        for prefix in 1..=length {
            let candidate = format!("#{}", placeholder_chars(attribute.chars().take(prefix)));
            if self.try_bind(&candidate, attribute) {
                return candidate;
            }
        }
        let base = format!("#{}", placeholder_chars(attribute.chars()));
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}{suffix}");
            if self.try_bind(&candidate, attribute) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn try_bind(&mut self, placeholder: &str, attribute: &str) -> bool {
        match self.names.get(placeholder) {
            Some(bound) => bound == attribute,
            None => {
                self.names
                    .insert(placeholder.to_string(), attribute.to_string());
                true
            }
        }
    }

    /// Reserve one value placeholder per suffix for `attribute`.
    ///
    /// The stem is `:` followed by the attribute name with non-alphanumerics replaced
    /// by `_`. When any resulting name is already taken the stem gets a numeric suffix
    /// (`:title1`, `:title2`, ...) until every name is free.
    ///
    /// ```rust
    /// use dynamodb_connector::common::Placeholders;
    ///
    /// let mut placeholders = Placeholders::default();
    /// let bounds = ["_start".to_string(), "_end".to_string()];
    /// assert_eq!(placeholders.reserve_values("title", &bounds), [":title_start", ":title_end"]);
    /// assert_eq!(placeholders.reserve_values("title_start", &[String::new()]), [":title_start1"]);
    /// ```
    pub fn reserve_values(&mut self, attribute: &str, suffixes: &[String]) -> Vec<String> {
        let base = value_placeholder(attribute);
        let mut stem = base.clone();
        let mut counter = 0;
        loop {
            let names: Vec<String> = suffixes
                .iter()
                .map(|suffix| format!("{stem}{suffix}"))
                .collect();
            if names.iter().all(|name| !self.values.contains(name)) {
                self.values.extend(names.iter().cloned());
                return names;
            }
            counter += 1;
            stem = format!("{base}{counter}");
        }
    }

    /// Number of distinct placeholders handed out.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no placeholder was handed out.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Placeholder to attribute-name map, as sent in `ExpressionAttributeNames`.
    pub fn into_names(self) -> collections::HashMap<String, String> {
        self.names.into_iter().collect()
    }
}

fn value_placeholder(attribute: &str) -> String {
    let name: String = attribute
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!(":{name}")
}

/// expression operation
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    pub(crate) fn merge(operator: &str, items: Vec<Self>) -> Self {
        let mut operation = Self::default();
        for item in items {
            operation
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            operation
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            operation.expression = get_expression(operation.expression, operator, item.expression);
        }
        operation
    }
}
