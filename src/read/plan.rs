use crate::{
    Result,
    common::{
        self, Placeholders,
        condition::{Condition, ExpressionFragment},
        filter::Filter,
        key::{KeyModel, KeySchema},
    },
};

use aws_sdk_dynamodb::types;
use std::collections;

/// A `where` condition evaluated after retrieval.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterClause {
    /// The filtered attribute.
    pub attribute: String,
    /// The parsed condition.
    pub condition: Condition,
    /// Expression rendering, present on the query path only; the scan path sends
    /// the condition as a scan filter instead.
    pub fragment: Option<ExpressionFragment>,
}

/// Outcome of planning one filter against one key model.
///
/// `key_condition_clauses` holds the hash clause first and the optional range clause
/// second; it is empty exactly when `uses_index` is false.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryPlan {
    /// Whether an indexed query serves the filter.
    pub uses_index: bool,
    /// Secondary index queried, `None` for the table itself or a scan.
    pub index_name: Option<String>,
    /// Hash clause and optional range clause.
    pub key_condition_clauses: Vec<ExpressionFragment>,
    /// Remaining conditions, in `where` order.
    pub filter_clauses: Vec<FilterClause>,
    /// Attribute-name placeholders of all rendered clauses.
    pub expression_attribute_names: collections::HashMap<String, String>,
    /// Value placeholders of all rendered clauses.
    pub expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl QueryPlan {
    /// Key clauses joined with `AND`.
    pub fn key_condition_expression(&self) -> Option<String> {
        join_clauses(self.key_condition_clauses.iter())
    }

    /// Rendered filter clauses joined with `AND`.
    pub fn filter_expression(&self) -> Option<String> {
        join_clauses(self.filter_clauses.iter().filter_map(|clause| clause.fragment.as_ref()))
    }
}

fn join_clauses<'a>(fragments: impl Iterator<Item = &'a ExpressionFragment>) -> Option<String> {
    let operation = common::ExpressionInput::merge(
        " AND ",
        fragments
            .map(|fragment| common::ExpressionInput {
                expression: fragment.clause_text.clone(),
                ..Default::default()
            })
            .collect(),
    );
    Some(operation.expression).filter(|expression| !expression.is_empty())
}

/// Selected key schema plus the `where` positions feeding its clauses.
struct KeyMatch<'a> {
    schema: KeySchema<'a>,
    hash: usize,
    range: Option<usize>,
}

/// Pick the key schema a query can use, if any.
///
/// The hash is the first attribute in `where` order holding an equality on the hash side
/// of the table or of an index. Among the schemas sharing that hash, the range comes from
/// the first other attribute in `where` order that is a schema's range and holds a
/// range-capable condition. Without such an attribute the first schema with that hash is
/// used, schemas being ordered table, local indexes, global indexes.
fn match_key_schema<'a>(model: &'a KeyModel, conditions: &[(String, Condition)]) -> Option<KeyMatch<'a>> {
    let (hash, hash_attribute) = conditions
        .iter()
        .enumerate()
        .find(|(_, (attribute, condition))| {
            condition.is_equality() && model.is_hash_attribute(attribute)
        })
        .map(|(position, (attribute, _))| (position, attribute.as_str()))?;

    let ranged = conditions.iter().enumerate().find_map(|(position, (attribute, condition))| {
        if position == hash || !condition.promotes_to_range_key() {
            return None;
        }
        model
            .key_schemas()
            .find(|schema| schema.hash == hash_attribute && schema.range == Some(attribute.as_str()))
            .map(|schema| KeyMatch {
                schema,
                hash,
                range: Some(position),
            })
    });
    if ranged.is_some() {
        return ranged;
    }
    model
        .key_schemas()
        .find(|schema| schema.hash == hash_attribute)
        .map(|schema| KeyMatch {
            schema,
            hash,
            range: None,
        })
}

/// Translate a filter into a query or scan plan.
///
/// ```rust
/// use dynamodb_connector::{common::{filter::Filter, key::KeyModel}, read::plan};
/// use serde_json::json;
///
/// let model = KeyModel::new("singer").with_range_key("title", "--oo--");
/// let filter = Filter::from_value(json!({
///     "where": {"singer": "Foo Fighters", "title": {"between": ["A", "M"]}},
/// }))
/// .unwrap();
/// let plan = plan::plan(&model, &filter).unwrap();
/// assert!(plan.uses_index);
/// assert_eq!(
///     plan.key_condition_expression().as_deref(),
///     Some("#S = :singer AND #T BETWEEN :title_start AND :title_end")
/// );
/// ```
pub fn plan(model: &KeyModel, filter: &Filter) -> Result<QueryPlan> {
    let Some(where_clause) = filter.where_clause.as_ref().filter(|clause| !clause.is_empty()) else {
        debug!("no where clause, full scan");
        return Ok(QueryPlan::default());
    };
    let conditions = where_clause
        .iter()
        .map(|(attribute, raw)| Ok((attribute.clone(), Condition::parse(attribute, raw)?)))
        .collect::<Result<Vec<_>>>()?;

    let Some(key_match) = match_key_schema(model, &conditions) else {
        debug!("no equality on a hash key, SCAN operation will be used");
        let filter_clauses = conditions
            .into_iter()
            .map(|(attribute, condition)| FilterClause {
                attribute,
                condition,
                fragment: None,
            })
            .collect();
        return Ok(QueryPlan {
            filter_clauses,
            ..Default::default()
        });
    };
    debug!(
        index_name = ?key_match.schema.index_name,
        hash_key = %key_match.schema.hash,
        range_key = ?key_match.range.map(|position| &conditions[position].0),
        "hash key found, QUERY operation will be used"
    );

    let mut placeholders = Placeholders::default();
    let mut expression_attribute_values = collections::HashMap::new();
    let mut key_condition_clauses = Vec::with_capacity(2);
    for position in std::iter::once(key_match.hash).chain(key_match.range) {
        let (attribute, condition) = &conditions[position];
        let fragment = condition.fragment(attribute, &mut placeholders);
        expression_attribute_values.extend(fragment.value_bindings.clone());
        key_condition_clauses.push(fragment);
    }

    let mut filter_clauses = Vec::with_capacity(conditions.len() - key_condition_clauses.len());
    for (position, (attribute, condition)) in conditions.into_iter().enumerate() {
        if position == key_match.hash || Some(position) == key_match.range {
            continue;
        }
        let fragment = condition.fragment(&attribute, &mut placeholders);
        expression_attribute_values.extend(fragment.value_bindings.clone());
        filter_clauses.push(FilterClause {
            attribute,
            condition,
            fragment: Some(fragment),
        });
    }

    Ok(QueryPlan {
        uses_index: true,
        index_name: key_match.schema.index_name.map(str::to_string),
        key_condition_clauses,
        filter_clauses,
        expression_attribute_names: placeholders.into_names(),
        expression_attribute_values,
    })
}
