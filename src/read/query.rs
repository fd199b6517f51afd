use crate::{common::Item, read::plan::QueryPlan};

use aws_sdk_dynamodb::types;
use std::collections;

/// Query request built from an indexed plan.
///
/// ```rust
/// use dynamodb_connector::{common::{filter::Filter, key::KeyModel}, read::{plan, query::QueryRequest}};
/// use serde_json::json;
///
/// let model = KeyModel::new("id");
/// let filter = Filter::from_value(json!({"where": {"id": "1", "role": "lead"}})).unwrap();
/// let request = QueryRequest::from_plan("users", plan::plan(&model, &filter).unwrap());
/// assert_eq!(request.key_condition_expression, "#I = :id");
/// assert_eq!(request.filter_expression.as_deref(), Some("#R = :role"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryRequest {
    /// Table to query.
    pub table_name: String,
    /// Secondary index to query, if any.
    pub index_name: Option<String>,
    /// Hash clause and optional range clause.
    pub key_condition_expression: String,
    /// Conditions evaluated after the key lookup.
    pub filter_expression: Option<String>,
    /// Attribute-name placeholders.
    pub expression_attribute_names: collections::HashMap<String, String>,
    /// Value placeholders.
    pub expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
    /// Continuation token of the previous page.
    pub exclusive_start_key: Option<Item>,
}

impl QueryRequest {
    /// Build the first-page request of an indexed plan.
    pub fn from_plan(table_name: &str, plan: QueryPlan) -> Self {
        Self {
            table_name: table_name.to_string(),
            key_condition_expression: plan.key_condition_expression().unwrap_or_default(),
            filter_expression: plan.filter_expression(),
            index_name: plan.index_name,
            expression_attribute_names: plan.expression_attribute_names,
            expression_attribute_values: plan.expression_attribute_values,
            exclusive_start_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::{filter::Filter, key::KeyModel};
    use crate::read::plan;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[case::hash_only(
        json!({"singer": "Foo Fighters"}),
        QueryRequest {
            table_name: "songs".to_string(),
            key_condition_expression: "#S = :singer".to_string(),
            expression_attribute_names: collections::HashMap::from(
                [("#S".to_string(), "singer".to_string())]
            ),
            expression_attribute_values: collections::HashMap::from(
                [
                    (
                        ":singer".to_string(),
                        types::AttributeValue::S(
                            "Foo Fighters".to_string()
                        )
                    ),
                ]
            ),
            ..Default::default()
        }
    )]
    #[case::full(
        json!({"singer": "Foo Fighters", "title": {"lt": "N"}, "year": 1997}),
        QueryRequest {
            table_name: "songs".to_string(),
            key_condition_expression: "#S = :singer AND #T < :title".to_string(),
            filter_expression: Some("#Y = :year".to_string()),
            expression_attribute_names: collections::HashMap::from(
                [
                    ("#S".to_string(), "singer".to_string()),
                    ("#T".to_string(), "title".to_string()),
                    ("#Y".to_string(), "year".to_string()),
                ]
            ),
            expression_attribute_values: collections::HashMap::from(
                [
                    (
                        ":singer".to_string(),
                        types::AttributeValue::S(
                            "Foo Fighters".to_string()
                        )
                    ),
                    (
                        ":title".to_string(),
                        types::AttributeValue::S(
                            "N".to_string()
                        )
                    ),
                    (
                        ":year".to_string(),
                        types::AttributeValue::N(
                            "1997".to_string()
                        )
                    ),
                ]
            ),
            ..Default::default()
        }
    )]
    fn test_query_request_from_plan(#[case] raw: Value, #[case] expected: QueryRequest) {
        let model = KeyModel::new("singer").with_range_key("title", "--oo--");
        let filter = Filter::from_value(json!({ "where": raw })).unwrap();
        let actual = QueryRequest::from_plan("songs", plan::plan(&model, &filter).unwrap());
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_query_request_on_index() {
        let model = KeyModel::new("id").with_global_index("email", None);
        let filter = Filter::from_value(json!({"where": {"email": "a@b.c"}})).unwrap();
        let actual = QueryRequest::from_plan("users", plan::plan(&model, &filter).unwrap());
        assert_eq!(actual.index_name.as_deref(), Some("emailGlobalIndex"));
        assert_eq!(actual.filter_expression, None);
    }
}
