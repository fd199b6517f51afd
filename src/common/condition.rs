use crate::{
    Error, Result,
    common::{self, Placeholders},
};

use aws_sdk_dynamodb::types;
use serde_dynamo::to_attribute_value;
use serde_json::Value;
use std::collections;

/// Comparison operators accepted in a `{op: value}` condition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComparisonOperator {
    /// `lt`
    LessThan,
    /// `lte`
    LessThanOrEqual,
    /// `gt`
    GreaterThan,
    /// `gte`
    GreaterThanOrEqual,
    /// `neq`, only usable as a filter.
    NotEqual,
}

impl ComparisonOperator {
    /// Operator token in condition-expression syntax.
    pub fn expression_token(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::NotEqual => "<>",
        }
    }

    /// Operator used by scan filters.
    pub fn scan_operator(self) -> types::ComparisonOperator {
        match self {
            Self::LessThan => types::ComparisonOperator::Lt,
            Self::LessThanOrEqual => types::ComparisonOperator::Le,
            Self::GreaterThan => types::ComparisonOperator::Gt,
            Self::GreaterThanOrEqual => types::ComparisonOperator::Ge,
            Self::NotEqual => types::ComparisonOperator::Ne,
        }
    }
}

/// A parsed `where` condition on a single attribute.
///
/// ```rust
/// use dynamodb_connector::common::condition::Condition;
/// use serde_json::json;
///
/// let condition = Condition::parse("order", &json!({"between": [1, 5]})).unwrap();
/// assert!(condition.promotes_to_range_key());
/// assert!(!condition.is_equality());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// `key: value` or `key: {"=": value}`.
    Equals(types::AttributeValue),
    /// `key: {lt|lte|gt|gte|neq: value}`.
    Comparison(ComparisonOperator, types::AttributeValue),
    /// `key: {between: [low, high]}`, inclusive on both ends.
    Between(types::AttributeValue, types::AttributeValue),
    /// `key: [values]` or `key: {inq: [values]}`.
    In(Vec<types::AttributeValue>),
}

fn attribute_value(value: &Value) -> Result<types::AttributeValue> {
    Ok(to_attribute_value(value)?)
}

fn operand_value(attribute: &str, operator: &str, value: &Value) -> Result<types::AttributeValue> {
    match value {
        Value::Null => Err(Error::malformed(
            attribute,
            format!("`{operator}` cannot compare against null"),
        )),
        value => attribute_value(value),
    }
}

fn reserve<const N: usize>(
    placeholders: &mut Placeholders,
    attribute: &str,
    suffixes: [&str; N],
) -> [String; N] {
    let names = placeholders.reserve_values(attribute, &suffixes.map(str::to_string));
    let mut names = names.into_iter();
    suffixes.map(|_| names.next().unwrap_or_default())
}

impl Condition {
    /// Classify a raw filter value once: scalar, single-key object or array.
    ///
    /// Objects with more than one key are rejected rather than silently honoring
    /// only the first operator.
    pub fn parse(attribute: &str, raw: &Value) -> Result<Self> {
        match raw {
            Value::Array(values) => Self::membership(attribute, values),
            Value::Object(object) => {
                let mut entries = object.iter();
                let (operator, operand) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    (None, _) => return Err(Error::malformed(attribute, "empty condition object")),
                    (Some(_), Some(_)) => {
                        let operators: Vec<&str> = object.keys().map(String::as_str).collect();
                        return Err(Error::malformed(
                            attribute,
                            format!("expected a single operator, got `{}`", operators.join("`, `")),
                        ));
                    }
                };
                Self::operator(attribute, operator, operand)
            }
            scalar => Ok(Self::Equals(attribute_value(scalar)?)),
        }
    }

    fn membership(attribute: &str, values: &[Value]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::malformed(
                attribute,
                "membership expects at least one value",
            ));
        }
        let values = values
            .iter()
            .map(attribute_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::In(values))
    }

    fn operator(attribute: &str, operator: &str, operand: &Value) -> Result<Self> {
        let comparison = match operator {
            "=" | "eq" => return Ok(Self::Equals(attribute_value(operand)?)),
            "lt" => ComparisonOperator::LessThan,
            "lte" => ComparisonOperator::LessThanOrEqual,
            "gt" => ComparisonOperator::GreaterThan,
            "gte" => ComparisonOperator::GreaterThanOrEqual,
            "neq" => ComparisonOperator::NotEqual,
            "between" => {
                return match operand {
                    Value::Array(bounds) if bounds.len() == 2 => Ok(Self::Between(
                        operand_value(attribute, operator, &bounds[0])?,
                        operand_value(attribute, operator, &bounds[1])?,
                    )),
                    _ => Err(Error::malformed(
                        attribute,
                        "`between` expects an array of exactly two values",
                    )),
                };
            }
            "inq" => {
                return match operand {
                    Value::Array(values) => Self::membership(attribute, values),
                    _ => Err(Error::malformed(attribute, "`inq` expects an array")),
                };
            }
            unknown => {
                return Err(Error::malformed(
                    attribute,
                    format!("unsupported operator `{unknown}`"),
                ));
            }
        };
        match operand {
            Value::Array(_) | Value::Object(_) => Err(Error::malformed(
                attribute,
                format!("`{operator}` expects a scalar value"),
            )),
            scalar => Ok(Self::Comparison(
                comparison,
                operand_value(attribute, operator, scalar)?,
            )),
        }
    }

    /// Whether the condition can sit in the hash-key position of a key condition.
    pub fn is_equality(&self) -> bool {
        matches!(self, Self::Equals(value) if !value.is_null())
    }

    /// Whether the condition can sit in the range-key position of a key condition.
    pub fn promotes_to_range_key(&self) -> bool {
        match self {
            Self::Equals(value) => !value.is_null(),
            Self::Between(..) => true,
            Self::Comparison(operator, _) => *operator != ComparisonOperator::NotEqual,
            Self::In(_) => false,
        }
    }

    /// Render the condition as a condition-expression clause.
    ///
    /// Both attribute and value placeholders come from `placeholders`, which the caller
    /// threads through one planning pass.
    pub fn fragment(&self, attribute: &str, placeholders: &mut Placeholders) -> ExpressionFragment {
        let placeholder_name = placeholders.allocate(attribute);
        let (clause_text, value_bindings) = match self {
            Self::Equals(value) => {
                let [name] = reserve(placeholders, attribute, [""]);
                let clause = format!("{placeholder_name} = {name}");
                (clause, collections::HashMap::from([(name, value.clone())]))
            }
            Self::Comparison(operator, value) => {
                let [name] = reserve(placeholders, attribute, [""]);
                let clause = format!(
                    "{placeholder_name} {} {name}",
                    operator.expression_token()
                );
                (clause, collections::HashMap::from([(name, value.clone())]))
            }
            Self::Between(low, high) => {
                let [start, end] = reserve(placeholders, attribute, ["_start", "_end"]);
                let clause = format!("{placeholder_name} BETWEEN {start} AND {end}");
                (
                    clause,
                    collections::HashMap::from([(start, low.clone()), (end, high.clone())]),
                )
            }
            Self::In(values) => {
                let suffixes: Vec<String> = (0..values.len()).map(|index| format!("_{index}")).collect();
                let members = placeholders.reserve_values(attribute, &suffixes);
                let clause = format!("{placeholder_name} IN ({})", members.join(", "));
                (clause, members.into_iter().zip(values.iter().cloned()).collect())
            }
        };
        ExpressionFragment {
            attribute_name: attribute.to_string(),
            clause_text,
            placeholder_name,
            value_bindings,
        }
    }

    /// Render the condition as a legacy scan filter entry.
    pub fn scan_condition(&self) -> Result<types::Condition> {
        let (operator, values) = match self {
            Self::Equals(value) => (types::ComparisonOperator::Eq, vec![value.clone()]),
            Self::Comparison(operator, value) => (operator.scan_operator(), vec![value.clone()]),
            Self::Between(low, high) => (
                types::ComparisonOperator::Between,
                vec![low.clone(), high.clone()],
            ),
            Self::In(values) => (types::ComparisonOperator::In, values.clone()),
        };
        let condition = types::Condition::builder()
            .comparison_operator(operator)
            .set_attribute_value_list(Some(values))
            .build()?;
        Ok(condition)
    }
}

/// One rendered clause of a key-condition or filter expression.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionFragment {
    /// The filtered attribute.
    pub attribute_name: String,
    /// The clause, e.g. `#T BETWEEN :title_start AND :title_end`.
    pub clause_text: String,
    /// The attribute-name placeholder, e.g. `#T`.
    pub placeholder_name: String,
    /// Value placeholders used by the clause.
    pub value_bindings: collections::HashMap<String, types::AttributeValue>,
}

impl From<ExpressionFragment> for common::ExpressionInput {
    fn from(fragment: ExpressionFragment) -> Self {
        Self {
            expression: fragment.clause_text,
            expression_attribute_names: collections::HashMap::from([(
                fragment.placeholder_name,
                fragment.attribute_name,
            )]),
            expression_attribute_values: fragment.value_bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::json;

    fn s(value: &str) -> types::AttributeValue {
        types::AttributeValue::S(value.to_string())
    }

    fn n(value: &str) -> types::AttributeValue {
        types::AttributeValue::N(value.to_string())
    }

    #[rstest]
    #[case::scalar_string(json!("lead"), Condition::Equals(s("lead")))]
    #[case::scalar_number(json!(2), Condition::Equals(n("2")))]
    #[case::scalar_null(json!(null), Condition::Equals(types::AttributeValue::Null(true)))]
    #[case::explicit_equals(json!({"=": "lead"}), Condition::Equals(s("lead")))]
    #[case::lt(json!({"lt": 5}), Condition::Comparison(ComparisonOperator::LessThan, n("5")))]
    #[case::lte(json!({"lte": 5}), Condition::Comparison(ComparisonOperator::LessThanOrEqual, n("5")))]
    #[case::gt(json!({"gt": "m"}), Condition::Comparison(ComparisonOperator::GreaterThan, s("m")))]
    #[case::gte(json!({"gte": 1}), Condition::Comparison(ComparisonOperator::GreaterThanOrEqual, n("1")))]
    #[case::neq(json!({"neq": "x"}), Condition::Comparison(ComparisonOperator::NotEqual, s("x")))]
    #[case::between(json!({"between": [1, 9]}), Condition::Between(n("1"), n("9")))]
    #[case::array(json!(["a", "b"]), Condition::In(vec![s("a"), s("b")]))]
    #[case::inq(json!({"inq": [1, 2, 3]}), Condition::In(vec![n("1"), n("2"), n("3")]))]
    fn test_parse_condition(#[case] raw: Value, #[case] expected: Condition) {
        let actual = Condition::parse("attr", &raw).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::multiple_operators(json!({"gt": 1, "lt": 5}))]
    #[case::empty_object(json!({}))]
    #[case::between_one_value(json!({"between": [1]}))]
    #[case::between_three_values(json!({"between": [1, 2, 3]}))]
    #[case::between_scalar(json!({"between": 1}))]
    #[case::inq_scalar(json!({"inq": "a"}))]
    #[case::comparison_with_array(json!({"gt": [1, 2]}))]
    #[case::unknown_operator(json!({"like": "a%"}))]
    #[case::empty_membership(json!([]))]
    #[case::empty_inq(json!({"inq": []}))]
    #[case::comparison_with_null(json!({"gt": null}))]
    #[case::between_null_bound(json!({"between": [null, 5]}))]
    fn test_parse_malformed_condition(#[case] raw: Value) {
        let error = Condition::parse("attr", &raw).unwrap_err();
        assert!(matches!(
            error,
            Error::MalformedCondition { ref attribute, .. } if attribute == "attr"
        ));
    }

    #[rstest]
    #[case::equals(Condition::Equals(n("1")), true, true)]
    #[case::comparison(Condition::Comparison(ComparisonOperator::GreaterThan, n("1")), false, true)]
    #[case::not_equal(Condition::Comparison(ComparisonOperator::NotEqual, n("1")), false, false)]
    #[case::between(Condition::Between(n("1"), n("2")), false, true)]
    #[case::membership(Condition::In(vec![n("1")]), false, false)]
    #[case::null_equality(Condition::Equals(types::AttributeValue::Null(true)), false, false)]
    fn test_key_positions(
        #[case] condition: Condition,
        #[case] hash: bool,
        #[case] range: bool,
    ) {
        assert_eq!(condition.is_equality(), hash);
        assert_eq!(condition.promotes_to_range_key(), range);
    }

    #[rstest]
    #[case::equals(
        Condition::Equals(s("lead")),
        "role",
        ExpressionFragment {
            attribute_name: "role".to_string(),
            clause_text: "#R = :role".to_string(),
            placeholder_name: "#R".to_string(),
            value_bindings: collections::HashMap::from(
                [(":role".to_string(), s("lead"))]
            ),
        }
    )]
    #[case::comparison(
        Condition::Comparison(ComparisonOperator::LessThanOrEqual, n("3")),
        "order",
        ExpressionFragment {
            attribute_name: "order".to_string(),
            clause_text: "#O <= :order".to_string(),
            placeholder_name: "#O".to_string(),
            value_bindings: collections::HashMap::from(
                [(":order".to_string(), n("3"))]
            ),
        }
    )]
    #[case::between(
        Condition::Between(s("a"), s("m")),
        "title",
        ExpressionFragment {
            attribute_name: "title".to_string(),
            clause_text: "#T BETWEEN :title_start AND :title_end".to_string(),
            placeholder_name: "#T".to_string(),
            value_bindings: collections::HashMap::from(
                [
                    (":title_start".to_string(), s("a")),
                    (":title_end".to_string(), s("m")),
                ]
            ),
        }
    )]
    #[case::membership(
        Condition::In(vec![s("lead"), s("bass")]),
        "role",
        ExpressionFragment {
            attribute_name: "role".to_string(),
            clause_text: "#R IN (:role_0, :role_1)".to_string(),
            placeholder_name: "#R".to_string(),
            value_bindings: collections::HashMap::from(
                [
                    (":role_0".to_string(), s("lead")),
                    (":role_1".to_string(), s("bass")),
                ]
            ),
        }
    )]
    fn test_fragment(
        #[case] condition: Condition,
        #[case] attribute: &str,
        #[case] expected: ExpressionFragment,
    ) {
        let mut placeholders = Placeholders::default();
        assert_eq!(condition.fragment(attribute, &mut placeholders), expected);
    }

    #[test]
    fn test_fragment_shares_placeholder_map() {
        let mut placeholders = Placeholders::default();
        let first = Condition::Equals(s("x")).fragment("name", &mut placeholders);
        let second = Condition::Equals(s("y")).fragment("nickname", &mut placeholders);
        assert_eq!(first.clause_text, "#N = :name");
        assert_eq!(second.clause_text, "#NI = :nickname");
    }

    #[test]
    fn test_fragment_value_names_stay_distinct() {
        let mut placeholders = Placeholders::default();
        let bound = Condition::Between(s("A"), s("M")).fragment("title", &mut placeholders);
        let equality = Condition::Equals(s("z")).fragment("title_start", &mut placeholders);
        assert_eq!(bound.clause_text, "#T BETWEEN :title_start AND :title_end");
        assert_eq!(equality.clause_text, "#TI = :title_start1");
        assert_eq!(bound.value_bindings.get(":title_start"), Some(&s("A")));
        assert_eq!(equality.value_bindings.get(":title_start1"), Some(&s("z")));
    }

    #[rstest]
    #[case::equals(Condition::Equals(s("lead")), types::ComparisonOperator::Eq, vec![s("lead")])]
    #[case::lte(
        Condition::Comparison(ComparisonOperator::LessThanOrEqual, n("3")),
        types::ComparisonOperator::Le,
        vec![n("3")]
    )]
    #[case::gte(
        Condition::Comparison(ComparisonOperator::GreaterThanOrEqual, n("3")),
        types::ComparisonOperator::Ge,
        vec![n("3")]
    )]
    #[case::between(
        Condition::Between(n("1"), n("4")),
        types::ComparisonOperator::Between,
        vec![n("1"), n("4")]
    )]
    #[case::membership(
        Condition::In(vec![s("a"), s("b")]),
        types::ComparisonOperator::In,
        vec![s("a"), s("b")]
    )]
    fn test_scan_condition(
        #[case] condition: Condition,
        #[case] operator: types::ComparisonOperator,
        #[case] values: Vec<types::AttributeValue>,
    ) {
        let expected = types::Condition::builder()
            .comparison_operator(operator)
            .set_attribute_value_list(Some(values))
            .build()
            .unwrap();
        assert_eq!(condition.scan_condition().unwrap(), expected);
    }
}
