#![allow(dead_code)]

use aws_sdk_dynamodb::types;
use dynamodb_connector::{
    Error, Result,
    common::Item,
    read::{common::Page, get_item::GetRequest, query::QueryRequest, scan::ScanRequest},
    transport::Transport,
    write::{delete_item::DeleteRequest, put_item::PutRequest, update_item::UpdateRequest},
};
use std::{cmp, collections, io, sync::Mutex};

const OFFSET_KEY: &str = "__offset";

struct Table {
    hash_key: String,
    range_key: Option<String>,
    items: Vec<Item>,
}

impl Table {
    fn position(&self, key: &Item) -> Option<usize> {
        self.items.iter().position(|item| {
            std::iter::once(&self.hash_key)
                .chain(self.range_key.as_ref())
                .all(|attribute| item.get(attribute) == key.get(attribute))
        })
    }
}

/// Requests seen by the store, in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Query(QueryRequest),
    Scan(ScanRequest),
    Get(GetRequest),
    Put(PutRequest),
    Delete(DeleteRequest),
    Update(UpdateRequest),
}

/// In-memory store evaluating the expressions and scan filters the connector emits.
///
/// Reads are paged: each round trip evaluates at most `page_size` records and hands
/// back a continuation token while records remain, even when the page itself is empty
/// after filtering.
pub struct MemoryStore {
    tables: Mutex<collections::HashMap<String, Table>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<String>>,
    page_size: usize,
}

impl MemoryStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            tables: Mutex::new(collections::HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            page_size,
        }
    }

    pub fn with_table(self, name: &str, hash_key: &str, range_key: Option<&str>) -> Self {
        self.tables.lock().unwrap().insert(
            name.to_string(),
            Table {
                hash_key: hash_key.to_string(),
                range_key: range_key.map(str::to_string),
                items: Vec::new(),
            },
        );
        self
    }

    /// Make the next store call fail with `message`.
    pub fn fail_next(&self, message: &str) {
        self.failures.lock().unwrap().push(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn items(&self, table: &str) -> Vec<Item> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|table| table.items.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().pop() {
            Some(message) => Err(Error::transport(io::Error::other(message))),
            None => Ok(()),
        }
    }

    fn with_table_mut<T>(&self, name: &str, f: impl FnOnce(&mut Table) -> T) -> Result<T> {
        let mut tables = self.tables.lock().unwrap();
        let table = tables.get_mut(name).ok_or_else(|| {
            Error::transport(io::Error::other(format!(
                "ResourceNotFoundException: table {name} not found"
            )))
        })?;
        Ok(f(table))
    }

    fn page(&self, matching: Vec<Item>, start: Option<&Item>, keep: impl Fn(&Item) -> bool) -> Page {
        let offset = match start.and_then(|key| key.get(OFFSET_KEY)) {
            Some(types::AttributeValue::N(offset)) => offset.parse().unwrap(),
            _ => 0,
        };
        let end = cmp::min(offset + self.page_size, matching.len());
        let items = matching[offset..end]
            .iter()
            .filter(|item| keep(*item))
            .cloned()
            .collect();
        let last_evaluated_key = (end < matching.len()).then(|| {
            collections::HashMap::from([(
                OFFSET_KEY.to_string(),
                types::AttributeValue::N(end.to_string()),
            )])
        });
        Page {
            items,
            last_evaluated_key,
        }
    }
}

fn compare(left: &types::AttributeValue, right: &types::AttributeValue) -> Option<cmp::Ordering> {
    match (left, right) {
        (types::AttributeValue::S(left), types::AttributeValue::S(right)) => Some(left.cmp(right)),
        (types::AttributeValue::N(left), types::AttributeValue::N(right)) => {
            left.parse::<f64>().ok()?.partial_cmp(&right.parse::<f64>().ok()?)
        }
        _ => (left == right).then_some(cmp::Ordering::Equal),
    }
}

fn holds(
    value: Option<&types::AttributeValue>,
    operator: &str,
    operands: &[&types::AttributeValue],
) -> bool {
    let Some(value) = value else {
        return operator == "<>" || operator == "NE";
    };
    let ordering = |operand: &types::AttributeValue| compare(value, operand);
    match operator {
        "=" | "EQ" => ordering(operands[0]) == Some(cmp::Ordering::Equal),
        "<>" | "NE" => ordering(operands[0]) != Some(cmp::Ordering::Equal),
        "<" | "LT" => ordering(operands[0]) == Some(cmp::Ordering::Less),
        "<=" | "LE" => matches!(ordering(operands[0]), Some(cmp::Ordering::Less | cmp::Ordering::Equal)),
        ">" | "GT" => ordering(operands[0]) == Some(cmp::Ordering::Greater),
        ">=" | "GE" => matches!(ordering(operands[0]), Some(cmp::Ordering::Greater | cmp::Ordering::Equal)),
        "BETWEEN" => {
            matches!(ordering(operands[0]), Some(cmp::Ordering::Greater | cmp::Ordering::Equal))
                && matches!(ordering(operands[1]), Some(cmp::Ordering::Less | cmp::Ordering::Equal))
        }
        "IN" => operands
            .iter()
            .any(|operand| ordering(*operand) == Some(cmp::Ordering::Equal)),
        unknown => panic!("unsupported operator {unknown}"),
    }
}

/// Evaluate `#A = :a AND #B BETWEEN :b_start AND :b_end AND #C IN (:c_0, :c_1)`.
fn evaluate(
    expression: &str,
    names: &collections::HashMap<String, String>,
    values: &collections::HashMap<String, types::AttributeValue>,
    item: &Item,
) -> bool {
    let tokens: Vec<&str> = expression.split_whitespace().collect();
    let value = |token: &str| {
        let token = token.trim_matches(|c| c == '(' || c == ')' || c == ',');
        values
            .get(token)
            .unwrap_or_else(|| panic!("unbound value placeholder {token}"))
    };
    let mut position = 0;
    while position < tokens.len() {
        let attribute = names
            .get(tokens[position])
            .unwrap_or_else(|| panic!("unbound name placeholder {}", tokens[position]));
        let operator = tokens[position + 1];
        let mut operands = Vec::new();
        position += 2;
        match operator {
            "BETWEEN" => {
                assert_eq!(tokens[position + 1], "AND");
                operands.push(value(tokens[position]));
                operands.push(value(tokens[position + 2]));
                position += 3;
            }
            "IN" => loop {
                let token = tokens[position];
                operands.push(value(token));
                position += 1;
                if token.ends_with(')') {
                    break;
                }
            },
            _ => {
                operands.push(value(tokens[position]));
                position += 1;
            }
        }
        if !holds(item.get(attribute), operator, &operands) {
            return false;
        }
        if position < tokens.len() {
            assert_eq!(tokens[position], "AND");
            position += 1;
        }
    }
    true
}

fn scan_operator(operator: &types::ComparisonOperator) -> &'static str {
    match operator {
        types::ComparisonOperator::Eq => "EQ",
        types::ComparisonOperator::Ne => "NE",
        types::ComparisonOperator::Lt => "LT",
        types::ComparisonOperator::Le => "LE",
        types::ComparisonOperator::Gt => "GT",
        types::ComparisonOperator::Ge => "GE",
        types::ComparisonOperator::Between => "BETWEEN",
        types::ComparisonOperator::In => "IN",
        other => panic!("unsupported scan operator {other:?}"),
    }
}

impl Transport for MemoryStore {
    async fn query(&self, request: &QueryRequest) -> Result<Page> {
        self.record(Call::Query(request.clone()))?;
        let names = &request.expression_attribute_names;
        let values = &request.expression_attribute_values;
        let matching = self.with_table_mut(&request.table_name, |table| {
            table
                .items
                .iter()
                .filter(|item| evaluate(&request.key_condition_expression, names, values, item))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        Ok(self.page(matching, request.exclusive_start_key.as_ref(), |item| {
            request
                .filter_expression
                .as_ref()
                .is_none_or(|filter| evaluate(filter, names, values, item))
        }))
    }

    async fn scan(&self, request: &ScanRequest) -> Result<Page> {
        self.record(Call::Scan(request.clone()))?;
        let matching = self.with_table_mut(&request.table_name, |table| table.items.clone())?;
        Ok(self.page(matching, request.exclusive_start_key.as_ref(), |item| {
            request.scan_filter.iter().flatten().all(|(attribute, condition)| {
                let operands: Vec<&types::AttributeValue> =
                    condition.attribute_value_list().iter().collect();
                holds(
                    item.get(attribute),
                    scan_operator(condition.comparison_operator()),
                    &operands,
                )
            })
        }))
    }

    async fn get_item(&self, request: &GetRequest) -> Result<Option<Item>> {
        self.record(Call::Get(request.clone()))?;
        self.with_table_mut(&request.table_name, |table| {
            table
                .position(&request.key)
                .map(|position| table.items[position].clone())
        })
    }

    async fn put_item(&self, request: &PutRequest) -> Result<()> {
        self.record(Call::Put(request.clone()))?;
        self.with_table_mut(&request.table_name, |table| {
            match table.position(&request.item) {
                Some(position) => table.items[position] = request.item.clone(),
                None => table.items.push(request.item.clone()),
            }
        })
    }

    async fn delete_item(&self, request: &DeleteRequest) -> Result<Option<Item>> {
        self.record(Call::Delete(request.clone()))?;
        self.with_table_mut(&request.table_name, |table| {
            table
                .position(&request.key)
                .map(|position| table.items.remove(position))
        })
    }

    async fn update_item(&self, request: &UpdateRequest) -> Result<Option<Item>> {
        self.record(Call::Update(request.clone()))?;
        self.with_table_mut(&request.table_name, |table| {
            let position = match table.position(&request.key) {
                Some(position) => position,
                None => {
                    table.items.push(request.key.clone());
                    table.items.len() - 1
                }
            };
            let item = &mut table.items[position];
            for (attribute, update) in &request.attribute_updates {
                if let Some(value) = update.value() {
                    item.insert(attribute.clone(), value.clone());
                }
            }
            Some(item.clone())
        })
    }
}
