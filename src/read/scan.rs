use crate::{Result, common::Item, read::plan::QueryPlan};

use aws_sdk_dynamodb::types;
use std::collections;

/// Scan request built from a plan that no key serves.
///
/// Conditions travel as a legacy scan filter, one entry per attribute, all of
/// which must hold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanRequest {
    /// Table to scan.
    pub table_name: String,
    /// Per-attribute conditions.
    pub scan_filter: Option<collections::HashMap<String, types::Condition>>,
    /// Continuation token of the previous page.
    pub exclusive_start_key: Option<Item>,
}

impl ScanRequest {
    /// Build the first-page request of a scan plan.
    pub fn from_plan(table_name: &str, plan: QueryPlan) -> Result<Self> {
        let scan_filter = if plan.filter_clauses.is_empty() {
            None
        } else {
            let mut scan_filter = collections::HashMap::with_capacity(plan.filter_clauses.len());
            for clause in plan.filter_clauses {
                let condition = clause.condition.scan_condition()?;
                scan_filter.insert(clause.attribute, condition);
            }
            Some(scan_filter)
        };
        Ok(Self {
            table_name: table_name.to_string(),
            scan_filter,
            exclusive_start_key: None,
        })
    }
}
