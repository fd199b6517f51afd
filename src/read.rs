//! Read operations for retrieving data from DynamoDB tables.
//!
//! This module provides the read path of the connector:
//! - Planning a filter into an indexed query or a full scan
//! - Query, scan and get requests
//! - Following continuation tokens until a result set is complete
//! - Sorting and slicing the result set in memory

/// Request kinds, pages and the pagination driver.
pub mod common;

/// Get request for a single record by table key.
pub mod get_item;

/// Query planning from filters and key models.
pub mod plan;

/// In-memory ordering, offset and limit.
pub mod post_process;

/// Query request for indexed reads.
pub mod query;

/// Scan request for full-table reads.
pub mod scan;
