#![warn(missing_docs)]

//! # DynamoDB Connector
//!
//! An ORM-style connector that translates generic filters into Amazon DynamoDB requests.
//!
//! ## Overview
//!
//! Callers describe what they want with a loopback-style filter:
//! - `where` conditions (`key: value`, `key: {op: value}`, `key: [values]`)
//! - `order` (`"field"`, `"field DESC"` or a list of those)
//! - `limit` and `skip`/`offset`
//!
//! The connector decides per request whether the filter can be served by an indexed
//! `Query` (equality on a hash key, optionally a condition on the matching range key)
//! or needs a full `Scan`, builds the condition expressions and placeholders, follows
//! continuation tokens until the result set is complete, then sorts and slices it in memory.
//!
//! ## Quick Example
//!
//! ```no_run
//! use aws_sdk_dynamodb::Client;
//! use dynamodb_connector::{adapter::Adapter, common::filter::Filter, model::ModelDefinition};
//! use serde_json::{Value, json};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let client = Client::from_conf(aws_sdk_dynamodb::config::Config::builder().build());
//! let mut adapter = Adapter::new(client);
//! adapter.define(serde_json::from_value::<ModelDefinition>(json!({
//!     "name": "Song",
//!     "properties": {
//!         "id": {"type": "string", "keyType": "pk", "separator": "--oo--"},
//!         "singer": {"type": "string", "keyType": "hash"},
//!         "title": {"type": "string", "keyType": "range"},
//!     },
//! }))?)?;
//! // Equality on the hash key plus a range condition: served by a Query.
//! let filter = Filter::from_value(json!({
//!     "where": {"singer": "Foo Fighters", "title": {"gte": "M"}},
//!     "order": "title DESC",
//!     "limit": 10,
//! }))?;
//! let songs: Vec<Value> = adapter.all("Song", &filter).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@common`] - Records, keys, conditions, filters and placeholder naming
//! - [`mod@read`] - Query planning, request building, pagination and post-processing
//! - [`mod@write`] - Put, update and delete requests with key validation
//! - [`mod@model`] - Schema definitions and the per-adapter model registry
//! - [`mod@transport`] - The store seam and its `aws_sdk_dynamodb::Client` implementation
//! - [`mod@adapter`] - The ORM-facing operations (`all`, `find`, `create`, ...)

macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
    };
}

/// ORM-facing operations over a transport.
pub mod adapter;

/// Common types for records, keys, conditions and filters.
pub mod common;

/// Crate error type.
pub mod error;

/// Model definitions and the model registry.
pub mod model;

/// Read path: planning, requests, pagination and post-processing.
///
/// This module provides:
/// - The query planner choosing between an indexed query and a scan
/// - Query, scan and get requests
/// - The pagination driver following continuation tokens
/// - In-memory ordering and offset/limit slicing
pub mod read;

/// The store transport seam.
pub mod transport;

/// Write path: put, update and delete requests.
///
/// This module provides:
/// - Key validation and composite id synthesis for new records
/// - Put, update and delete requests
pub mod write;

pub use error::{Error, Result};
