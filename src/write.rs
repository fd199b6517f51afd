//! Write operations for modifying data in DynamoDB tables.
//!
//! This module provides the write path of the connector:
//! - Key validation, UUID generation and composite ids for new records
//! - Putting new records or replacing existing ones
//! - Updating attributes of a record
//! - Deleting records by primary key

/// Key checks and key resolution shared by the write requests.
pub(crate) mod common;

/// Delete request for removing a record.
pub mod delete_item;

/// Put request for creating or replacing a record.
pub mod put_item;

/// Update request for overwriting attributes of a record.
pub mod update_item;
