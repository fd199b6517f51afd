use crate::{
    Error, Result,
    common::Item,
    read::{common::Page, get_item::GetRequest, query::QueryRequest, scan::ScanRequest},
    write::{delete_item::DeleteRequest, put_item::PutRequest, update_item::UpdateRequest},
};

use aws_sdk_dynamodb::{Client, types};
use std::{collections, future::Future};

/// The store operations the connector relies on.
///
/// Every call is one network round trip. Implementations must be safe to share
/// between concurrent operations; the connector adds no locking of its own.
pub trait Transport: Send + Sync {
    /// Run one page of an indexed query.
    fn query(&self, request: &QueryRequest) -> impl Future<Output = Result<Page>> + Send;

    /// Run one page of a scan.
    fn scan(&self, request: &ScanRequest) -> impl Future<Output = Result<Page>> + Send;

    /// Fetch one record by table key.
    fn get_item(&self, request: &GetRequest) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Create or replace one record.
    fn put_item(&self, request: &PutRequest) -> impl Future<Output = Result<()>> + Send;

    /// Remove one record, returning it if it existed.
    fn delete_item(&self, request: &DeleteRequest) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Update attributes of one record, returning the updated record.
    fn update_item(&self, request: &UpdateRequest) -> impl Future<Output = Result<Option<Item>>> + Send;
}

fn non_empty<K, V>(map: &collections::HashMap<K, V>) -> Option<collections::HashMap<K, V>>
where
    K: Clone,
    V: Clone,
{
    Some(map.clone()).filter(|map| !map.is_empty())
}

impl Transport for Client {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.query", skip_all, fields(table = %request.table_name, index = ?request.index_name), err)
    )]
    async fn query(&self, request: &QueryRequest) -> Result<Page> {
        let output = self
            .query()
            .table_name(&request.table_name)
            .set_index_name(request.index_name.clone())
            .key_condition_expression(&request.key_condition_expression)
            .set_filter_expression(request.filter_expression.clone())
            .set_expression_attribute_names(non_empty(&request.expression_attribute_names))
            .set_expression_attribute_values(non_empty(&request.expression_attribute_values))
            .set_exclusive_start_key(request.exclusive_start_key.clone())
            .return_consumed_capacity(types::ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)
            .map_err(Error::transport)?;
        Ok(Page {
            items: output.items.unwrap_or_default(),
            last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.scan", skip_all, fields(table = %request.table_name), err)
    )]
    async fn scan(&self, request: &ScanRequest) -> Result<Page> {
        let output = self
            .scan()
            .table_name(&request.table_name)
            .set_scan_filter(request.scan_filter.clone())
            .set_exclusive_start_key(request.exclusive_start_key.clone())
            .return_consumed_capacity(types::ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)
            .map_err(Error::transport)?;
        Ok(Page {
            items: output.items.unwrap_or_default(),
            last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.get_item", skip_all, fields(table = %request.table_name), err)
    )]
    async fn get_item(&self, request: &GetRequest) -> Result<Option<Item>> {
        let output = self
            .get_item()
            .table_name(&request.table_name)
            .set_key(Some(request.key.clone()))
            .return_consumed_capacity(types::ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)
            .map_err(Error::transport)?;
        Ok(output.item.filter(|item| !item.is_empty()))
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.put_item", skip_all, fields(table = %request.table_name), err)
    )]
    async fn put_item(&self, request: &PutRequest) -> Result<()> {
        self.put_item()
            .table_name(&request.table_name)
            .set_item(Some(request.item.clone()))
            .return_consumed_capacity(types::ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)
            .map_err(Error::transport)?;
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.delete_item", skip_all, fields(table = %request.table_name), err)
    )]
    async fn delete_item(&self, request: &DeleteRequest) -> Result<Option<Item>> {
        let output = self
            .delete_item()
            .table_name(&request.table_name)
            .set_key(Some(request.key.clone()))
            .return_values(request.return_values.clone())
            .return_consumed_capacity(types::ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)
            .map_err(Error::transport)?;
        Ok(output.attributes.filter(|attributes| !attributes.is_empty()))
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.update_item", skip_all, fields(table = %request.table_name), err)
    )]
    async fn update_item(&self, request: &UpdateRequest) -> Result<Option<Item>> {
        let output = self
            .update_item()
            .table_name(&request.table_name)
            .set_key(Some(request.key.clone()))
            .set_attribute_updates(non_empty(&request.attribute_updates))
            .return_values(request.return_values.clone())
            .return_consumed_capacity(types::ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)
            .map_err(Error::transport)?;
        Ok(output.attributes.filter(|attributes| !attributes.is_empty()))
    }
}
