use crate::{
    Result,
    common::{Item, filter::Filter},
    model::{Model, ModelDefinition, Registry},
    read::{
        self,
        common::ReadRequest,
        get_item::GetRequest,
        post_process::{self, ProcessOptions},
    },
    transport::Transport,
    write::{self, delete_item::DeleteRequest, put_item::PutRequest, update_item::UpdateRequest},
};

use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_dynamo::{from_attribute_value, from_item, from_items, to_item};
use serde_json::Value;

/// Relation expansion invoked with the final records and the filter's `include` value.
pub type IncludeHook = Box<dyn Fn(Vec<Item>, &Value) -> Result<Vec<Item>> + Send + Sync>;

/// ORM-facing operations over one store connection.
///
/// Every operation resolves the model by name in the adapter's own registry, so two
/// adapters never see each other's models.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_connector::{adapter::Adapter, model::ModelDefinition};
/// use serde_json::{Value, json};
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let mut adapter = Adapter::new(client);
/// adapter.define(serde_json::from_value::<ModelDefinition>(json!({
///     "name": "User",
///     "properties": {"id": {"type": "string", "keyType": "hash"}},
/// }))?)?;
/// adapter.create("User", &json!({"id": "1", "name": "John Lennon"})).await?;
/// let user: Option<Value> = adapter.find("User", &json!("1")).await?;
/// # Ok(())
/// # }
/// ```
pub struct Adapter<C> {
    client: C,
    registry: Registry,
    include_hook: Option<IncludeHook>,
}

impl<C: Transport> Adapter<C> {
    /// Adapter with no models defined.
    pub fn new(client: C) -> Self {
        Self {
            client,
            registry: Registry::default(),
            include_hook: None,
        }
    }

    /// Expand `include` relations with `hook`.
    pub fn with_include_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<Item>, &Value) -> Result<Vec<Item>> + Send + Sync + 'static,
    {
        self.include_hook = Some(Box::new(hook));
        self
    }

    /// The underlying transport.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The models defined so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Validate and register a model.
    pub fn define(&mut self, definition: ModelDefinition) -> Result<&Model> {
        self.registry.define(definition)
    }

    /// Table backing `model`.
    pub fn table_name(&self, model: &str) -> Result<&str> {
        Ok(&self.registry.get(model)?.table_name)
    }

    /// Records matching `filter`, ordered and sliced, as stored.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.all", skip(self, filter), err)
    )]
    pub async fn all_items(&self, model: &str, filter: &Filter) -> Result<Vec<Item>> {
        let model = self.registry.get(model)?;
        let plan = read::plan::plan(&model.keys, filter)?;
        let request = ReadRequest::new(&model.table_name, plan)?;
        let items = read::common::paginate(&self.client, request).await?;
        let options = ProcessOptions::from_filter(filter, model.keys.default_order_field());
        let items = post_process::process(items, &options);
        match (&filter.include, &self.include_hook) {
            (Some(include), Some(hook)) => {
                debug!(?include, "expanding includes");
                hook(items, include)
            }
            _ => Ok(items),
        }
    }

    /// Records matching `filter`, ordered and sliced.
    pub async fn all<T: DeserializeOwned>(&self, model: &str, filter: &Filter) -> Result<Vec<T>> {
        let items = self.all_items(model, filter).await?;
        Ok(from_items(items)?)
    }

    /// Record with primary key `pk`.
    ///
    /// `pk` is the hash value, or `"<hash><separator><range>"` on composite models.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.find", skip(self), err)
    )]
    pub async fn find<T: DeserializeOwned>(&self, model: &str, pk: &Value) -> Result<Option<T>> {
        let model = self.registry.get(model)?;
        let key = write::common::table_key(model, pk)?;
        let item = self
            .client
            .get_item(&GetRequest::new(&model.table_name, key))
            .await?;
        Ok(item.map(from_item).transpose()?)
    }

    /// Whether a record with primary key `pk` exists.
    pub async fn exists(&self, model: &str, pk: &Value) -> Result<bool> {
        Ok(self.find::<Value>(model, pk).await?.is_some())
    }

    /// Number of records matching `where_clause`.
    pub async fn count(&self, model: &str, where_clause: Option<IndexMap<String, Value>>) -> Result<usize> {
        let filter = Filter {
            where_clause,
            ..Default::default()
        };
        Ok(self.all_items(model, &filter).await?.len())
    }

    /// Store a new record and return its id.
    ///
    /// The id is the composite id on composite models and the hash value otherwise.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.create", skip(self, data), err)
    )]
    pub async fn create<T: Serialize>(&self, model: &str, data: &T) -> Result<Value> {
        let model = self.registry.get(model)?;
        let mut item: Item = to_item(data)?;
        let id = write::common::prepare_item(model, &mut item)?;
        self.client
            .put_item(&PutRequest::new(&model.table_name, item))
            .await?;
        Ok(from_attribute_value(id)?)
    }

    /// Create or replace a record and return it as stored.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.save", skip(self, data), err)
    )]
    pub async fn save<T: Serialize + DeserializeOwned>(&self, model: &str, data: &T) -> Result<T> {
        let model = self.registry.get(model)?;
        let mut item: Item = to_item(data)?;
        write::common::prepare_item(model, &mut item)?;
        self.client
            .put_item(&PutRequest::new(&model.table_name, item.clone()))
            .await?;
        Ok(from_item(item)?)
    }

    /// Overwrite the non-key attributes of `data` on the record with primary key `pk`.
    ///
    /// Returns the updated record.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.update_attributes", skip(self, data), err)
    )]
    pub async fn update_attributes<T: DeserializeOwned>(
        &self,
        model: &str,
        pk: &Value,
        data: &impl Serialize,
    ) -> Result<Option<T>> {
        let model = self.registry.get(model)?;
        let key = write::common::table_key(model, pk)?;
        let data: Item = to_item(data)?;
        let item = self
            .client
            .update_item(&UpdateRequest::new(model, key, data))
            .await?;
        Ok(item.map(from_item).transpose()?)
    }

    /// Remove the record with primary key `pk`, returning it if it existed.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.destroy", skip(self), err)
    )]
    pub async fn destroy<T: DeserializeOwned>(&self, model: &str, pk: &Value) -> Result<Option<T>> {
        let model = self.registry.get(model)?;
        let key = write::common::table_key(model, pk)?;
        let item = self
            .client
            .delete_item(&DeleteRequest::new(&model.table_name, key))
            .await?;
        Ok(item.map(from_item).transpose()?)
    }

    /// Remove every record matching `where_clause` and return how many were removed.
    ///
    /// Records are read to completion first, then deleted one at a time by table key.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_connector.destroy_all", skip(self), err)
    )]
    pub async fn destroy_all(&self, model: &str, where_clause: Option<IndexMap<String, Value>>) -> Result<usize> {
        let model = self.registry.get(model)?;
        let filter = Filter {
            where_clause,
            ..Default::default()
        };
        let plan = read::plan::plan(&model.keys, &filter)?;
        let request = ReadRequest::new(&model.table_name, plan)?;
        let items = read::common::paginate(&self.client, request).await?;
        for item in &items {
            let key = write::common::item_key(model, item)?;
            self.client
                .delete_item(&DeleteRequest::new(&model.table_name, key))
                .await?;
        }
        debug!(table = %model.table_name, count = items.len(), "destroyed records");
        Ok(items.len())
    }
}
