use crate::{
    Result,
    common::Item,
    read::{plan::QueryPlan, query::QueryRequest, scan::ScanRequest},
    transport::Transport,
};

/// One round trip worth of records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    /// Records of this page.
    pub items: Vec<Item>,
    /// Continuation token; `None` on the last page.
    pub last_evaluated_key: Option<Item>,
}

/// The read operation chosen for a plan.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadRequest {
    /// Indexed query on the table or a secondary index.
    Query(QueryRequest),
    /// Full table scan.
    Scan(ScanRequest),
}

impl ReadRequest {
    /// Build the request a plan calls for.
    pub fn new(table_name: &str, plan: QueryPlan) -> Result<Self> {
        if plan.uses_index {
            Ok(Self::Query(QueryRequest::from_plan(table_name, plan)))
        } else {
            Ok(Self::Scan(ScanRequest::from_plan(table_name, plan)?))
        }
    }

    /// Whether the request is an indexed query.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Continue from the given key on the next round trip.
    pub fn set_exclusive_start_key(&mut self, exclusive_start_key: Option<Item>) {
        match self {
            Self::Query(query) => query.exclusive_start_key = exclusive_start_key,
            Self::Scan(scan) => scan.exclusive_start_key = exclusive_start_key,
        }
    }
}

/// Run `request` until the store returns no continuation token.
///
/// Pages are fetched one after the other. The first failing page aborts the whole
/// read and its error is returned as is; records from earlier pages are dropped.
pub async fn paginate<C: Transport>(client: &C, mut request: ReadRequest) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    loop {
        let page = match &request {
            ReadRequest::Query(query) => client.query(query).await?,
            ReadRequest::Scan(scan) => client.scan(scan).await?,
        };
        items.extend(page.items);
        match page.last_evaluated_key {
            Some(last_evaluated_key) => {
                debug!(fetched = items.len(), "LastEvaluatedKey found, refetching");
                request.set_exclusive_start_key(Some(last_evaluated_key));
            }
            None => break,
        }
    }
    Ok(items)
}
