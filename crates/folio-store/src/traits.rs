use async_trait::async_trait;
use folio_core::RemoteError;

use crate::{Query, Row, Subscription, SubscriptionFilter};

pub type StoreResult<T> = Result<T, RemoteError>;

/// The backend-as-a-service seen from the client: row CRUD plus a change feed.
///
/// Implementations serialize their own writes; callers assume nothing about
/// isolation beyond a single call.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Row>>;

    /// First matching row, if any.
    async fn select_one(&self, query: &Query) -> StoreResult<Option<Row>>;

    async fn count(&self, query: &Query) -> StoreResult<u64>;

    /// Insert a row, assigning `id` when absent. Returns the stored row.
    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row>;

    /// Merge `patch` into every matching row. Returns the updated rows.
    async fn update(&self, query: &Query, patch: Row) -> StoreResult<Vec<Row>>;

    /// Returns the deleted rows.
    async fn delete(&self, query: &Query) -> StoreResult<Vec<Row>>;

    fn subscribe(&self, filter: SubscriptionFilter) -> Subscription;
}
