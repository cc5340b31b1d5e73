use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use folio_core::{ChangeKind, RemoteError, RowId};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::traits::{RemoteStore, StoreResult};
use crate::{ChangeEvent, Query, Row, Subscription, SubscriptionFilter};

const FEED_CAPACITY: usize = 256;

/// In-memory remote store for tests and the demo CLI.
///
/// Not durable. Supports per-table unique keys, artificial latency and
/// injected failures so rollback paths can be exercised.
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    feed: broadcast::Sender<ChangeEvent>,
    latency: Option<Duration>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Row>>,
    unique: HashMap<String, Vec<Vec<String>>>,
    faults: VecDeque<RemoteError>,
    calls: u64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self { inner: Mutex::new(Inner::default()), feed, latency: None }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `latency` before touching data.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency).filter(|d| !d.is_zero());
        self
    }

    /// Reject inserts that repeat the values of `columns` in `table`.
    pub fn with_unique(self, table: &str, columns: &[&str]) -> Self {
        self.lock()
            .unique
            .entry(table.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// The next call fails with `error` instead of running.
    pub fn fail_next(&self, error: RemoteError) {
        self.fail_next_n(1, error);
    }

    pub fn fail_next_n(&self, n: usize, error: RemoteError) {
        let mut inner = self.lock();
        for _ in 0..n {
            inner.faults.push_back(error.clone());
        }
    }

    /// Number of store calls made so far, failed ones included.
    pub fn call_count(&self) -> u64 {
        self.lock().calls
    }

    /// Rows currently stored in `table`, bypassing latency and faults.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, op: &str, table: &str) -> StoreResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut inner = self.lock();
        inner.calls += 1;
        if let Some(err) = inner.faults.pop_front() {
            debug!(op, table, error = %err, "injected failure");
            return Err(err);
        }
        Ok(())
    }

    fn publish(&self, kind: ChangeKind, table: &str, old: Option<Row>, new: Option<Row>) {
        // No subscribers is not an error.
        let _ = self.feed.send(ChangeEvent { kind, table: table.to_string(), old, new });
    }
}

fn violates(existing: &[Row], candidate: &Row, columns: &[String]) -> bool {
    existing.iter().any(|r| columns.iter().all(|c| r.get(c).is_some() && r.get(c) == candidate.get(c)))
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Row>> {
        self.enter("select", &query.table).await?;
        let inner = self.lock();
        Ok(inner.tables.get(&query.table).map(|rows| query.run(rows)).unwrap_or_default())
    }

    async fn select_one(&self, query: &Query) -> StoreResult<Option<Row>> {
        let mut rows = self.select(&query.clone().limit(1)).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn count(&self, query: &Query) -> StoreResult<u64> {
        self.enter("count", &query.table).await?;
        let inner = self.lock();
        let n = inner.tables.get(&query.table).map(|rows| rows.iter().filter(|r| query.matches(r)).count());
        Ok(n.unwrap_or(0) as u64)
    }

    async fn insert(&self, table: &str, mut row: Row) -> StoreResult<Row> {
        self.enter("insert", table).await?;
        if !row.contains_key("id") {
            row.insert("id".to_string(), Value::String(RowId::new().0));
        }
        {
            let mut inner = self.lock();
            let keys = inner.unique.get(table).cloned().unwrap_or_default();
            let existing: &[Row] = inner.tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
            if violates(existing, &row, &["id".to_string()]) {
                return Err(RemoteError::constraint(format!("duplicate id in {table}")));
            }
            if let Some(cols) = keys.iter().find(|cols| violates(existing, &row, cols)) {
                return Err(RemoteError::constraint(format!(
                    "duplicate key value violates unique constraint on {table}({})",
                    cols.join(", ")
                )));
            }
            inner.tables.entry(table.to_string()).or_default().push(row.clone());
        }
        self.publish(ChangeKind::Insert, table, None, Some(row.clone()));
        Ok(row)
    }

    async fn update(&self, query: &Query, patch: Row) -> StoreResult<Vec<Row>> {
        self.enter("update", &query.table).await?;
        let mut changed = vec![];
        {
            let mut inner = self.lock();
            if let Some(rows) = inner.tables.get_mut(&query.table) {
                for r in rows.iter_mut().filter(|r| query.matches(r)) {
                    let old = r.clone();
                    for (k, v) in &patch {
                        r.insert(k.clone(), v.clone());
                    }
                    changed.push((old, r.clone()));
                }
            }
        }
        for (old, new) in &changed {
            self.publish(ChangeKind::Update, &query.table, Some(old.clone()), Some(new.clone()));
        }
        Ok(changed.into_iter().map(|(_, new)| new).collect())
    }

    async fn delete(&self, query: &Query) -> StoreResult<Vec<Row>> {
        self.enter("delete", &query.table).await?;
        let removed = {
            let mut inner = self.lock();
            match inner.tables.get_mut(&query.table) {
                Some(rows) => {
                    let (gone, kept): (Vec<Row>, Vec<Row>) = rows.drain(..).partition(|r| query.matches(r));
                    *rows = kept;
                    gone
                }
                None => vec![],
            }
        };
        for old in &removed {
            self.publish(ChangeKind::Delete, &query.table, Some(old.clone()), None);
        }
        Ok(removed)
    }

    fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        Subscription::new(filter, self.feed.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use serde_json::json;

    fn like(user: &str, bite: &str) -> Row {
        row([("user_id", json!(user)), ("bite_id", json!(bite))])
    }

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.select(&Query::table("likes")).await.unwrap().is_empty());
        assert_eq!(store.count(&Query::table("likes")).await.unwrap(), 0);
        assert!(store.select_one(&Query::table("likes")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = InMemoryStore::new();
        let stored = store.insert("likes", like("u1", "42")).await.unwrap();
        assert!(stored["id"].is_string());
        assert_eq!(store.rows("likes").len(), 1);
    }

    #[tokio::test]
    async fn test_unique_key_rejects_duplicate() {
        let store = InMemoryStore::new().with_unique("likes", &["user_id", "bite_id"]);
        store.insert("likes", like("u1", "42")).await.unwrap();
        let err = store.insert("likes", like("u1", "42")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Constraint(_)));
        store.insert("likes", like("u2", "42")).await.unwrap();
        assert_eq!(store.count(&Query::table("likes").eq("bite_id", "42")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = InMemoryStore::new();
        store.insert("quick_bites", row([("id", json!("b1")), ("title", json!("old"))])).await.unwrap();
        let updated = store
            .update(&Query::table("quick_bites").eq("id", "b1"), row([("title", json!("new"))]))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(store.rows("quick_bites")[0]["title"], json!("new"));
    }

    #[tokio::test]
    async fn test_delete_returns_removed_rows() {
        let store = InMemoryStore::new();
        store.insert("likes", like("u1", "42")).await.unwrap();
        store.insert("likes", like("u1", "7")).await.unwrap();
        let removed = store.delete(&Query::table("likes").eq("bite_id", "42")).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(store.rows("likes").len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let store = InMemoryStore::new();
        store.fail_next(RemoteError::network("offline"));
        assert_eq!(store.insert("likes", like("u1", "1")).await.unwrap_err(), RemoteError::network("offline"));
        store.insert("likes", like("u1", "1")).await.unwrap();
        assert_eq!(store.call_count(), 2);
        assert_eq!(store.rows("likes").len(), 1);
    }

    #[tokio::test]
    async fn test_writes_are_published_to_subscribers() {
        let store = InMemoryStore::new();
        let mut sub = store.subscribe(SubscriptionFilter::table("likes").eq("bite_id", "42"));
        store.insert("likes", like("u1", "7")).await.unwrap();
        store.insert("likes", like("u1", "42")).await.unwrap();
        store.delete(&Query::table("likes").eq("bite_id", "42")).await.unwrap();

        let first = sub.next().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Insert);
        let second = sub.next().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Delete);
        assert!(second.new.is_none());
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn test_update_publishes_old_and_new_rows() {
        let store = InMemoryStore::new();
        store.insert("quick_bites", row([("id", json!("b1")), ("title", json!("old"))])).await.unwrap();
        let mut sub = store.subscribe(SubscriptionFilter::table("quick_bites").kinds(&[ChangeKind::Update]));
        store
            .update(&Query::table("quick_bites").eq("id", "b1"), row([("title", json!("new"))]))
            .await
            .unwrap();

        let ev = sub.next().await.unwrap();
        assert_eq!(ev.kind, ChangeKind::Update);
        assert_eq!(ev.old.unwrap()["title"], json!("old"));
        assert_eq!(ev.new.unwrap()["title"], json!("new"));
        assert!(sub.try_next().is_none());
    }
}
