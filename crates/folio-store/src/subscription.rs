use folio_core::{ChangeKind, SubscriptionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

use crate::Row;

/// A single insert/update/delete observed on a remote table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
    pub old: Option<Row>,
    pub new: Option<Row>,
}

impl ChangeEvent {
    /// The row as it is after the change, or as it was before a delete.
    pub fn row(&self) -> Option<&Row> {
        self.new.as_ref().or(self.old.as_ref())
    }
}

/// Which events a subscription wants to see.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionFilter {
    pub table: String,
    /// `None` means every kind.
    pub kinds: Option<Vec<ChangeKind>>,
    pub column_eq: Option<(String, Value)>,
}

impl SubscriptionFilter {
    pub fn table(table: impl Into<String>) -> Self {
        Self { table: table.into(), kinds: None, column_eq: None }
    }

    pub fn kinds(mut self, kinds: &[ChangeKind]) -> Self {
        self.kinds = Some(kinds.to_vec());
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.column_eq = Some((column.into(), value.into()));
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table {
            return false;
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }
        match &self.column_eq {
            None => true,
            Some((col, val)) => event.row().and_then(|r| r.get(col)) == Some(val),
        }
    }
}

/// Handle on a live change feed.
///
/// Events are pulled lazily with [`Subscription::next`]. Nothing is delivered
/// after [`Subscription::unsubscribe`]; dropping the handle has the same effect.
pub struct Subscription {
    id: SubscriptionId,
    filter: SubscriptionFilter,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn new(filter: SubscriptionFilter, rx: broadcast::Receiver<ChangeEvent>) -> Self {
        let id = SubscriptionId::new();
        debug!(subscription = %id, table = %filter.table, "subscribed");
        Self { id, filter, rx }
    }

    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub fn filter(&self) -> &SubscriptionFilter {
        &self.filter
    }

    /// Wait for the next matching event. `None` once the feed is closed.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(ev) if self.filter.matches(&ev) => return Some(ev),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(subscription = %self.id, skipped, "subscriber lagged; events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event that is already buffered, without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(ev) if self.filter.matches(&ev) => return Some(ev),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(subscription = %self.id, skipped, "subscriber lagged; events dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drop anything buffered and continue from the live tail of the feed.
    pub fn restart(&mut self) {
        self.rx = self.rx.resubscribe();
        debug!(subscription = %self.id, "subscription restarted");
    }

    pub fn unsubscribe(self) {
        debug!(subscription = %self.id, table = %self.filter.table, "unsubscribed");
    }
}
