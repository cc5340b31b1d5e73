use std::future::Future;

use folio_core::{RegionId, RemoteError, RetryPolicy};
use folio_store::{Query, RemoteStore, Row};
use tracing::warn;

use crate::QueryCache;

/// Run `op` until it succeeds or `policy` runs out of attempts.
///
/// Every error is retried; the last one is returned.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let mut attempt = 1;
    loop {
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if policy.allows(attempt + 1) => {
                warn!(what, attempt, error = %err, "remote read failed; retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Rows for a list page. A failed load renders as an empty list; the error is
/// kept so the page can say why.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListLoad {
    pub rows: Vec<Row>,
    pub error: Option<RemoteError>,
}

impl ListLoad {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub async fn load_list(store: &dyn RemoteStore, query: &Query, policy: &RetryPolicy) -> ListLoad {
    match with_retry(policy, &query.table, || store.select(query)).await {
        Ok(rows) => ListLoad { rows, error: None },
        Err(err) => {
            warn!(table = %query.table, error = %err, "list load failed; showing empty list");
            ListLoad { rows: vec![], error: Some(err) }
        }
    }
}

/// Like [`load_list`], served from `cache` while `region` is fresh.
pub async fn load_list_cached(
    cache: &QueryCache,
    region: &RegionId,
    store: &dyn RemoteStore,
    query: &Query,
    policy: &RetryPolicy,
) -> ListLoad {
    let fetched = cache.get_or_fetch(region, || with_retry(policy, &query.table, || store.select(query))).await;
    match fetched {
        Ok(rows) => ListLoad { rows, error: None },
        Err(err) => {
            warn!(region = %region, error = %err, "list load failed; showing empty list");
            ListLoad { rows: vec![], error: Some(err) }
        }
    }
}
