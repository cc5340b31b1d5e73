use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use folio_core::{RegionId, RemoteError};
use folio_store::Row;
use tracing::debug;

struct Entry {
    rows: Vec<Row>,
    stale: bool,
}

/// Client-side cache of fetched rows, keyed by region.
///
/// Invalidation only flags a region; the rows stay until the next read
/// re-fetches them. Two concurrent reads of a stale region both fetch.
#[derive(Default)]
pub struct QueryCache {
    regions: Mutex<HashMap<RegionId, Entry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached rows when fresh, otherwise the result of `fetch`, which is then cached.
    /// Failed fetches leave the cache untouched.
    pub async fn get_or_fetch<F, Fut>(&self, region: &RegionId, fetch: F) -> Result<Vec<Row>, RemoteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Row>, RemoteError>>,
    {
        if let Some(rows) = self.fresh(region) {
            debug!(region = %region, "cache hit");
            return Ok(rows);
        }
        debug!(region = %region, "cache miss");
        let rows = fetch().await?;
        self.insert(region.clone(), rows.clone());
        Ok(rows)
    }

    pub fn fresh(&self, region: &RegionId) -> Option<Vec<Row>> {
        self.lock().get(region).filter(|e| !e.stale).map(|e| e.rows.clone())
    }

    pub fn insert(&self, region: RegionId, rows: Vec<Row>) {
        self.lock().insert(region, Entry { rows, stale: false });
    }

    /// Best-effort; unknown regions are ignored.
    pub fn invalidate(&self, region: &RegionId) {
        if let Some(entry) = self.lock().get_mut(region) {
            entry.stale = true;
            debug!(region = %region, "region invalidated");
        }
    }

    pub fn is_stale(&self, region: &RegionId) -> bool {
        self.lock().get(region).is_some_and(|e| e.stale)
    }

    pub fn contains(&self, region: &RegionId) -> bool {
        self.lock().contains_key(region)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RegionId, Entry>> {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::row;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn bite_rows(likes: u64) -> Vec<Row> {
        vec![row([("id", json!("42")), ("likes", json!(likes))])]
    }

    #[tokio::test]
    async fn fresh_region_is_not_refetched() {
        let cache = QueryCache::new();
        let region = RegionId::new("quick-bites", 42);
        let fetches = AtomicU32::new(0);

        for _ in 0..3 {
            let rows = cache
                .get_or_fetch(&region, || async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, RemoteError>(bite_rows(10))
                })
                .await
                .unwrap();
            assert_eq!(rows[0]["likes"], json!(10));
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_region_is_refetched() {
        let cache = QueryCache::new();
        let region = RegionId::new("quick-bites", 42);
        cache.insert(region.clone(), bite_rows(10));
        cache.invalidate(&region);
        assert!(cache.is_stale(&region));

        let rows = cache.get_or_fetch(&region, || async { Ok::<_, RemoteError>(bite_rows(11)) }).await.unwrap();
        assert_eq!(rows[0]["likes"], json!(11));
        assert!(!cache.is_stale(&region));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_rows() {
        let cache = QueryCache::new();
        let region = RegionId::new("quick-bites", 42);
        cache.insert(region.clone(), bite_rows(10));
        cache.invalidate(&region);

        let err = cache.get_or_fetch(&region, || async { Err::<Vec<Row>, _>(RemoteError::network("offline")) }).await;
        assert!(err.is_err());
        assert!(cache.is_stale(&region));
        assert!(cache.contains(&region));
    }

    #[test]
    fn invalidating_unknown_region_is_a_no_op() {
        let cache = QueryCache::new();
        let region = RegionId::named("nope");
        cache.invalidate(&region);
        assert!(!cache.contains(&region));
        assert!(!cache.is_stale(&region));
    }
}
