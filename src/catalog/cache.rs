use super::{Item, SheetKind};
use super::service::CatalogError;
use crate::config;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Bounded-TTL cache over parsed feeds with per-sheet fetch coalescing.
/// Each sheet owns an async mutex: one caller fetches while concurrent
/// callers queue on the lock and then read the entry it filled. Failed
/// fetches are never cached. A zero TTL disables the cache entirely and
/// every call fetches fresh.
#[derive(Clone)]
pub struct FeedCache {
    ttl: Duration,
    slots: Arc<Mutex<HashMap<SheetKind, Arc<Mutex<Option<Entry>>>>>>,
}

struct Entry {
    items: Vec<Item>,
    fetched_at: Instant,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_env() -> Self {
        Self::new(Duration::from_secs(config::cache_ttl_secs()))
    }

    pub async fn get_or_fetch<F, Fut>(
        &self,
        kind: SheetKind,
        fetch: F,
    ) -> Result<Vec<Item>, CatalogError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Item>, CatalogError>>,
    {
        if self.ttl.is_zero() {
            return fetch().await;
        }

        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(kind).or_default().clone()
        };

        let mut entry = slot.lock().await;
        if let Some(cached) = entry.as_ref()
            && cached.fetched_at.elapsed() < self.ttl
        {
            debug!(
                target = "zahara.catalog",
                sheet = kind.label(),
                "feed_cache_hit"
            );
            return Ok(cached.items.clone());
        }

        let items = fetch().await?;
        *entry = Some(Entry {
            items: items.clone(),
            fetched_at: Instant::now(),
        });
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_item(id: u32) -> Item {
        Item {
            id,
            name: format!("item-{id}"),
            category: None,
            prices: BTreeMap::new(),
            notes: None,
            image: crate::images::resolve::PLACEHOLDER.to_string(),
            gallery: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn second_call_within_ttl_hits_the_cache() {
        let cache = FeedCache::new(Duration::from_secs(3600));
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let items = cache
                .get_or_fetch(SheetKind::Fragrance, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![sample_item(1)])
                })
                .await
                .unwrap();
            assert_eq!(items.len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sheets_are_cached_independently() {
        let cache = FeedCache::new(Duration::from_secs(3600));
        let calls = AtomicUsize::new(0);
        for kind in [SheetKind::Fragrance, SheetKind::Decant] {
            cache
                .get_or_fetch(kind, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![sample_item(1)])
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_fetches_every_time() {
        let cache = FeedCache::new(Duration::ZERO);
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            cache
                .get_or_fetch(SheetKind::Fragrance, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![sample_item(1)])
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entry_triggers_a_refetch() {
        let cache = FeedCache::new(Duration::from_millis(20));
        let calls = AtomicUsize::new(0);
        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![sample_item(1)])
        };
        cache.get_or_fetch(SheetKind::Fragrance, fetch).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.get_or_fetch(SheetKind::Fragrance, fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = FeedCache::new(Duration::from_secs(3600));
        let calls = AtomicUsize::new(0);
        let failed: Result<Vec<Item>, CatalogError> = cache
            .get_or_fetch(SheetKind::Fragrance, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CatalogError::Transport("HTTP 503".to_string()))
            })
            .await;
        assert!(failed.is_err());
        let items = cache
            .get_or_fetch(SheetKind::Fragrance, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![sample_item(2)])
            })
            .await
            .unwrap();
        assert_eq!(items[0].id, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let cache = FeedCache::new(Duration::from_secs(3600));
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(SheetKind::Fragrance, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok(vec![sample_item(1)])
                    })
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
