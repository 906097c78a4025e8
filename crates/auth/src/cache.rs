//! Time-bounded reuse of a fetched key set.
//!
//! The cached set is published through an [`ArcSwapOption`], so concurrent
//! requests either see the previous complete set or the new complete set.

use agent_types::{KeyStore, SigningKey, traits::Result};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

struct CachedKeys {
    keys: Vec<SigningKey>,
    fetched_at: Instant,
}

/// Wraps another [`KeyStore`] and reuses its last successful answer for `ttl`.
///
/// Failed fetches are never cached: the next request tries the inner store
/// again.
pub struct CachedKeyStore<K> {
    inner: K,
    ttl: Duration,
    current: ArcSwapOption<CachedKeys>,
}

impl<K: KeyStore> CachedKeyStore<K> {
    /// Creates an empty cache in front of `inner`.
    pub fn new(inner: K, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            current: ArcSwapOption::empty(),
        }
    }

    fn fresh(&self) -> Option<Vec<SigningKey>> {
        let guard = self.current.load();
        guard
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| c.keys.clone())
    }
}

#[async_trait]
impl<K: KeyStore> KeyStore for CachedKeyStore<K> {
    async fn fetch_keys(&self) -> Result<Vec<SigningKey>> {
        if let Some(keys) = self.fresh() {
            return Ok(keys);
        }

        let keys = self.inner.fetch_keys().await?;
        self.current.store(Some(Arc::new(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        })));
        tracing::debug!(count = keys.len(), ttl = ?self.ttl, "refreshed cached signing keys");
        Ok(keys)
    }
}
