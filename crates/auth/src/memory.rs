//! In-memory key store holding a fixed key set.

use agent_types::{KeyStore, SigningKey, traits::Result};
use async_trait::async_trait;

/// A [`KeyStore`] that always answers with the same keys.
///
/// Used for tests and for running against a pinned key set offline.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyStore {
    keys: Vec<SigningKey>,
}

impl StaticKeyStore {
    /// Creates a store publishing `keys`.
    #[must_use]
    pub fn new(keys: Vec<SigningKey>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl KeyStore for StaticKeyStore {
    async fn fetch_keys(&self) -> Result<Vec<SigningKey>> {
        Ok(self.keys.clone())
    }
}
