//! Trust anchor access: fetching the published key set and picking a key.

use agent_types::{AgentError, KeyListing, KeyStore, SigningKey, traits::Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Why [`lookup`] could not produce a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No record carries the identifier.
    NotFound,
    /// More than one record carries the identifier.
    Ambiguous(usize),
}

/// Finds the single record whose identifier equals `identifier` exactly.
///
/// # Errors
///
/// [`LookupError::NotFound`] when nothing matches, [`LookupError::Ambiguous`]
/// when the identifier is published more than once.
pub fn lookup<'a>(
    keys: &'a [SigningKey],
    identifier: &str,
) -> std::result::Result<&'a SigningKey, LookupError> {
    let mut matches = keys.iter().filter(|k| k.identifier == identifier);
    let first = matches.next().ok_or(LookupError::NotFound)?;
    match matches.count() {
        0 => Ok(first),
        extra => Err(LookupError::Ambiguous(extra + 1)),
    }
}

/// Fetches the key listing over HTTP on every call.
pub struct RemoteKeyStore {
    http: Client,
    url: String,
    user_agent: String,
    timeout: Duration,
}

impl RemoteKeyStore {
    /// Creates a store reading `url` with the given client.
    pub fn new(
        http: Client,
        url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            user_agent: user_agent.into(),
            timeout,
        }
    }

    /// The listing endpoint this store reads.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeyStore for RemoteKeyStore {
    async fn fetch_keys(&self) -> Result<Vec<SigningKey>> {
        let resp = self
            .http
            .get(&self.url)
            .header("user-agent", &self.user_agent)
            .header("accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AgentError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let bytes = resp.bytes().await?;
        let listing: KeyListing = serde_json::from_slice(&bytes)
            .map_err(|e| AgentError::KeyFetch(format!("malformed key listing: {e}")))?;

        tracing::debug!(
            url = %self.url,
            count = listing.public_keys.len(),
            "fetched signing keys"
        );
        Ok(listing.public_keys)
    }
}
