//! Async traits shared across all agent crates.
//!
//! Every cross-crate abstraction is defined here so that higher layers depend
//! only on `agent-types`, not on each other.

use crate::{AgentError, CompletionRequest, SigningKey};
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AgentError>;

/// A pinned, sendable stream of raw response byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Source of the trust anchor's current signing keys.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Returns the full current key set.
    ///
    /// # Errors
    ///
    /// Any transport failure, timeout, non-success status or malformed body.
    /// Implementations never retry.
    async fn fetch_keys(&self) -> Result<Vec<SigningKey>>;
}

/// Best-effort lookup of the caller's profile.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// Returns the login name associated with `token`.
    ///
    /// # Errors
    ///
    /// Any failure at all; callers treat every error as "no profile".
    async fn login(&self, token: &str) -> Result<String>;
}

/// Starts a streaming chat completion against a model provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends `request` and returns the response body as a byte stream once
    /// the provider has answered with a success status.
    ///
    /// # Errors
    ///
    /// [`AgentError::Http`] if the provider cannot be reached in time,
    /// [`AgentError::Upstream`] on a non-success status.
    async fn stream_chat(
        &self,
        request: &CompletionRequest,
        api_key: Option<&str>,
    ) -> Result<ByteStream>;
}
