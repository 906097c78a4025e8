//! Shared HTTP utilities for outbound calls.
//!
//! Keeps the send → status-check → stream logic in one place for the model
//! provider and the profile lookup.

use agent_types::{
    AgentError,
    traits::{ByteStream, Result},
};
use futures_util::{StreamExt as _, stream};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Thin wrapper over a [`Client`] that turns non-2xx answers into
/// [`AgentError::Upstream`].
#[derive(Clone)]
pub struct ProviderHttp {
    http: Client,
}

impl ProviderHttp {
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Returns the inner client for building requests.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.http
    }

    /// Sends a request and checks for a success status.
    ///
    /// # Errors
    ///
    /// `AgentError::Upstream` on non-success status codes (the body text is
    /// kept for logging), `AgentError::Http` if the request fails to send.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(AgentError::Upstream {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    /// Like [`send`](Self::send), but bounds only the wait for the response
    /// head. The body may keep streaming past `limit`.
    ///
    /// # Errors
    ///
    /// `AgentError::Http` if no response head arrives within `limit`, plus
    /// everything [`send`](Self::send) returns.
    pub async fn send_within(&self, builder: RequestBuilder, limit: Duration) -> Result<Response> {
        tokio::time::timeout(limit, self.send(builder))
            .await
            .map_err(|_| AgentError::Http(format!("no response within {limit:?}")))?
    }

    /// Converts a response body into a [`ByteStream`].
    #[must_use]
    pub fn byte_stream(resp: Response) -> ByteStream {
        Box::pin(resp.bytes_stream().map(|r| r.map_err(AgentError::from)))
    }

    /// Like [`byte_stream`](Self::byte_stream), but every chunk must arrive
    /// within `idle` of the previous one.
    ///
    /// A stall yields one `AgentError::Http` and then ends the stream.
    #[must_use]
    pub fn idle_bounded_stream(resp: Response, idle: Duration) -> ByteStream {
        let inner = Self::byte_stream(resp);
        Box::pin(stream::unfold(Some(inner), move |state| async move {
            let mut inner = state?;
            match tokio::time::timeout(idle, inner.next()).await {
                Ok(Some(item)) => Some((item, Some(inner))),
                Ok(None) => None,
                Err(_) => Some((
                    Err(AgentError::Http(format!("no data within {idle:?}"))),
                    None,
                )),
            }
        }))
    }
}
