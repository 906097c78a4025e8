//! Unified error type for the copilot-agent workspace.

use thiserror::Error;

/// Enumerates all error kinds that can occur across agent crates.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The key identifier or signature header is absent or empty.
    #[error("Missing signature headers")]
    MissingCredentials,

    /// Signature verification did not produce a definite accept.
    ///
    /// The display text is what the caller sees; the actual cause is logged
    /// where verification happens and never leaves the process.
    #[error("Unauthorized")]
    Unauthorized,

    /// The verified body is not a JSON object of the expected shape.
    #[error("Invalid request body")]
    InvalidBody(String),

    /// The trust anchor answered with something that is not a key listing.
    #[error("key fetch error: {0}")]
    KeyFetch(String),

    /// HTTP transport error (connect, timeout, body read).
    #[error("http error: {0}")]
    Http(String),

    /// An upstream service returned a non-success status.
    #[error("upstream error: status={status}, body={body}")]
    Upstream { status: u16, body: String },
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl AgentError {
    /// Returns `true` if the failure happened on the way to a remote service
    /// rather than in local validation.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Upstream { .. } | Self::KeyFetch(_)
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AgentError>;
