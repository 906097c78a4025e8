//! Core types and traits for the copilot-agent workspace.
//!
//! This crate defines the shared abstractions used across all layers of the
//! agent: the error type, the inbound and outbound chat payloads, the signing
//! key record, and the async traits that the auth and provider layers
//! implement.

pub mod chat;
pub mod error;
pub mod key;
pub mod traits;

pub use chat::{AgentRequest, CompletionRequest};
pub use error::AgentError;
pub use key::{KeyListing, SigningKey};
pub use traits::{ByteStream, ChatProvider, KeyStore, ProfileLookup};
