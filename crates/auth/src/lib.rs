//! Request authentication for the agent.
//!
//! Every inbound request is signed by the platform. This crate fetches the
//! platform's published P-256 keys ([`RemoteKeyStore`], optionally behind a
//! [`CachedKeyStore`]) and checks request signatures with
//! [`SignatureVerifier`].

pub mod cache;
pub mod keystore;
pub mod memory;
pub mod signature;
pub mod verifier;

pub use cache::CachedKeyStore;
pub use keystore::{LookupError, RemoteKeyStore, lookup};
pub use memory::StaticKeyStore;
pub use signature::{SignatureEncoding, SignatureFormatError, WireSignature};
pub use verifier::{SignatureVerifier, VerificationOutcome};
