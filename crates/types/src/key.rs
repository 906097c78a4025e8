//! Signing key records published by the trust anchor.

use serde::{Deserialize, Serialize};

/// One public key from the trust anchor's key listing.
///
/// The key material is kept as the PEM text the anchor published; decoding
/// (and the curve check that comes with it) happens at verification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    /// Identifier the platform sends alongside each signature.
    #[serde(rename = "key_identifier")]
    pub identifier: String,
    /// `SubjectPublicKeyInfo` PEM text.
    #[serde(rename = "key")]
    pub pem: String,
    /// Whether the anchor marks this key as the one currently used for signing.
    /// Informational only.
    #[serde(default)]
    pub is_current: bool,
}

impl SigningKey {
    /// Creates a key record.
    pub fn new(identifier: impl Into<String>, pem: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            pem: pem.into(),
            is_current: false,
        }
    }
}

/// Body of the trust anchor's key listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyListing {
    pub public_keys: Vec<SigningKey>,
}
