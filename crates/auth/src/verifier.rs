//! Request signature verification against the trust anchor's keys.

use crate::{
    keystore::{LookupError, lookup},
    signature::WireSignature,
};
use agent_types::KeyStore;
use p256::{
    ecdsa::{VerifyingKey, signature::Verifier as _},
    pkcs8::DecodePublicKey as _,
};
use std::{fmt, sync::Arc};

/// Result of checking one signed request. Only [`Verified`](Self::Verified)
/// authorizes anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    /// The identifier is absent from the current key set, or published more
    /// than once.
    KeyNotFound(String),
    /// Wrong key type, undecodable signature, or a cryptographic mismatch.
    SignatureInvalid,
    /// The key set could not be fetched.
    TransportError(String),
}

impl VerificationOutcome {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::KeyNotFound(id) => write!(f, "no public key found for key_identifier: {id}"),
            Self::SignatureInvalid => write!(f, "signature invalid"),
            Self::TransportError(cause) => write!(f, "key fetch failed: {cause}"),
        }
    }
}

/// Verifies ECDSA P-256 / SHA-256 signatures over raw request bodies.
#[derive(Clone)]
pub struct SignatureVerifier {
    keys: Arc<dyn KeyStore>,
}

impl SignatureVerifier {
    /// Creates a verifier resolving keys through `keys`.
    pub fn new(keys: Arc<dyn KeyStore>) -> Self {
        Self { keys }
    }

    /// Checks `signature_b64` over `raw_body` with the key named `key_id`.
    ///
    /// `raw_body` must be the bytes exactly as received; any re-encoding
    /// changes the digest.
    pub async fn verify(
        &self,
        raw_body: &[u8],
        key_id: &str,
        signature_b64: &str,
    ) -> VerificationOutcome {
        let keys = match self.keys.fetch_keys().await {
            Ok(keys) => keys,
            Err(e) => return VerificationOutcome::TransportError(e.to_string()),
        };

        let key = match lookup(&keys, key_id) {
            Ok(key) => key,
            Err(LookupError::NotFound) => {
                return VerificationOutcome::KeyNotFound(key_id.to_string());
            }
            Err(LookupError::Ambiguous(count)) => {
                tracing::warn!(key_id, count, "key identifier published more than once");
                return VerificationOutcome::KeyNotFound(key_id.to_string());
            }
        };

        let Some(verifying_key) = decode_p256_key(&key.pem) else {
            tracing::warn!(key_id, "key material is not a P-256 public key");
            return VerificationOutcome::SignatureInvalid;
        };

        let signature = match WireSignature::from_base64(signature_b64)
            .and_then(|wire| wire.normalize())
        {
            Ok(signature) => signature,
            Err(e) => {
                tracing::debug!(key_id, error = ?e, "undecodable signature");
                return VerificationOutcome::SignatureInvalid;
            }
        };

        match verifying_key.verify(raw_body, &signature) {
            Ok(()) => VerificationOutcome::Verified,
            Err(_) => VerificationOutcome::SignatureInvalid,
        }
    }
}

/// Parses SPKI PEM text, accepting only EC keys on P-256.
///
/// RSA, Ed25519 and EC keys on any other curve are rejected by the SPKI
/// algorithm and parameter check.
fn decode_p256_key(pem: &str) -> Option<VerifyingKey> {
    VerifyingKey::from_public_key_pem(pem.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticKeyStore;
    use agent_types::{AgentError, SigningKey, traits::Result};
    use async_trait::async_trait;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use p256::{
        ecdsa::{Signature, signature::Signer as _},
        pkcs8::{EncodePublicKey as _, LineEnding},
    };
    use sha2::{Digest as _, Sha256};

    const KEY_ID: &str = "4fe6b016179b74078ade7581abf4e84fb398c6fae4fb973972235b84fcd70ca3";
    const BODY: &[u8] = br#"{"messages":[{"role":"user","content":"hi"}]}"#;

    /// RFC 8410 example Ed25519 public key.
    const ED25519_PEM: &str = "-----BEGIN PUBLIC KEY-----\n\
        MCowBQYDK2VwAyEAGb9ECWmEzf6FQbrBZ9w7lshQhqowtrbLDFw4rXAxZuE=\n\
        -----END PUBLIC KEY-----\n";

    fn signing_key(seed: &str) -> p256::ecdsa::SigningKey {
        let hash = Sha256::digest(seed.as_bytes());
        p256::ecdsa::SigningKey::from_bytes(&hash).unwrap()
    }

    fn pem(key: &p256::ecdsa::SigningKey) -> String {
        key.verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap()
    }

    fn sign(key: &p256::ecdsa::SigningKey, body: &[u8]) -> Signature {
        key.sign(body)
    }

    fn verifier_with(keys: Vec<SigningKey>) -> SignatureVerifier {
        SignatureVerifier::new(Arc::new(StaticKeyStore::new(keys)))
    }

    fn registered() -> (p256::ecdsa::SigningKey, SignatureVerifier) {
        let key = signing_key("registered");
        let verifier = verifier_with(vec![
            SigningKey::new("other", pem(&signing_key("other"))),
            SigningKey::new(KEY_ID, pem(&key)),
        ]);
        (key, verifier)
    }

    struct UnreachableStore;

    #[async_trait]
    impl KeyStore for UnreachableStore {
        async fn fetch_keys(&self) -> Result<Vec<SigningKey>> {
            Err(AgentError::Http("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_fixed_width_signature_verifies() {
        let (key, verifier) = registered();
        let sig = STANDARD.encode(sign(&key, BODY).to_bytes());
        assert_eq!(
            verifier.verify(BODY, KEY_ID, &sig).await,
            VerificationOutcome::Verified
        );
    }

    #[tokio::test]
    async fn test_der_signature_verifies() {
        let (key, verifier) = registered();
        let sig = STANDARD.encode(sign(&key, BODY).to_der().as_bytes());
        assert_eq!(
            verifier.verify(BODY, KEY_ID, &sig).await,
            VerificationOutcome::Verified
        );
    }

    #[tokio::test]
    async fn test_both_encodings_agree_across_payloads() {
        let (key, verifier) = registered();
        for body in [&b""[..], b"x", BODY, &[0xffu8; 4096][..]] {
            let sig = sign(&key, body);
            let fixed = STANDARD.encode(sig.to_bytes());
            let der = STANDARD.encode(sig.to_der().as_bytes());
            assert!(verifier.verify(body, KEY_ID, &fixed).await.is_verified());
            assert!(verifier.verify(body, KEY_ID, &der).await.is_verified());
        }
    }

    #[tokio::test]
    async fn test_every_single_bit_flip_is_rejected() {
        let (key, verifier) = registered();
        let bytes = sign(&key, BODY).to_bytes();
        for bit in 0..bytes.len() * 8 {
            let mut mutated = bytes.to_vec();
            mutated[bit / 8] ^= 1 << (bit % 8);
            let outcome = verifier
                .verify(BODY, KEY_ID, &STANDARD.encode(&mutated))
                .await;
            assert_eq!(outcome, VerificationOutcome::SignatureInvalid, "bit {bit}");
        }
    }

    #[tokio::test]
    async fn test_der_bit_flips_are_never_verified() {
        let (key, verifier) = registered();
        let der = sign(&key, BODY).to_der().as_bytes().to_vec();
        for bit in 0..der.len() * 8 {
            let mut mutated = der.clone();
            mutated[bit / 8] ^= 1 << (bit % 8);
            let outcome = verifier
                .verify(BODY, KEY_ID, &STANDARD.encode(&mutated))
                .await;
            assert!(!outcome.is_verified(), "bit {bit}");
        }
    }

    #[tokio::test]
    async fn test_reserialized_body_is_rejected() {
        let (key, verifier) = registered();
        let sig = STANDARD.encode(sign(&key, BODY).to_bytes());
        let value: serde_json::Value = serde_json::from_slice(BODY).unwrap();
        let pretty = serde_json::to_vec_pretty(&value).unwrap();
        assert_eq!(
            verifier.verify(&pretty, KEY_ID, &sig).await,
            VerificationOutcome::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_signature_from_another_key_is_rejected() {
        let (_, verifier) = registered();
        let sig = STANDARD.encode(sign(&signing_key("other"), BODY).to_bytes());
        assert_eq!(
            verifier.verify(BODY, KEY_ID, &sig).await,
            VerificationOutcome::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_unknown_key_identifier_even_with_valid_signature() {
        let (key, verifier) = registered();
        let sig = STANDARD.encode(sign(&key, BODY).to_bytes());
        assert_eq!(
            verifier.verify(BODY, "unknown", &sig).await,
            VerificationOutcome::KeyNotFound("unknown".into())
        );
    }

    #[tokio::test]
    async fn test_unknown_key_identifier_wins_over_bad_base64() {
        let (_, verifier) = registered();
        assert_eq!(
            verifier.verify(BODY, "unknown", "%%%").await,
            VerificationOutcome::KeyNotFound("unknown".into())
        );
    }

    #[tokio::test]
    async fn test_duplicate_identifier_fails_closed() {
        let key = signing_key("registered");
        let verifier = verifier_with(vec![
            SigningKey::new(KEY_ID, pem(&key)),
            SigningKey::new(KEY_ID, pem(&key)),
        ]);
        let sig = STANDARD.encode(sign(&key, BODY).to_bytes());
        assert_eq!(
            verifier.verify(BODY, KEY_ID, &sig).await,
            VerificationOutcome::KeyNotFound(KEY_ID.into())
        );
    }

    #[tokio::test]
    async fn test_wrong_curve_key_is_rejected() {
        use k256::pkcs8::EncodePublicKey as _;

        let seed = Sha256::digest(b"secp256k1");
        let k1 = k256::ecdsa::SigningKey::from_bytes(&seed).unwrap();
        let k1_pem = k1
            .verifying_key()
            .to_public_key_pem(k256::pkcs8::LineEnding::LF)
            .unwrap();
        let verifier = verifier_with(vec![SigningKey::new(KEY_ID, k1_pem)]);

        // Even a signature made with that very key must not be attempted.
        let sig: k256::ecdsa::Signature = k1.sign(BODY);
        assert_eq!(
            verifier
                .verify(BODY, KEY_ID, &STANDARD.encode(sig.to_bytes()))
                .await,
            VerificationOutcome::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_non_ec_key_is_rejected() {
        let (key, _) = registered();
        let verifier = verifier_with(vec![SigningKey::new(KEY_ID, ED25519_PEM)]);
        let sig = STANDARD.encode(sign(&key, BODY).to_bytes());
        assert_eq!(
            verifier.verify(BODY, KEY_ID, &sig).await,
            VerificationOutcome::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_garbage_key_material_is_rejected() {
        let (key, _) = registered();
        let verifier = verifier_with(vec![SigningKey::new(KEY_ID, "not a pem")]);
        let sig = STANDARD.encode(sign(&key, BODY).to_bytes());
        assert_eq!(
            verifier.verify(BODY, KEY_ID, &sig).await,
            VerificationOutcome::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_invalid_base64_signature() {
        let (_, verifier) = registered();
        assert_eq!(
            verifier.verify(BODY, KEY_ID, "!!not base64!!").await,
            VerificationOutcome::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_key_fetch_failure_is_transport_error() {
        let verifier = SignatureVerifier::new(Arc::new(UnreachableStore));
        let outcome = verifier.verify(BODY, KEY_ID, "AAAA").await;
        assert!(matches!(outcome, VerificationOutcome::TransportError(_)));
        assert!(!outcome.is_verified());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(VerificationOutcome::Verified.to_string(), "verified");
        assert!(
            VerificationOutcome::KeyNotFound("abc".into())
                .to_string()
                .contains("abc")
        );
    }

    #[test]
    fn test_decode_p256_key_accepts_generated_pem() {
        assert!(decode_p256_key(&pem(&signing_key("x"))).is_some());
        assert!(decode_p256_key(ED25519_PEM).is_none());
    }
}
