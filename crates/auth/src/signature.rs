//! Signature wire formats.
//!
//! The platform sends P-256 signatures either as raw `r || s` (IEEE P1363,
//! always 64 bytes) or DER. Both normalize to [`p256::ecdsa::Signature`];
//! choosing the format is decided on length alone and carries no trust.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use p256::ecdsa::Signature;

/// Byte length of a P1363-encoded P-256 signature.
pub const FIXED_WIDTH_LEN: usize = 64;

/// How the signature bytes are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    /// Two 32-byte big-endian integers, `r` then `s`.
    P1363,
    /// ASN.1 DER `SEQUENCE { r INTEGER, s INTEGER }`.
    Der,
}

impl SignatureEncoding {
    /// Picks the encoding from the decoded byte length.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.len() == FIXED_WIDTH_LEN {
            Self::P1363
        } else {
            Self::Der
        }
    }
}

/// Why signature bytes could not be turned into a [`Signature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureFormatError {
    /// The header value is not standard base64.
    Base64,
    /// The bytes are not a well-formed signature in the detected encoding.
    Malformed(SignatureEncoding),
}

/// A decoded signature together with the wire encoding it arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireSignature {
    pub bytes: Vec<u8>,
    pub encoding: SignatureEncoding,
}

impl WireSignature {
    /// Decodes a base64 header value.
    ///
    /// # Errors
    ///
    /// [`SignatureFormatError::Base64`] if the value is not valid base64.
    pub fn from_base64(value: &str) -> Result<Self, SignatureFormatError> {
        let bytes = STANDARD
            .decode(value.trim())
            .map_err(|_| SignatureFormatError::Base64)?;
        let encoding = SignatureEncoding::detect(&bytes);
        Ok(Self { bytes, encoding })
    }

    /// Converts the wire bytes into the verifier's signature type.
    ///
    /// # Errors
    ///
    /// [`SignatureFormatError::Malformed`] if `r` or `s` is zero or out of
    /// range, or the DER structure does not parse.
    pub fn normalize(&self) -> Result<Signature, SignatureFormatError> {
        match self.encoding {
            SignatureEncoding::P1363 => Signature::from_slice(&self.bytes),
            SignatureEncoding::Der => Signature::from_der(&self.bytes),
        }
        .map_err(|_| SignatureFormatError::Malformed(self.encoding))
    }
}
