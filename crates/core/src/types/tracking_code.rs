//! Tracking code derivation.
//!
//! An order's tracking code is derived from a server-side secret and the
//! order's opaque ID:
//!
//! ```text
//! digest = SHA-256(secret + "|" + order_id)
//! code[i] = ALPHABET[digest[i mod 32] mod 62]    for i in 0..16
//! ```
//!
//! The derivation is deterministic, so an issued reference can be re-derived
//! and checked later without a lookup table. The alphabet order is part of
//! the format: changing it invalidates every reference already issued.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::reference::OrderReference;

/// Number of characters in a tracking code.
pub const TRACKING_CODE_LENGTH: usize = 16;

/// Tracking code alphabet: lowercase, then uppercase, then digits.
pub const TRACKING_CODE_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const ALPHABET_LEN: u8 = 62;

/// Separator between the secret and the order ID in the digest payload.
const PAYLOAD_SEPARATOR: &[u8] = b"|";

/// Errors that can occur when parsing a [`TrackingCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingCodeError {
    /// The code does not have exactly 16 characters.
    #[error("tracking code must be exactly {expected} characters (got {actual})")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length of the input.
        actual: usize,
    },
    /// The code contains a character outside `[a-zA-Z0-9]`.
    #[error("tracking code contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// The secret tracking codes are derived from.
///
/// Implements `Debug` manually to redact the value.
#[derive(Clone)]
pub struct TrackingSecret(SecretString);

impl TrackingSecret {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(SecretString::from(secret.into()))
    }

    fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for TrackingSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TrackingSecret([REDACTED])")
    }
}

impl From<SecretString> for TrackingSecret {
    fn from(secret: SecretString) -> Self {
        Self(secret)
    }
}

/// A 16-character tracking code over [`TRACKING_CODE_ALPHABET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingCode(String);

impl TrackingCode {
    /// Parse a tracking code.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 16 ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, TrackingCodeError> {
        if let Some(c) = s.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(TrackingCodeError::InvalidCharacter(c));
        }

        if s.len() != TRACKING_CODE_LENGTH {
            return Err(TrackingCodeError::InvalidLength {
                expected: TRACKING_CODE_LENGTH,
                actual: s.len(),
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Derive the tracking code for an order.
    #[must_use]
    pub fn derive(secret: &TrackingSecret, order_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.expose().as_bytes());
        hasher.update(PAYLOAD_SEPARATOR);
        hasher.update(order_id.as_bytes());
        let digest = hasher.finalize();

        let code = digest
            .iter()
            .cycle()
            .take(TRACKING_CODE_LENGTH)
            .map(|&byte| alphabet_char(byte))
            .collect();

        Self(code)
    }

    /// Wrap a string already known to be a valid code.
    pub(crate) fn from_validated(s: &str) -> Self {
        Self(s.to_owned())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[allow(clippy::indexing_slicing)] // byte % 62 is always in bounds
fn alphabet_char(byte: u8) -> char {
    char::from(TRACKING_CODE_ALPHABET[usize::from(byte % ALPHABET_LEN)])
}

/// Derive the order reference (`ord_` + tracking code) for an order.
///
/// ## Examples
///
/// ```
/// use layerline_core::{TrackingSecret, generate_reference};
///
/// let secret = TrackingSecret::new("test-secret");
/// let reference = generate_reference(&secret, "gid://shopify/Order/1001");
///
/// assert_eq!(reference.as_str().len(), 20);
/// assert_eq!(reference, generate_reference(&secret, "gid://shopify/Order/1001"));
/// ```
#[must_use]
pub fn generate_reference(secret: &TrackingSecret, order_id: &str) -> OrderReference {
    OrderReference::from_code(TrackingCode::derive(secret, order_id))
}

/// Check that `reference` is the reference issued for `order_id`.
///
/// The comparison does not short-circuit on the first differing byte.
#[must_use]
pub fn verify_reference(
    secret: &TrackingSecret,
    order_id: &str,
    reference: &OrderReference,
) -> bool {
    let expected = generate_reference(secret, order_id);
    let (a, b) = (expected.as_str().as_bytes(), reference.as_str().as_bytes());

    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
