//! Tracking reference classification.
//!
//! Shoppers type a free-text reference into the order tracker. Two formats are
//! accepted:
//!
//! - **Order references** - `ord_` followed by exactly 16 letters or digits,
//!   derived from the order ID (see [`crate::generate_reference`]).
//! - **Quote references** - anything starting with `COT-`. The rest of the
//!   format belongs to the quote service.
//!
//! Classification first canonicalizes the input with an ordered rule table and
//! then matches the canonical text against the two formats.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::tracking_code::{TRACKING_CODE_LENGTH, TrackingCode};

/// Prefix of every order reference.
pub const ORDER_PREFIX: &str = "ord_";

/// Prefix of every service quote reference.
pub const QUOTE_PREFIX: &str = "COT-";

/// Minimum length of a normalized reference.
pub const MIN_REFERENCE_LENGTH: usize = 3;

/// User-facing help text returned for every rejected reference.
pub const HELP_MESSAGE: &str = "Enter a valid tracking reference: an order reference like \
     ord_XXXXXXXXXXXXXXXX (16 letters or digits) or a service quote reference starting with COT-.";

/// Errors that can occur when classifying a [`TrackingReference`].
///
/// All variants display the same [`HELP_MESSAGE`]; the variant only matters
/// for logging and tests.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// Nothing is left after whitespace removal.
    #[error("{}", HELP_MESSAGE)]
    Empty,
    /// The normalized reference is shorter than [`MIN_REFERENCE_LENGTH`].
    #[error("{}", HELP_MESSAGE)]
    TooShort {
        /// The normalized input.
        normalized: String,
    },
    /// The normalized reference matches neither format.
    #[error("{}", HELP_MESSAGE)]
    Unrecognized {
        /// The normalized input.
        normalized: String,
    },
}

impl ReferenceError {
    /// The normalized input that was rejected (empty for [`Self::Empty`]).
    #[must_use]
    pub fn normalized(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::TooShort { normalized } | Self::Unrecognized { normalized } => normalized,
        }
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Canonicalization rules, applied in order. The first rule that matches wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NormalizationRule {
    /// Already carries the lowercase `ord_` prefix: keep as given.
    CanonicalOrderPrefix,
    /// Carries the order prefix in another case: rewrite the prefix only.
    MixedCaseOrderPrefix,
    /// Anything else is uppercased (quote references are upper-case).
    Uppercase,
}

const NORMALIZATION_RULES: [NormalizationRule; 3] = [
    NormalizationRule::CanonicalOrderPrefix,
    NormalizationRule::MixedCaseOrderPrefix,
    NormalizationRule::Uppercase,
];

/// Characters removed from tracker input before classification.
///
/// Unicode `White_Space` without NEL (U+0085), plus the byte order mark
/// (U+FEFF) that some mail clients prepend to copied text.
const fn is_reference_whitespace(c: char) -> bool {
    match c {
        '\u{85}' => false,
        '\u{FEFF}' => true,
        _ => c.is_whitespace(),
    }
}

impl NormalizationRule {
    fn apply(self, compact: &str) -> Option<String> {
        match self {
            Self::CanonicalOrderPrefix => compact
                .starts_with(ORDER_PREFIX)
                .then(|| compact.to_owned()),
            Self::MixedCaseOrderPrefix => compact
                .get(..ORDER_PREFIX.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(ORDER_PREFIX))
                .and_then(|_| compact.get(ORDER_PREFIX.len()..))
                .map(|rest| format!("{ORDER_PREFIX}{rest}")),
            Self::Uppercase => Some(compact.to_uppercase()),
        }
    }
}

// =============================================================================
// Reference types
// =============================================================================

/// An order tracking reference: `ord_` followed by a 16-character [`TrackingCode`].
///
/// ## Examples
///
/// ```
/// use layerline_core::OrderReference;
///
/// assert!(OrderReference::parse("ord_AbCdEfGh12345678").is_ok());
/// assert!(OrderReference::parse("ORD_AbCdEfGh12345678").is_err()); // not normalized
/// assert!(OrderReference::parse("ord_short").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderReference(String);

impl OrderReference {
    /// Length of a complete order reference (`ord_` + 16).
    pub const LENGTH: usize = ORDER_PREFIX.len() + TRACKING_CODE_LENGTH;

    /// Parse an already-normalized order reference.
    ///
    /// No whitespace stripping or case folding happens here; use
    /// [`TrackingReference::classify`] for raw user input.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::Unrecognized`] if the input is not `ord_`
    /// followed by exactly 16 ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        s.strip_prefix(ORDER_PREFIX)
            .and_then(|code| TrackingCode::parse(code).ok())
            .map(Self::from_code)
            .ok_or_else(|| ReferenceError::Unrecognized {
                normalized: s.to_owned(),
            })
    }

    /// Build the reference for a tracking code.
    #[must_use]
    pub fn from_code(code: TrackingCode) -> Self {
        Self(format!("{ORDER_PREFIX}{}", code.as_str()))
    }

    /// Returns the 16-character tracking code (without the `ord_` prefix).
    #[must_use]
    pub fn code(&self) -> TrackingCode {
        TrackingCode::from_validated(self.0.get(ORDER_PREFIX.len()..).unwrap_or_default())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the reference and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderReference {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<OrderReference> for String {
    fn from(reference: OrderReference) -> Self {
        reference.0
    }
}

impl AsRef<str> for OrderReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A service quote reference, recognized by its `COT-` prefix.
///
/// The quote service owns the format after the prefix, so this type only
/// guarantees the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuoteReference(String);

impl QuoteReference {
    /// Parse an already-normalized quote reference.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::Unrecognized`] if the input does not start
    /// with `COT-`.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        if s.starts_with(QUOTE_PREFIX) {
            Ok(Self(s.to_owned()))
        } else {
            Err(ReferenceError::Unrecognized {
                normalized: s.to_owned(),
            })
        }
    }

    /// Returns the reference as a string slice.
    ///
    /// This is also the external order ID the quote service indexes by.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the reference and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for QuoteReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for QuoteReference {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<QuoteReference> for String {
    fn from(reference: QuoteReference) -> Self {
        reference.0
    }
}

/// A classified tracking reference.
///
/// ## Examples
///
/// ```
/// use layerline_core::{ReferenceError, TrackingReference};
///
/// let order = TrackingReference::classify("  ORD_AbCdEfGh12345678 ").unwrap();
/// assert_eq!(order.as_str(), "ord_AbCdEfGh12345678");
///
/// let quote = TrackingReference::classify("cot-123").unwrap();
/// assert_eq!(quote.as_str(), "COT-123");
///
/// assert_eq!(TrackingReference::classify(""), Err(ReferenceError::Empty));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TrackingReference {
    /// A Shopify order, looked up by its tracking reference.
    Order(OrderReference),
    /// A service quote, looked up by its external order ID.
    Quote(QuoteReference),
}

impl TrackingReference {
    /// Strip all whitespace and canonicalize the case of a raw reference.
    ///
    /// This is the text that gets classified and echoed back to the shopper.
    #[must_use]
    pub fn normalize(raw: &str) -> String {
        let compact: String = raw
            .chars()
            .filter(|&c| !is_reference_whitespace(c))
            .collect();

        NORMALIZATION_RULES
            .iter()
            .find_map(|rule| rule.apply(&compact))
            .unwrap_or(compact)
    }

    /// Classify raw user input.
    ///
    /// # Errors
    ///
    /// - [`ReferenceError::Empty`] if nothing is left after whitespace removal
    /// - [`ReferenceError::TooShort`] if fewer than 3 characters remain
    /// - [`ReferenceError::Unrecognized`] if neither format matches
    pub fn classify(raw: &str) -> Result<Self, ReferenceError> {
        let normalized = Self::normalize(raw);

        if normalized.is_empty() {
            return Err(ReferenceError::Empty);
        }

        if normalized.chars().count() < MIN_REFERENCE_LENGTH {
            return Err(ReferenceError::TooShort { normalized });
        }

        if normalized.starts_with(QUOTE_PREFIX) {
            return Ok(Self::Quote(QuoteReference(normalized)));
        }

        OrderReference::parse(&normalized).map(Self::Order)
    }

    /// Returns the normalized reference text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Order(reference) => reference.as_str(),
            Self::Quote(reference) => reference.as_str(),
        }
    }

    /// Short label for logs and spans.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Order(_) => "order",
            Self::Quote(_) => "quote",
        }
    }
}

impl fmt::Display for TrackingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrackingReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::classify(s)
    }
}

impl TryFrom<String> for TrackingReference {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::classify(&s)
    }
}

impl From<TrackingReference> for String {
    fn from(reference: TrackingReference) -> Self {
        match reference {
            TrackingReference::Order(r) => r.into_inner(),
            TrackingReference::Quote(r) => r.into_inner(),
        }
    }
}

impl From<OrderReference> for TrackingReference {
    fn from(reference: OrderReference) -> Self {
        Self::Order(reference)
    }
}

impl From<QuoteReference> for TrackingReference {
    fn from(reference: QuoteReference) -> Self {
        Self::Quote(reference)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_exact_order_reference() {
        let reference = TrackingReference::classify("ord_AbCdEfGh12345678").unwrap();
        assert!(matches!(reference, TrackingReference::Order(_)));
        assert_eq!(reference.as_str(), "ord_AbCdEfGh12345678");
    }

    #[test]
    fn test_classify_order_reference_keeps_code_case() {
        let reference = TrackingReference::classify("ord_abcdefgh12345678").unwrap();
        assert_eq!(reference.as_str(), "ord_abcdefgh12345678");
    }

    #[test]
    fn test_classify_uppercase_order_prefix_is_rewritten() {
        let reference = TrackingReference::classify("ORD_AbCdEfGh12345678").unwrap();
        assert_eq!(reference.as_str(), "ord_AbCdEfGh12345678");

        let reference = TrackingReference::classify("Ord_AbCdEfGh12345678").unwrap();
        assert_eq!(reference.as_str(), "ord_AbCdEfGh12345678");
    }

    #[test]
    fn test_classify_strips_all_whitespace() {
        let reference = TrackingReference::classify("  ord_AbCd EfGh\t1234\n5678  ").unwrap();
        assert_eq!(reference.as_str(), "ord_AbCdEfGh12345678");
    }

    #[test]
    fn test_classify_strips_byte_order_mark() {
        let reference = TrackingReference::classify("\u{FEFF}cot-123").unwrap();
        assert_eq!(reference, TrackingReference::Quote(QuoteReference("COT-123".into())));

        let reference = TrackingReference::classify("\u{FEFF}ord_AbCdEfGh12345678").unwrap();
        assert_eq!(reference.as_str(), "ord_AbCdEfGh12345678");
    }

    #[test]
    fn test_classify_keeps_next_line_character() {
        let reference = TrackingReference::classify("cot-1\u{85}23").unwrap();
        assert_eq!(reference.as_str(), "COT-1\u{85}23");

        assert!(matches!(
            TrackingReference::classify("ord_AbCdEfGh\u{85}12345678"),
            Err(ReferenceError::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_reference_whitespace_set() {
        for c in [' ', '\t', '\n', '\u{0B}', '\u{0C}', '\r', '\u{A0}', '\u{2003}', '\u{3000}'] {
            assert!(is_reference_whitespace(c), "{c:?}");
        }
        assert!(is_reference_whitespace('\u{FEFF}'));
        assert!(!is_reference_whitespace('\u{85}'));
        assert!(!is_reference_whitespace('\u{200B}'));
    }

    #[test]
    fn test_classify_quote_reference_is_uppercased() {
        let reference = TrackingReference::classify("cot-123").unwrap();
        assert!(matches!(reference, TrackingReference::Quote(_)));
        assert_eq!(reference.as_str(), "COT-123");
    }

    #[test]
    fn test_classify_quote_reference_with_spaces() {
        let reference = TrackingReference::classify(" COT - 999 ").unwrap();
        assert_eq!(reference.as_str(), "COT-999");
    }

    #[test]
    fn test_classify_empty() {
        assert_eq!(TrackingReference::classify(""), Err(ReferenceError::Empty));
        assert_eq!(
            TrackingReference::classify(" \t\n "),
            Err(ReferenceError::Empty)
        );
    }

    #[test]
    fn test_classify_too_short() {
        assert_eq!(
            TrackingReference::classify("ab"),
            Err(ReferenceError::TooShort {
                normalized: "AB".to_string()
            })
        );
    }

    #[test]
    fn test_classify_order_prefix_wrong_length() {
        // 15 characters after the prefix
        let err = TrackingReference::classify("ORD_abcdefghij12345").unwrap_err();
        assert_eq!(
            err,
            ReferenceError::Unrecognized {
                normalized: "ord_abcdefghij12345".to_string()
            }
        );

        // 17 characters after the prefix
        assert!(TrackingReference::classify("ord_abcdefghij1234567").is_err());
    }

    #[test]
    fn test_classify_order_code_rejects_symbols() {
        assert!(TrackingReference::classify("ord_abcdefgh-2345678").is_err());
        assert!(TrackingReference::classify("ord_abcdefgh_2345678").is_err());
    }

    #[test]
    fn test_classify_order_code_rejects_non_ascii() {
        assert!(TrackingReference::classify("ord_abcdéfgh12345678").is_err());
    }

    #[test]
    fn test_classify_unrecognized() {
        let err = TrackingReference::classify("#1001").unwrap_err();
        assert_eq!(err.normalized(), "#1001");
        assert!(matches!(err, ReferenceError::Unrecognized { .. }));
    }

    #[test]
    fn test_classify_order_prefix_without_underscore_is_unrecognized() {
        // Uppercased by the fallback rule, so the `ord_` match never happens
        let err = TrackingReference::classify("ordAbCdEfGh12345678").unwrap_err();
        assert_eq!(err.normalized(), "ORDABCDEFGH12345678");
    }

    #[test]
    fn test_errors_share_help_message() {
        assert_eq!(ReferenceError::Empty.to_string(), HELP_MESSAGE);
        assert_eq!(
            ReferenceError::Unrecognized {
                normalized: "x".to_string()
            }
            .to_string(),
            HELP_MESSAGE
        );
    }

    #[test]
    fn test_normalize_rule_order() {
        assert_eq!(
            TrackingReference::normalize("ord_lowerCASE"),
            "ord_lowerCASE"
        );
        assert_eq!(
            TrackingReference::normalize("oRd_lowerCASE"),
            "ord_lowerCASE"
        );
        assert_eq!(TrackingReference::normalize("quote 1"), "QUOTE1");
    }

    #[test]
    fn test_normalize_short_multibyte_input() {
        // Prefix slicing must not split a multi-byte character
        assert_eq!(TrackingReference::normalize("ñé"), "ÑÉ");
    }

    #[test]
    fn test_order_reference_code() {
        let reference = OrderReference::parse("ord_AbCdEfGh12345678").unwrap();
        assert_eq!(reference.code().as_str(), "AbCdEfGh12345678");
    }

    #[test]
    fn test_quote_reference_parse() {
        assert!(QuoteReference::parse("COT-1").is_ok());
        assert!(QuoteReference::parse("cot-1").is_err());
    }

    #[test]
    fn test_from_str() {
        let reference: TrackingReference = "cot-42".parse().unwrap();
        assert_eq!(reference.kind(), "quote");
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let reference: TrackingReference = serde_json::from_str("\"cot-7\"").unwrap();
        assert_eq!(serde_json::to_string(&reference).unwrap(), "\"COT-7\"");

        assert!(serde_json::from_str::<OrderReference>("\"ord_nope\"").is_err());
    }
}
