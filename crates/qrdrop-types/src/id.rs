use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque identifier naming one stored image.
///
/// An `ImageId` is 128 bits drawn from a cryptographically secure RNG, so
/// identifiers are unguessable and carry no ordering. It is rendered as a
/// fixed-length token of 32 lowercase hex characters, which is also the form
/// that appears in retrieval URLs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId([u8; 16]);

impl ImageId {
    /// Length of the rendered token in characters.
    pub const TOKEN_LEN: usize = 32;

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Create an identifier from raw bytes. Use `generate()` for production code.
    pub fn from_raw(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// The raw 16-byte value.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Full token (32 hex characters).
    pub fn to_token(&self) -> String {
        hex::encode(self.0)
    }

    /// Short form for log lines (first 8 hex characters).
    pub fn short_token(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse a token produced by [`Self::to_token`].
    pub fn from_token(s: &str) -> Result<Self, TypeError> {
        if s.len() != Self::TOKEN_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::TOKEN_LEN,
                actual: s.len(),
            });
        }
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.short_token())
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_token())
    }
}

impl FromStr for ImageId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

impl TryFrom<String> for ImageId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_token(&s)
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.to_token()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn token_is_fixed_length_lowercase_hex() {
        let token = ImageId::generate().to_token();
        assert_eq!(token.len(), ImageId::TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn generated_ids_do_not_repeat() {
        let ids: HashSet<ImageId> = (0..10_000).map(|_| ImageId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn generated_ids_are_not_sequential() {
        let a = u128::from_be_bytes(*ImageId::generate().as_bytes());
        let b = u128::from_be_bytes(*ImageId::generate().as_bytes());
        assert_ne!(a.wrapping_add(1), b);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = ImageId::from_token("abc123").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 6
            }
        );
    }

    #[test]
    fn rejects_non_hex() {
        let err = ImageId::from_token(&"z".repeat(32)).unwrap_err();
        assert!(matches!(err, TypeError::InvalidHex(_)));
    }

    #[test]
    fn rejects_uuid_shaped_tokens() {
        assert!("123e4567-e89b-12d3-a456-426614174000".parse::<ImageId>().is_err());
    }

    #[test]
    fn debug_uses_short_token() {
        let id = ImageId::from_raw([0xab; 16]);
        assert_eq!(format!("{id:?}"), "ImageId(abababab)");
    }

    #[test]
    fn serializes_as_token_string() {
        let id = ImageId::from_raw([0x01; 16]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(16)));
        let parsed: ImageId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    proptest! {
        #[test]
        fn any_raw_value_parses_back(bytes in any::<[u8; 16]>()) {
            let id = ImageId::from_raw(bytes);
            prop_assert_eq!(id.to_token().parse::<ImageId>().unwrap(), id);
        }
    }
}
