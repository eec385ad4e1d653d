//! Strong type definitions for sequence allocation.
//!
//! Channels are a closed enumeration so that a third counter cannot appear
//! at runtime; type codes are newtypes so unvalidated strings do not leak
//! into the transport layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A receipt type code, e.g. `E32` or `B03`.
///
/// Always exactly [`TypeCode::LEN`] characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeCode(String);

impl TypeCode {
    /// Number of characters in a type code.
    pub const LEN: usize = 3;

    /// Validate a caller-supplied type code.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.chars().count() != Self::LEN {
            return Err(CoreError::InvalidTypeCode(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Derive the type code from a row's serial prefix.
    ///
    /// Returns `None` when the prefix is shorter than [`TypeCode::LEN`].
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        let code: String = prefix.chars().take(Self::LEN).collect();
        (code.chars().count() == Self::LEN).then_some(Self(code))
    }

    /// Borrow the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeCode({})", self.0)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TypeCode {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TypeCode> for String {
    fn from(code: TypeCode) -> Self {
        code.0
    }
}

/// One of the two independent counters a receipt type maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Channel {
    /// The default numbering range.
    #[default]
    A,
    /// The secondary numbering range.
    B,
}

impl Channel {
    /// Both channels, in declaration order.
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    /// Parse a channel name, ignoring ASCII case.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.eq_ignore_ascii_case("A") {
            Ok(Channel::A)
        } else if s.eq_ignore_ascii_case("B") {
            Ok(Channel::B)
        } else {
            Err(CoreError::InvalidChannel(s.to_string()))
        }
    }

    /// Parse a channel the way the request transport does: only an exact
    /// `"B"` selects [`Channel::B`]. Anything else, lowercase `"b"`
    /// included, falls back to [`Channel::A`].
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            Some("B") => Channel::B,
            _ => Channel::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::A => "A",
            Channel::B => "B",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_parse() {
        assert_eq!(TypeCode::parse("E32").unwrap().as_str(), "E32");
        assert!(TypeCode::parse("E3").is_err());
        assert!(TypeCode::parse("E320").is_err());
        assert!(TypeCode::parse("").is_err());
    }

    #[test]
    fn test_type_code_from_prefix() {
        assert_eq!(TypeCode::from_prefix("E3200").unwrap().as_str(), "E32");
        assert_eq!(TypeCode::from_prefix("B03").unwrap().as_str(), "B03");
        assert!(TypeCode::from_prefix("B0").is_none());
        assert!(TypeCode::from_prefix("").is_none());
    }

    #[test]
    fn test_type_code_counts_chars_not_bytes() {
        assert_eq!(TypeCode::from_prefix("ÑA1X").unwrap().as_str(), "ÑA1");
        assert!(TypeCode::parse("ÑA1").is_ok());
    }

    #[test]
    fn test_channel_parse_case_insensitive() {
        assert_eq!(Channel::parse("A").unwrap(), Channel::A);
        assert_eq!(Channel::parse("a").unwrap(), Channel::A);
        assert_eq!(Channel::parse("b").unwrap(), Channel::B);
        assert_eq!(
            Channel::parse("Q"),
            Err(CoreError::InvalidChannel("Q".to_string()))
        );
        assert!(Channel::parse("").is_err());
        assert!(Channel::parse("AB").is_err());
    }

    #[test]
    fn test_channel_transport_default() {
        assert_eq!(Channel::parse_or_default(None), Channel::A);
        assert_eq!(Channel::parse_or_default(Some("")), Channel::A);
        assert_eq!(Channel::parse_or_default(Some("Z")), Channel::A);
        assert_eq!(Channel::parse_or_default(Some("B")), Channel::B);
        assert_eq!(Channel::parse_or_default(Some("A")), Channel::A);
        assert_eq!(Channel::parse_or_default(Some("b")), Channel::A);
        assert_eq!(Channel::parse_or_default(Some(" B")), Channel::A);
    }

    #[test]
    fn test_type_code_serde() {
        let code: TypeCode = serde_json::from_str("\"B03\"").unwrap();
        assert_eq!(code.as_str(), "B03");
        assert!(serde_json::from_str::<TypeCode>("\"B0\"").is_err());
    }
}
