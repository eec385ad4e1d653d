//! Issued sequence numbers and their text form.
//!
//! The text form is the requested type code followed by the counter value
//! zero-padded to [`SEQUENCE_DIGITS`] digits, e.g. `E320000000006`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Width of the zero-padded numeric part of a sequence string.
pub const SEQUENCE_DIGITS: usize = 10;

/// Largest number that fits in [`SEQUENCE_DIGITS`] digits.
pub const SEQUENCE_MAX: u64 = 9_999_999_999;

/// A freshly issued sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    /// The type code the caller asked for.
    pub type_code: String,
    /// The new counter value.
    pub number: u64,
}

impl Sequence {
    pub fn new(type_code: impl Into<String>, number: u64) -> Self {
        Self {
            type_code: type_code.into(),
            number,
        }
    }

    /// Render the externally issued identifier.
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Split a sequence string into its type code and number.
    ///
    /// The last [`SEQUENCE_DIGITS`] characters must be ASCII digits and at
    /// least one character of type code must precede them.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let malformed = || CoreError::MalformedSequence(s.to_string());

        if s.len() <= SEQUENCE_DIGITS || !s.is_char_boundary(s.len() - SEQUENCE_DIGITS) {
            return Err(malformed());
        }
        let (code, digits) = s.split_at(s.len() - SEQUENCE_DIGITS);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let number = digits.parse().map_err(|_| malformed())?;
        Ok(Self::new(code, number))
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.type_code,
            self.number,
            width = SEQUENCE_DIGITS
        )
    }
}
