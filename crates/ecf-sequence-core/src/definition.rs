//! Type definitions: one decoded row of the sequence table.

use serde::{Deserialize, Serialize};

use crate::types::{Channel, TypeCode};

/// A receipt type and its live counters, as stored in the sequence table.
///
/// Serialized with the field names existing clients of the listing
/// endpoint expect.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// First three characters of `serial_prefix`, or empty when the prefix
    /// is too short.
    #[serde(rename = "tipo")]
    pub type_code: String,
    /// Numeric category code.
    #[serde(rename = "cod_pf_f")]
    pub code: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "resumen")]
    pub summary: String,
    /// Full prefix stored in the row.
    #[serde(rename = "numero")]
    pub serial_prefix: String,
    /// Last number issued on channel A.
    #[serde(rename = "secuencia_actual")]
    pub counter_a: u64,
    /// Last number issued on channel B.
    #[serde(rename = "secuencia_hasta")]
    pub counter_b: u64,
    #[serde(rename = "fecha_vencimiento")]
    pub expiry_date: String,
    #[serde(rename = "minimo")]
    pub minimum: i64,
    #[serde(rename = "cantidad_secuencias")]
    pub quota: i64,
}

impl TypeDefinition {
    /// Build a definition from its serial prefix, deriving the type code.
    pub fn with_prefix(serial_prefix: impl Into<String>) -> Self {
        let serial_prefix = serial_prefix.into();
        Self {
            type_code: derive_type_code(&serial_prefix),
            serial_prefix,
            ..Default::default()
        }
    }

    /// Whether this row answers requests for `type_code`.
    ///
    /// Matching is a prefix test on the serial prefix, not equality. An
    /// empty code matches nothing.
    pub fn matches(&self, type_code: &str) -> bool {
        !type_code.is_empty() && self.serial_prefix.starts_with(type_code)
    }

    /// The counter for `channel`.
    pub fn counter(&self, channel: Channel) -> u64 {
        match channel {
            Channel::A => self.counter_a,
            Channel::B => self.counter_b,
        }
    }

    /// Mutable access to the counter for `channel`.
    pub fn counter_mut(&mut self, channel: Channel) -> &mut u64 {
        match channel {
            Channel::A => &mut self.counter_a,
            Channel::B => &mut self.counter_b,
        }
    }
}

/// Derive the type code for a serial prefix; empty if shorter than three chars.
pub fn derive_type_code(serial_prefix: &str) -> String {
    TypeCode::from_prefix(serial_prefix)
        .map(String::from)
        .unwrap_or_default()
}

/// Parse numeric table text, yielding 0 for anything unparsable.
pub fn parse_lenient_i64(s: &str) -> i64 {
    s.trim().parse().unwrap_or(0)
}

/// Parse an unsigned counter, yielding 0 for anything unparsable or negative.
pub fn parse_lenient_u64(s: &str) -> u64 {
    s.trim().parse().unwrap_or(0)
}
