//! Mapping from the type-definition model to table column names.

use serde::{Deserialize, Serialize};

use ecf_sequence_core::{derive_type_code, Channel, TypeDefinition};

use crate::dbf::Row;

/// Column names of the sequence table.
///
/// Defaults match the legacy invoicing table; any of them can be overridden
/// from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub code: String,
    pub name: String,
    pub summary: String,
    pub serial_prefix: String,
    pub counter_a: String,
    pub counter_b: String,
    pub expiry_date: String,
    pub minimum: String,
    pub quota: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            code: "COD_PF_F".into(),
            name: "NOMBRE".into(),
            summary: "RESUMEN".into(),
            serial_prefix: "NUMERO".into(),
            counter_a: "NUMERO_1".into(),
            counter_b: "NUMERO_2".into(),
            expiry_date: "FEC_DOC".into(),
            minimum: "MINIMO".into(),
            quota: "CANTSECUEN".into(),
        }
    }
}

impl ColumnMap {
    /// The counter column for `channel`.
    pub fn counter(&self, channel: Channel) -> &str {
        match channel {
            Channel::A => &self.counter_a,
            Channel::B => &self.counter_b,
        }
    }

    /// Decode a row. Missing columns read as empty text or 0 so one odd row
    /// never aborts a listing.
    pub fn decode(&self, row: &Row<'_>) -> TypeDefinition {
        let text = |column: &str| row.text(column).unwrap_or_default();
        let int = |column: &str| row.int(column).unwrap_or_default();
        let uint = |column: &str| row.uint(column).unwrap_or_default();

        let serial_prefix = text(&self.serial_prefix);
        TypeDefinition {
            type_code: derive_type_code(&serial_prefix),
            code: int(&self.code),
            name: text(&self.name),
            summary: text(&self.summary),
            counter_a: uint(&self.counter_a),
            counter_b: uint(&self.counter_b),
            expiry_date: text(&self.expiry_date),
            minimum: int(&self.minimum),
            quota: int(&self.quota),
            serial_prefix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbf::TableBuilder;

    #[test]
    fn test_counter_columns() {
        let columns = ColumnMap::default();
        assert_eq!(columns.counter(Channel::A), "NUMERO_1");
        assert_eq!(columns.counter(Channel::B), "NUMERO_2");
    }

    #[test]
    fn test_decode_tolerates_missing_columns() {
        let mut table = TableBuilder::new()
            .character("NUMERO", 20)
            .numeric("NUMERO_1", 10, 0)
            .build()
            .unwrap();
        let row = table.append_row();
        table.set_field(row, "NUMERO", "B03").unwrap();
        table.set_field(row, "NUMERO_1", "12").unwrap();

        let def = ColumnMap::default().decode(&table.row(row).unwrap());
        assert_eq!(def.type_code, "B03");
        assert_eq!(def.counter_a, 12);
        assert_eq!(def.counter_b, 0);
        assert_eq!(def.name, "");
        assert_eq!(def.quota, 0);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let columns: ColumnMap = serde_json::from_str(r#"{"counter_b": "SEQ_B"}"#).unwrap();
        assert_eq!(columns.counter(Channel::B), "SEQ_B");
        assert_eq!(columns.counter(Channel::A), "NUMERO_1");
    }
}
