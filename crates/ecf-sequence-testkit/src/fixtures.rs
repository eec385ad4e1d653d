//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: sequence tables in the legacy
//! column layout, written into a temporary directory that lives as long as
//! the fixture.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use ecf_sequence_core::{Channel, EventSink};
use ecf_sequence_store::{ColumnMap, DbfStore, Table, TableBuilder};

/// File name used for fixture tables.
pub const TABLE_FILE: &str = "FAC_PF_M.DBF";

/// One row to write into a fixture table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRow {
    pub code: i64,
    pub name: String,
    pub summary: String,
    pub serial_prefix: String,
    pub counter_a: u64,
    pub counter_b: u64,
    pub expiry_date: String,
    pub minimum: i64,
    pub quota: i64,
    pub deleted: bool,
}

impl FixtureRow {
    /// A live row with the given prefix and zeroed counters.
    pub fn new(serial_prefix: &str) -> Self {
        Self {
            code: 0,
            name: String::new(),
            summary: String::new(),
            serial_prefix: serial_prefix.to_string(),
            counter_a: 0,
            counter_b: 0,
            expiry_date: String::new(),
            minimum: 0,
            quota: 0,
            deleted: false,
        }
    }

    pub fn counters(mut self, counter_a: u64, counter_b: u64) -> Self {
        self.counter_a = counter_a;
        self.counter_b = counter_b;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }
}

/// Column layout of the legacy invoicing table.
pub fn legacy_layout() -> TableBuilder {
    TableBuilder::new()
        .numeric("COD_PF_F", 3, 0)
        .character("NOMBRE", 50)
        .character("RESUMEN", 50)
        .character("NUMERO", 20)
        .numeric("NUMERO_1", 10, 0)
        .numeric("NUMERO_2", 10, 0)
        .date("FEC_DOC")
        .numeric("MINIMO", 10, 0)
        .numeric("CANTSECUEN", 10, 0)
}

/// The two reference rows: consumer invoices (`E32`) and debit notes (`B03`).
pub fn standard_rows() -> Vec<FixtureRow> {
    vec![
        FixtureRow {
            code: 1,
            name: "CONSUMIDOR FINAL".into(),
            expiry_date: "20261231".into(),
            minimum: 100,
            quota: 1_000_000,
            ..FixtureRow::new("E3200")
        },
        FixtureRow {
            code: 6,
            name: "NOTA DE DEBITOS".into(),
            counter_b: 2,
            ..FixtureRow::new("B03")
        },
    ]
}

/// A sequence table on disk.
pub struct TableFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl TableFixture {
    /// A table holding [`standard_rows`].
    pub fn new() -> Self {
        Self::with_rows(&standard_rows())
    }

    /// A table with no rows.
    pub fn empty() -> Self {
        Self::with_rows(&[])
    }

    /// A table holding `rows`, in order.
    pub fn with_rows(rows: &[FixtureRow]) -> Self {
        let dir = tempfile::tempdir().expect("create fixture directory");
        let path = dir.path().join(TABLE_FILE);

        let mut table = legacy_layout().build().expect("build legacy layout");
        for row in rows {
            write_row(&mut table, row);
        }
        table.save(&path).expect("save fixture table");

        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a store over the fixture table.
    pub fn store(&self) -> DbfStore {
        DbfStore::open(&self.path).expect("open fixture store")
    }

    /// Re-read the table from disk.
    pub fn table(&self) -> Table {
        Table::open(&self.path).expect("open fixture table")
    }

    /// Current file contents.
    pub fn bytes(&self) -> Vec<u8> {
        std::fs::read(&self.path).expect("read fixture table")
    }

    /// Counter of the first live row whose prefix starts with `type_code`.
    pub fn counter(&self, type_code: &str, channel: Channel) -> Option<u64> {
        let columns = ColumnMap::default();
        let table = self.table();
        let found = table
            .rows()
            .filter(|row| !row.is_deleted())
            .map(|row| columns.decode(&row))
            .find(|def| def.matches(type_code));
        found.map(|def| def.counter(channel))
    }

    /// Append rows to the table on disk.
    pub fn append(&self, rows: &[FixtureRow]) {
        let mut table = self.table();
        for row in rows {
            write_row(&mut table, row);
        }
        table.save(&self.path).expect("save fixture table");
    }
}

impl Default for TableFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write_row(table: &mut Table, row: &FixtureRow) {
    let index = table.append_row();
    let fields = [
        ("COD_PF_F", row.code.to_string()),
        ("NOMBRE", row.name.clone()),
        ("RESUMEN", row.summary.clone()),
        ("NUMERO", row.serial_prefix.clone()),
        ("NUMERO_1", row.counter_a.to_string()),
        ("NUMERO_2", row.counter_b.to_string()),
        ("FEC_DOC", row.expiry_date.clone()),
        ("MINIMO", row.minimum.to_string()),
        ("CANTSECUEN", row.quota.to_string()),
    ];
    for (name, value) in &fields {
        table
            .set_field(index, name, value)
            .unwrap_or_else(|e| panic!("set {}: {}", name, e));
    }
    if row.deleted {
        table.delete_row(index).expect("delete fixture row");
    }
}

/// An event sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Events recorded so far, oldest first.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("recording sink poisoned").clone()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, message: &str) {
        self.events
            .lock()
            .expect("recording sink poisoned")
            .push(message.to_string());
    }
}
