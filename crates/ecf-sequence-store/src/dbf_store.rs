//! DBF-backed implementation of the SequenceStore trait.
//!
//! This is the allocation engine. Every call re-reads the table from disk
//! inside the store's exclusive section, so the counters it sees are always
//! the ones last persisted, and no two callers in the process can read the
//! same counter value.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use ecf_sequence_core::{
    Channel, EventSink, NullSink, Sequence, TypeDefinition, SEQUENCE_DIGITS, SEQUENCE_MAX,
};

use crate::columns::ColumnMap;
use crate::dbf::Table;
use crate::error::{Result, StoreError};
use crate::exclusive::{ExclusiveAccess, ExclusiveSection};
use crate::traits::SequenceStore;

/// Sequence store over a dBase/FoxPro table file.
pub struct DbfStore {
    path: PathBuf,
    columns: ColumnMap,
    section: ExclusiveSection,
    events: Arc<dyn EventSink>,
}

impl DbfStore {
    /// Open the table at `path`.
    ///
    /// The file is parsed once here so a bad path or a damaged table is
    /// reported at startup; nothing read now is reused by later calls.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let table = Table::open(&path)?;
        debug!(
            path = %path.display(),
            rows = table.row_count(),
            fields = table.fields().len(),
            "opened sequence table"
        );

        let store = Self {
            path,
            columns: ColumnMap::default(),
            section: ExclusiveSection::new(),
            events: Arc::new(NullSink),
        };
        let index = store.index_path();
        if !index.exists() {
            warn!(index = %index.display(), "compound index not found; continuing without it");
        }
        Ok(store)
    }

    /// Use a non-default column layout.
    pub fn with_columns(mut self, columns: ColumnMap) -> Self {
        self.columns = columns;
        self
    }

    /// Report allocation events to `sink`.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Path of the companion `.CDX` index, matching the table's extension case.
    pub fn index_path(&self) -> PathBuf {
        let ext = match self.path.extension().and_then(|e| e.to_str()) {
            Some(e) if e.chars().all(|c| c.is_ascii_lowercase()) => "cdx",
            _ => "CDX",
        };
        self.path.with_extension(ext)
    }

    fn list_locked(&self, _access: &ExclusiveAccess<'_>) -> Result<Vec<TypeDefinition>> {
        let table = Table::open(&self.path)?;
        Ok(table
            .rows()
            .filter(|row| !row.is_deleted())
            .map(|row| self.columns.decode(&row))
            .collect())
    }

    fn allocate_locked(
        &self,
        _access: &ExclusiveAccess<'_>,
        type_code: &str,
        channel: Channel,
    ) -> Result<Sequence> {
        if type_code.is_empty() {
            return Err(StoreError::NotFound(String::new()));
        }

        let mut table = Table::open(&self.path)?;
        let counter = self.columns.counter(channel);
        let width = table.field(counter)?.width();

        let matched = table
            .rows()
            .filter(|row| !row.is_deleted())
            .find(|row| {
                row.text(&self.columns.serial_prefix)
                    .map(|prefix| prefix.starts_with(type_code))
                    .unwrap_or(false)
            })
            .map(|row| row.uint(counter).map(|value| (row.index(), value)))
            .transpose()?;

        let (index, current) =
            matched.ok_or_else(|| StoreError::NotFound(type_code.to_string()))?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::FieldOverflow {
                field: counter.to_string(),
                width,
                value: format!("{}+1", current),
            })?;
        if next > SEQUENCE_MAX {
            return Err(StoreError::FieldOverflow {
                field: counter.to_string(),
                width: width.min(SEQUENCE_DIGITS),
                value: next.to_string(),
            });
        }

        debug!(type_code, %channel, row = index, current, next, "incrementing counter");
        table.set_field(index, counter, &next.to_string())?;
        table.save(&self.path)?;

        Ok(Sequence::new(type_code, next))
    }

    fn report_failure(&self, type_code: &str, channel: &str, e: &StoreError) {
        error!(type_code, channel, error = %e, "allocation failed");
        self.events
            .record(&format!("Error generating sequence: {}", e));
    }
}

impl SequenceStore for DbfStore {
    fn list_types(&self) -> Result<Vec<TypeDefinition>> {
        let access = self.section.enter();
        self.list_locked(&access).map_err(|e| {
            error!(error = %e, "listing type definitions failed");
            e
        })
    }

    fn allocate(&self, type_code: &str, channel: Channel) -> Result<Sequence> {
        let result = {
            let access = self.section.enter();
            self.allocate_locked(&access, type_code, channel)
        };

        match &result {
            Ok(sequence) => {
                info!(sequence = %sequence, %channel, "allocated sequence");
                self.events
                    .record(&format!("Generated sequence: {}", sequence));
            }
            Err(e) => self.report_failure(type_code, channel.as_str(), e),
        }
        result
    }

    fn allocate_str(&self, type_code: &str, channel: &str) -> Result<Sequence> {
        match Channel::parse(channel) {
            Ok(channel) => self.allocate(type_code, channel),
            Err(e) => {
                let e = StoreError::from(e);
                self.report_failure(type_code, channel, &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbf::TableBuilder;
    use std::sync::Mutex;
    use std::thread;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl EventSink for Recorder {
        fn record(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    /// Rows are `(prefix, counter_a, counter_b, deleted)`.
    fn write_table(path: &Path, rows: &[(&str, u64, u64, bool)]) {
        let mut table = TableBuilder::new()
            .numeric("COD_PF_F", 3, 0)
            .character("NOMBRE", 50)
            .character("NUMERO", 20)
            .numeric("NUMERO_1", 10, 0)
            .numeric("NUMERO_2", 10, 0)
            .build()
            .unwrap();
        for (i, (prefix, a, b, deleted)) in rows.iter().enumerate() {
            let row = table.append_row();
            table.set_field(row, "COD_PF_F", &i.to_string()).unwrap();
            table.set_field(row, "NOMBRE", &format!("ROW {}", i)).unwrap();
            table.set_field(row, "NUMERO", prefix).unwrap();
            table.set_field(row, "NUMERO_1", &a.to_string()).unwrap();
            table.set_field(row, "NUMERO_2", &b.to_string()).unwrap();
            if *deleted {
                table.delete_row(row).unwrap();
            }
        }
        table.save(path).unwrap();
    }

    fn setup(rows: &[(&str, u64, u64, bool)]) -> (tempfile::TempDir, DbfStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FAC_PF_M.DBF");
        write_table(&path, rows);
        let store = DbfStore::open(&path).unwrap();
        (dir, store)
    }

    #[test]
    fn test_allocate_increments_and_formats() {
        let (_dir, store) = setup(&[("E3200", 5, 0, false)]);

        let first = store.allocate("E32", Channel::A).unwrap();
        assert_eq!(first.text(), "E320000000006");
        assert_eq!(first.number, 6);

        let second = store.allocate("E32", Channel::A).unwrap();
        assert_eq!(second.text(), "E320000000007");
        assert_eq!(second.number, 7);
    }

    #[test]
    fn test_allocate_persists_to_disk() {
        let (_dir, store) = setup(&[("B03", 41, 0, false)]);
        store.allocate("B03", Channel::A).unwrap();

        let table = Table::open(store.path()).unwrap();
        assert_eq!(table.field_int(0, "NUMERO_1").unwrap(), 42);
    }

    #[test]
    fn test_channels_are_independent() {
        let (_dir, store) = setup(&[("B03", 10, 20, false)]);

        assert_eq!(store.allocate("B03", Channel::B).unwrap().number, 21);
        assert_eq!(store.allocate("B03", Channel::A).unwrap().number, 11);

        let types = store.list_types().unwrap();
        assert_eq!(types[0].counter_a, 11);
        assert_eq!(types[0].counter_b, 21);
    }

    #[test]
    fn test_deleted_rows_are_invisible() {
        let (_dir, store) = setup(&[("E3100", 100, 0, true), ("E3101", 7, 0, false)]);

        assert_eq!(store.allocate("E31", Channel::A).unwrap().number, 8);

        let types = store.list_types().unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].serial_prefix, "E3101");
    }

    #[test]
    fn test_first_match_wins() {
        let (_dir, store) = setup(&[("E3400", 1, 0, false), ("E3499", 50, 0, false)]);

        assert_eq!(store.allocate("E34", Channel::A).unwrap().number, 2);
        assert_eq!(store.allocate("E34", Channel::A).unwrap().number, 3);

        let types = store.list_types().unwrap();
        assert_eq!(types[1].counter_a, 50);
    }

    #[test]
    fn test_not_found_leaves_file_untouched() {
        let (_dir, store) = setup(&[("E3200", 5, 0, false)]);
        let before = std::fs::read(store.path()).unwrap();

        let err = store.allocate("ZZZ", Channel::A).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(code) if code == "ZZZ"));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);

        let err = store.allocate("", Channel::A).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_invalid_channel_rejected_before_io() {
        let (dir, store) = setup(&[("E3200", 5, 0, false)]);
        std::fs::remove_file(store.path()).unwrap();

        let err = store.allocate_str("E32", "Q").unwrap_err();
        assert!(matches!(err, StoreError::InvalidChannel(c) if c == "Q"));
        assert!(!dir.path().join("FAC_PF_M.DBF").exists());
    }

    #[test]
    fn test_invalid_channel_recorded_once() {
        let (_dir, store) = setup(&[("E3200", 5, 0, false)]);
        let before = std::fs::read(store.path()).unwrap();
        let recorder = Arc::new(Recorder::default());
        let store = store.with_event_sink(recorder.clone());

        let err = store.allocate_str("E32", "Q").unwrap_err();
        assert!(matches!(err, StoreError::InvalidChannel(_)));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);

        let events = recorder.0.lock().unwrap();
        assert_eq!(
            *events,
            vec![r#"Error generating sequence: invalid channel: "Q" (expected A or B)"#]
        );
    }

    #[test]
    fn test_allocate_str_ignores_case() {
        let (_dir, store) = setup(&[("E3200", 0, 3, false)]);
        assert_eq!(store.allocate_str("E32", "b").unwrap().number, 4);
    }

    #[test]
    fn test_unparsable_counter_treated_as_zero() {
        let (_dir, store) = setup(&[("E4400", 0, 0, false)]);
        let mut table = Table::open(store.path()).unwrap();
        table.set_field(0, "NUMERO_1", "garbage").unwrap();
        table.save(store.path()).unwrap();

        assert_eq!(store.allocate("E44", Channel::A).unwrap().number, 1);
    }

    #[test]
    fn test_counter_overflow_is_not_written() {
        let (_dir, store) = setup(&[("E4500", 9_999_999_999, 0, false)]);
        let before = std::fs::read(store.path()).unwrap();

        let err = store.allocate("E45", Channel::A).unwrap_err();
        assert!(matches!(err, StoreError::FieldOverflow { .. }));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_list_types_skips_nothing_but_deleted() {
        let (_dir, store) = setup(&[("E3200", 1, 2, false), ("B0", 0, 0, false)]);
        let types = store.list_types().unwrap();

        assert_eq!(types.len(), 2);
        assert_eq!(types[0].type_code, "E32");
        assert_eq!(types[0].name, "ROW 0");
        assert_eq!(types[1].type_code, "");
        assert_eq!(types[1].serial_prefix, "B0");
        assert_eq!(store.list_types().unwrap(), types);
    }

    #[test]
    fn test_open_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DbfStore::open(dir.path().join("missing.DBF")),
            Err(StoreError::Io(_))
        ));

        let garbage = dir.path().join("garbage.DBF");
        std::fs::write(&garbage, b"not a table").unwrap();
        assert!(matches!(DbfStore::open(&garbage), Err(StoreError::Format(_))));
    }

    #[test]
    fn test_index_path_follows_extension_case() {
        let (_dir, store) = setup(&[]);
        assert_eq!(store.index_path().extension().unwrap(), "CDX");

        let dir = tempfile::tempdir().unwrap();
        let lower = dir.path().join("seq.dbf");
        write_table(&lower, &[]);
        let store = DbfStore::open(&lower).unwrap();
        assert_eq!(store.index_path().extension().unwrap(), "cdx");
    }

    #[test]
    fn test_events_recorded() {
        let (_dir, store) = setup(&[("E3200", 5, 0, false)]);
        let recorder = Arc::new(Recorder::default());
        let store = store.with_event_sink(recorder.clone());

        store.allocate("E32", Channel::A).unwrap();
        store.allocate("XXX", Channel::A).unwrap_err();

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], "Generated sequence: E320000000006");
        assert!(events[1].starts_with("Error generating sequence: receipt type not found: XXX"));
    }

    #[test]
    fn test_custom_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SEQ.DBF");
        let mut table = TableBuilder::new()
            .character("PREFIX", 10)
            .numeric("NEXT_A", 12, 0)
            .numeric("NEXT_B", 12, 0)
            .build()
            .unwrap();
        let row = table.append_row();
        table.set_field(row, "PREFIX", "B11").unwrap();
        table.set_field(row, "NEXT_B", "99").unwrap();
        table.save(&path).unwrap();

        let columns = ColumnMap {
            serial_prefix: "PREFIX".into(),
            counter_a: "NEXT_A".into(),
            counter_b: "NEXT_B".into(),
            ..ColumnMap::default()
        };
        let store = DbfStore::open(&path).unwrap().with_columns(columns);
        assert_eq!(store.allocate("B11", Channel::B).unwrap().text(), "B110000000100");
    }

    #[test]
    fn test_wide_counter_column_capped_at_ten_digits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SEQ.DBF");
        let mut table = TableBuilder::new()
            .character("NUMERO", 20)
            .numeric("NUMERO_1", 12, 0)
            .numeric("NUMERO_2", 12, 0)
            .build()
            .unwrap();
        let row = table.append_row();
        table.set_field(row, "NUMERO", "E3200").unwrap();
        table.set_field(row, "NUMERO_1", "9999999998").unwrap();
        table.save(&path).unwrap();

        let store = DbfStore::open(&path).unwrap();
        let last = store.allocate("E32", Channel::A).unwrap();
        assert_eq!(last.text(), "E329999999999");
        let before = std::fs::read(&path).unwrap();

        let err = store.allocate("E32", Channel::A).unwrap_err();
        assert!(matches!(
            err,
            StoreError::FieldOverflow { ref field, width: 10, ref value }
                if field == "NUMERO_1" && value == "10000000000"
        ));
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(Table::open(&path).unwrap().field_int(0, "NUMERO_1").unwrap(), 9_999_999_999);
    }

    #[test]
    fn test_empty_table() {
        let (_dir, store) = setup(&[]);
        let before = std::fs::read(store.path()).unwrap();

        assert!(store.list_types().unwrap().is_empty());
        assert!(matches!(
            store.allocate("E32", Channel::A),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_concurrent_allocations_are_gapless() {
        let (_dir, store) = setup(&[("E3100", 1000, 0, false)]);
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    (0..10)
                        .map(|_| store.allocate("E31", Channel::A).unwrap().number)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut numbers: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1001..=1080).collect::<Vec<_>>());
    }
}
