//! dBase / Visual FoxPro table files.
//!
//! Only the parts of the format the sequence engine touches are decoded:
//! the header, the field descriptors, and fixed-width records with their
//! deletion flag. Everything else in the header (reserved bytes, descriptor
//! flags, the FoxPro backlink area) is carried through verbatim so a table
//! saved by this module is still readable by the application that owns it.
//!
//! Text is Latin-1: one byte per character.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, warn};

use ecf_sequence_core::{parse_lenient_i64, parse_lenient_u64};

use crate::error::{Result, StoreError};

const HEADER_LEN: usize = 32;
const DESCRIPTOR_LEN: usize = 32;
const NAME_LEN: usize = 11;
const HEADER_TERMINATOR: u8 = 0x0D;
const EOF_MARKER: u8 = 0x1A;
const LIVE_FLAG: u8 = b' ';
const DELETED_FLAG: u8 = b'*';

/// Version byte for a plain dBase III table without memo file.
pub const DBASE3: u8 = 0x03;

/// Column type, from the descriptor's type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Character,
    Numeric,
    Float,
    Date,
    Logical,
    Other(u8),
}

impl FieldKind {
    fn from_byte(b: u8) -> Self {
        match b {
            b'C' => FieldKind::Character,
            b'N' => FieldKind::Numeric,
            b'F' => FieldKind::Float,
            b'D' => FieldKind::Date,
            b'L' => FieldKind::Logical,
            other => FieldKind::Other(other),
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            FieldKind::Character => b'C',
            FieldKind::Numeric => b'N',
            FieldKind::Float => b'F',
            FieldKind::Date => b'D',
            FieldKind::Logical => b'L',
            FieldKind::Other(b) => b,
        }
    }

    /// Numbers are stored right-justified, everything else left-justified.
    fn right_aligned(self) -> bool {
        matches!(self, FieldKind::Numeric | FieldKind::Float)
    }
}

/// A column of the table.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    /// Byte offset within a record, counting the deletion flag.
    offset: usize,
    width: usize,
    decimals: u8,
    descriptor: [u8; DESCRIPTOR_LEN],
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width
    }
}

/// An in-memory copy of a whole table file.
#[derive(Debug, Clone)]
pub struct Table {
    version: u8,
    last_update: [u8; 3],
    reserved: [u8; 20],
    fields: Vec<Field>,
    /// Bytes between the descriptor terminator and the first record.
    header_tail: Vec<u8>,
    record_len: usize,
    records: Vec<Vec<u8>>,
}

impl Table {
    /// Read and parse the table at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        debug!(path = %path.display(), len = bytes.len(), "read table file");
        Self::from_bytes(&bytes)
    }

    /// Parse a table from its file contents.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN + 1 {
            return Err(StoreError::Format(format!(
                "file is {} bytes, shorter than a table header",
                bytes.len()
            )));
        }

        let version = bytes[0];
        let last_update = [bytes[1], bytes[2], bytes[3]];
        let declared_rows = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        let record_len = u16::from_le_bytes([bytes[10], bytes[11]]) as usize;
        let mut reserved = [0u8; 20];
        reserved.copy_from_slice(&bytes[12..HEADER_LEN]);

        if header_len <= HEADER_LEN || header_len > bytes.len() {
            return Err(StoreError::Format(format!(
                "header length {} out of range for a {} byte file",
                header_len,
                bytes.len()
            )));
        }
        if record_len == 0 {
            return Err(StoreError::Format("record length is zero".into()));
        }

        let mut fields = Vec::new();
        let mut pos = HEADER_LEN;
        let mut offset = 1;
        while pos < header_len && bytes[pos] != HEADER_TERMINATOR {
            if pos + DESCRIPTOR_LEN > header_len {
                return Err(StoreError::Format(
                    "field descriptor overruns the header".into(),
                ));
            }
            let mut descriptor = [0u8; DESCRIPTOR_LEN];
            descriptor.copy_from_slice(&bytes[pos..pos + DESCRIPTOR_LEN]);

            let name_bytes = &descriptor[..NAME_LEN];
            let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
            let width = descriptor[16] as usize;

            fields.push(Field {
                name: decode_latin1(&name_bytes[..name_end]).trim().to_string(),
                kind: FieldKind::from_byte(descriptor[11]),
                offset,
                width,
                decimals: descriptor[17],
                descriptor,
            });
            offset += width;
            pos += DESCRIPTOR_LEN;
        }

        if pos >= header_len {
            return Err(StoreError::Format("missing header terminator".into()));
        }
        if offset > record_len {
            return Err(StoreError::Format(format!(
                "fields span {} bytes but records are {} bytes",
                offset, record_len
            )));
        }
        let header_tail = bytes[pos + 1..header_len].to_vec();

        let data = &bytes[header_len..];
        let available = data.len() / record_len;
        if declared_rows > available {
            warn!(
                declared = declared_rows,
                present = available,
                "table is shorter than its header claims; reading complete records only"
            );
        }
        let records = data
            .chunks_exact(record_len)
            .take(declared_rows.min(available))
            .map(<[u8]>::to_vec)
            .collect();

        Ok(Self {
            version,
            last_update,
            reserved,
            fields,
            header_tail,
            record_len,
            records,
        })
    }

    /// Encode the table back into file contents.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header_len =
            HEADER_LEN + self.fields.len() * DESCRIPTOR_LEN + 1 + self.header_tail.len();
        let header_len = u16::try_from(header_len)
            .map_err(|_| StoreError::Format(format!("header length {} too large", header_len)))?;
        let record_len = u16::try_from(self.record_len).map_err(|_| {
            StoreError::Format(format!("record length {} too large", self.record_len))
        })?;
        let row_count = u32::try_from(self.records.len())
            .map_err(|_| StoreError::Format("too many rows".into()))?;

        let mut out =
            Vec::with_capacity(header_len as usize + self.records.len() * self.record_len + 1);
        out.push(self.version);
        out.extend_from_slice(&self.last_update);
        out.extend_from_slice(&row_count.to_le_bytes());
        out.extend_from_slice(&header_len.to_le_bytes());
        out.extend_from_slice(&record_len.to_le_bytes());
        out.extend_from_slice(&self.reserved);
        for field in &self.fields {
            out.extend_from_slice(&field.descriptor);
        }
        out.push(HEADER_TERMINATOR);
        out.extend_from_slice(&self.header_tail);
        for record in &self.records {
            out.extend_from_slice(record);
        }
        out.push(EOF_MARKER);
        Ok(out)
    }

    /// Write the whole table to `path`, replacing it atomically.
    ///
    /// The contents go to a temporary file in the same directory, are synced,
    /// and are then renamed over `path`. A crash mid-save leaves the previous
    /// file intact.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.stamp(Local::now().date_naive());
        let bytes = self.to_bytes()?;

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        if let Ok(meta) = fs::metadata(path) {
            fs::set_permissions(tmp.path(), meta.permissions())?;
        }
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %path.display(), len = bytes.len(), "saved table file");
        Ok(())
    }

    /// Set the header's last-update date.
    pub fn stamp(&mut self, date: NaiveDate) {
        let year = (date.year() - 1900).clamp(0, u8::MAX as i32) as u8;
        self.last_update = [year, date.month() as u8, date.day() as u8];
    }

    /// Last-update date from the header, if it is a valid date.
    pub fn last_update(&self) -> Option<NaiveDate> {
        let [y, m, d] = self.last_update;
        NaiveDate::from_ymd_opt(1900 + y as i32, m as u32, d as u32)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a column by name, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| StoreError::UnknownField(name.to_string()))
    }

    /// Number of rows, deleted ones included.
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// Borrow a row.
    pub fn row(&self, index: usize) -> Result<Row<'_>> {
        let record = self
            .records
            .get(index)
            .ok_or(StoreError::RowOutOfRange(index))?;
        Ok(Row {
            table: self,
            index,
            record,
        })
    }

    /// Iterate over every row in file order, deleted ones included.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records
            .iter()
            .enumerate()
            .map(move |(index, record)| Row {
                table: self,
                index,
                record,
            })
    }

    pub fn is_deleted(&self, index: usize) -> Result<bool> {
        Ok(self.row(index)?.is_deleted())
    }

    /// Trimmed text of a field.
    pub fn field_text(&self, index: usize, name: &str) -> Result<String> {
        self.row(index)?.text(name)
    }

    /// Integer value of a field; blank or unparsable text reads as 0.
    pub fn field_int(&self, index: usize, name: &str) -> Result<i64> {
        self.row(index)?.int(name)
    }

    /// Overwrite a field with `text`, padded to the field width.
    pub fn set_field(&mut self, index: usize, name: &str, text: &str) -> Result<()> {
        let field = self.field(name)?;
        let (range, kind, field_name) = (field.range(), field.kind, field.name.clone());

        let encoded = encode_latin1(text);
        let width = range.len();
        if encoded.len() > width {
            return Err(StoreError::FieldOverflow {
                field: field_name,
                width,
                value: text.to_string(),
            });
        }

        let record = self
            .records
            .get_mut(index)
            .ok_or(StoreError::RowOutOfRange(index))?;
        let cell = &mut record[range];
        cell.fill(b' ');
        if kind.right_aligned() {
            cell[width - encoded.len()..].copy_from_slice(&encoded);
        } else {
            cell[..encoded.len()].copy_from_slice(&encoded);
        }
        Ok(())
    }

    /// Append a blank, live row and return its index.
    pub fn append_row(&mut self) -> usize {
        let mut record = vec![b' '; self.record_len];
        record[0] = LIVE_FLAG;
        self.records.push(record);
        self.records.len() - 1
    }

    /// Mark a row deleted without removing it.
    pub fn delete_row(&mut self, index: usize) -> Result<()> {
        let record = self
            .records
            .get_mut(index)
            .ok_or(StoreError::RowOutOfRange(index))?;
        record[0] = DELETED_FLAG;
        Ok(())
    }
}

/// A borrowed view of one record.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
    record: &'a [u8],
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_deleted(&self) -> bool {
        self.record[0] == DELETED_FLAG
    }

    /// Raw bytes of a field.
    pub fn raw(&self, name: &str) -> Result<&'a [u8]> {
        let field = self.table.field(name)?;
        self.record
            .get(field.range())
            .ok_or_else(|| StoreError::Format(format!("field {} past end of record", field.name)))
    }

    /// Field text with surrounding blanks and NUL padding removed.
    pub fn text(&self, name: &str) -> Result<String> {
        let raw = self.raw(name)?;
        Ok(decode_latin1(raw)
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .to_string())
    }

    /// Signed integer value; blank or unparsable text reads as 0.
    pub fn int(&self, name: &str) -> Result<i64> {
        Ok(parse_lenient_i64(&self.text(name)?))
    }

    /// Unsigned integer value; blank, negative or unparsable text reads as 0.
    pub fn uint(&self, name: &str) -> Result<u64> {
        Ok(parse_lenient_u64(&self.text(name)?))
    }
}

/// Builds a new, empty table. Used by tooling and tests; the sequence
/// engine never creates tables.
#[derive(Debug, Default)]
pub struct TableBuilder {
    fields: Vec<(String, FieldKind, usize, u8)>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character(mut self, name: &str, width: usize) -> Self {
        self.fields
            .push((name.to_string(), FieldKind::Character, width, 0));
        self
    }

    pub fn numeric(mut self, name: &str, width: usize, decimals: u8) -> Self {
        self.fields
            .push((name.to_string(), FieldKind::Numeric, width, decimals));
        self
    }

    pub fn date(mut self, name: &str) -> Self {
        self.fields.push((name.to_string(), FieldKind::Date, 8, 0));
        self
    }

    pub fn logical(mut self, name: &str) -> Self {
        self.fields.push((name.to_string(), FieldKind::Logical, 1, 0));
        self
    }

    pub fn build(self) -> Result<Table> {
        if self.fields.is_empty() {
            return Err(StoreError::Format("a table needs at least one field".into()));
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        let mut offset = 1;
        for (name, kind, width, decimals) in self.fields {
            if name.is_empty() || name.len() >= NAME_LEN || !name.is_ascii() {
                return Err(StoreError::Format(format!("invalid field name {:?}", name)));
            }
            let width_byte = u8::try_from(width)
                .ok()
                .filter(|w| *w > 0)
                .ok_or_else(|| StoreError::Format(format!("invalid width {} for {}", width, name)))?;

            let mut descriptor = [0u8; DESCRIPTOR_LEN];
            descriptor[..name.len()].copy_from_slice(name.as_bytes());
            descriptor[11] = kind.to_byte();
            descriptor[16] = width_byte;
            descriptor[17] = decimals;

            fields.push(Field {
                name,
                kind,
                offset,
                width,
                decimals,
                descriptor,
            });
            offset += width;
        }

        let mut table = Table {
            version: DBASE3,
            last_update: [0; 3],
            reserved: [0; 20],
            fields,
            header_tail: Vec::new(),
            record_len: offset,
            records: Vec::new(),
        };
        table.stamp(Local::now().date_naive());
        Ok(table)
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
