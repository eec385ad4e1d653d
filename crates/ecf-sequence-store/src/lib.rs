//! # ECF Sequence Store
//!
//! Storage for fiscal-receipt sequence counters. Counters live in a legacy
//! dBase/FoxPro table shared with the rest of the invoicing system; this
//! crate reads and rewrites that table directly.
//!
//! ## Key Types
//!
//! - [`SequenceStore`] - The trait for listing types and allocating numbers
//! - [`DbfStore`] - Allocation engine over a `.DBF` table file
//! - [`MemoryStore`] - In-memory store for tests
//! - [`Table`] - The table-file codec the engine is built on
//! - [`ColumnMap`] - Which columns hold the prefix and the two counters
//! - [`FileEventSink`] - Timestamped, append-only event log
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ecf_sequence_store::{DbfStore, SequenceStore};
//! use ecf_sequence_core::Channel;
//!
//! let store = DbfStore::open("FAC_PF_M.DBF").unwrap();
//! let sequence = store.allocate("E32", Channel::A).unwrap();
//! println!("{} ({})", sequence, sequence.number);
//! ```
//!
//! ## Design Notes
//!
//! - **Serialized access**: every operation runs inside an [`ExclusiveSection`]
//! - **No caching**: the table is re-read on every call
//! - **Atomic save**: the table is written to a temporary file and renamed
//!   over the original
//! - **First match wins**: with duplicate prefixes, the first live row in
//!   file order is used

pub mod columns;
pub mod dbf;
pub mod dbf_store;
pub mod error;
pub mod events;
pub mod exclusive;
pub mod memory;
pub mod traits;

pub use columns::ColumnMap;
pub use dbf::{Field, FieldKind, Row, Table, TableBuilder};
pub use dbf_store::DbfStore;
pub use error::{Result, StoreError};
pub use events::FileEventSink;
pub use exclusive::{ExclusiveAccess, ExclusiveSection};
pub use memory::MemoryStore;
pub use traits::SequenceStore;
