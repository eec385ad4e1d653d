//! # ECF Sequence Testkit
//!
//! Testing utilities for ECF sequence numbering.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: sequence tables in the legacy column layout, written to a
//!   temporary directory
//! - **Generators**: Proptest strategies for type codes, prefixes and counters
//! - **Recording sink**: an [`ecf_sequence_core::EventSink`] that keeps events
//!   for assertions
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ecf_sequence_testkit::fixtures::TableFixture;
//! use ecf_sequence_store::SequenceStore;
//! use ecf_sequence_core::Channel;
//!
//! let fixture = TableFixture::new();
//! let store = fixture.store();
//! let sequence = store.allocate("E32", Channel::A).unwrap();
//! assert_eq!(sequence.text(), "E320000000001");
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{legacy_layout, standard_rows, FixtureRow, RecordingSink, TableFixture};
pub use generators::{channel, counter, serial_prefix, type_code};
