//! # ECF Sequence Core
//!
//! Pure primitives for fiscal-receipt sequence numbering.
//!
//! This crate contains no I/O. It defines what a receipt type looks like,
//! which counters it owns, and how an issued number is rendered.
//!
//! ## Key Types
//!
//! - [`TypeCode`] - Validated three-character receipt type code
//! - [`Channel`] - One of the two independent counters of a type
//! - [`TypeDefinition`] - A decoded row of the sequence table
//! - [`Sequence`] - An issued sequence number and its text form
//! - [`EventSink`] - Fire-and-forget destination for allocation events

pub mod definition;
pub mod error;
pub mod events;
pub mod sequence;
pub mod types;

pub use definition::{derive_type_code, parse_lenient_i64, parse_lenient_u64, TypeDefinition};
pub use error::CoreError;
pub use events::{EventSink, NullSink};
pub use sequence::{Sequence, SEQUENCE_DIGITS, SEQUENCE_MAX};
pub use types::{Channel, TypeCode};
