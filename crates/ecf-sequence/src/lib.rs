//! # ECF Sequence
//!
//! Gapless numbering for electronic fiscal receipts (e-CF), backed by the
//! DBF table the rest of the invoicing system already shares.
//!
//! ## Overview
//!
//! Each receipt type (`E32`, `B03`, ...) owns one row of the table and two
//! independent counters, channels `A` and `B`. Issuing a number re-reads the
//! table, bumps the counter of the first live row whose serial prefix starts
//! with the type code, saves the table and returns the type code followed by
//! the new value padded to ten digits.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ecf_sequence::core::{Channel, NullSink, TypeCode};
//! use ecf_sequence::store::DbfStore;
//! use ecf_sequence::{ApiServer, SequenceService};
//!
//! async fn example() {
//!     let store = DbfStore::open("FAC_PF_M.DBF").unwrap();
//!     let service = SequenceService::new(store);
//!
//!     let seq = service
//!         .allocate(TypeCode::parse("E32").unwrap(), Channel::A)
//!         .await
//!         .unwrap();
//!     println!("{} ({})", seq, seq.number);
//!
//!     // Or expose it over HTTP
//!     let server = Arc::new(ApiServer::new(service, "api-key", Arc::new(NullSink)));
//!     let incoming = ecf_sequence::http::bind(([127, 0, 0, 1], 8080).into()).unwrap();
//!     ecf_sequence::http::serve(server, incoming, std::future::pending())
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ecf_sequence::core` - Type codes, channels, sequence formatting
//! - `ecf_sequence::store` - DBF codec and sequence stores

pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod telemetry;

// Re-export component crates
pub use ecf_sequence_core as core;
pub use ecf_sequence_store as store;

// Re-export main types for convenience
pub use config::{Cli, ServiceConfig};
pub use error::{Result, ServiceError};
pub use http::{ApiServer, SequenceRequest, SequenceResponse, API_KEY_HEADER};
pub use service::SequenceService;
pub use telemetry::init_tracing;
