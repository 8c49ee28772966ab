//! # rowbind
//!
//! Declarative marshaling between typed records and delimited text rows.
//!
//! A record type states once, per field, which column it maps to and (for
//! temporal fields) the format of that column. `rowbind` derives an ordered
//! list of field descriptors from that metadata, caches it per type, and uses
//! it to fill records from rows and to write records back out as rows.
//!
//! ## Field metadata
//!
//! ```text
//! "<column index>,<column name>[,<format>]"
//! ```
//!
//! The index positions the field when decoding. Encoding writes one cell per
//! bound field in declaration order. Fields tagged `""` or `"-"` are ignored.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//! use rowbind::{Decoder, Encoder, Record};
//! use std::collections::VecDeque;
//!
//! #[derive(Debug, Default, Record)]
//! struct Order {
//!     #[csv("0,id")]
//!     id: u64,
//!     #[csv("1,customer")]
//!     customer: String,
//!     #[csv("2,placed,%Y-%m-%dT%H:%M:%S")]
//!     placed: DateTime<Utc>,
//!     #[csv("3,discount")]
//!     discount: Option<f64>,
//! }
//!
//! let rows: VecDeque<Vec<String>> = VecDeque::from(vec![vec![
//!     "42".to_string(),
//!     "ada".to_string(),
//!     "2017-12-24T15:30:00".to_string(),
//!     String::new(),
//! ]]);
//!
//! let mut decoder = Decoder::new(rows);
//! let mut order = Order::default();
//! decoder.decode_next(&mut order)?;
//! assert_eq!(order.id, 42);
//! assert_eq!(order.discount, None);
//!
//! let mut encoder = Encoder::new(Vec::<Vec<String>>::new());
//! encoder.encode_one(&order)?;
//! assert_eq!(encoder.get_ref()[0], ["42", "ada", "2017-12-24T15:30:00", ""]);
//! # Ok::<(), rowbind::Error>(())
//! ```
//!
//! ## Supported field types
//!
//! - Signed and unsigned integers of every width, range-checked for that width
//! - `f32` and `f64`
//! - `String`, taken verbatim
//! - `chrono::DateTime<Utc>`, `DateTime<FixedOffset>`, `NaiveDateTime` and
//!   `NaiveDate` with a strftime format
//! - `Option<T>` of any of the above: empty cell reads as `None`
//! - Any type implementing [`ColumnValue`] registered in a [`CodecRegistry`]

#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![warn(missing_docs)]

pub mod cache;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod hook;
pub mod row;
pub mod schema;
pub mod tag;
pub mod temporal;

pub use cache::{DescriptorCache, derive_layout};
pub use codec::{Category, Codec, CodecRegistry, ColumnValue};
pub use config::{CodecConfig, CodecContext};
pub use decoder::{Decoder, Records};
pub use descriptor::{FieldDescriptor, FieldMeta, FieldSlot, RecordLayout};
pub use encoder::Encoder;
pub use error::{ConversionError, Error, Result};
pub use hook::{DecodeHook, EncodeHook};
pub use row::{DelimitedReader, DelimitedWriter, RowError, RowReader, RowWriter};
pub use schema::{Record, SchemaBuilder};
pub use tag::FieldTag;

#[cfg(feature = "derive")]
pub use rowbind_derive::Record;
