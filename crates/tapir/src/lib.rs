// SPDX-License-Identifier: MIT OR Apache-2.0
//! tapir - SIMD-style JSON parsing
//!
//! A two-stage JSON parser in the simdjson mold: stage 1 scans the padded
//! input in 64-byte blocks, validating UTF-8 and emitting a structural
//! index; stage 2 builds a compact 64-bit-word tape. On top of those sit a
//! DOM-style tape reader, a lazy on-demand navigator that skips straight to
//! the values you ask for, and multi-document streams.
//!
//! # Parsing to a tape
//!
//! ```
//! let doc = tapir::parse(br#"{"pet":{"kind":"tapir","legs":4}}"#)?;
//! let pet = doc.root().get_object()?.at("pet")?.get_object()?;
//! assert_eq!(pet.at("kind")?.get_string()?, "tapir");
//! assert_eq!(pet.at("legs")?.get_u64()?, 4);
//! # Ok::<(), tapir::ErrorKind>(())
//! ```
//!
//! # On-demand navigation
//!
//! ```
//! use tapir::{OndemandParser, PaddedBuffer};
//!
//! let buf = PaddedBuffer::from_str(r#"{"a":{"b":2}}"#)?;
//! let doc = OndemandParser::new().iterate(buf.as_padded())?;
//! assert_eq!(doc.root().at_key("a")?.at_key("b")?.get_u64()?, 2);
//! # Ok::<(), tapir::ErrorKind>(())
//! ```
//!
//! # Document streams
//!
//! ```
//! use tapir::PaddedBuffer;
//!
//! let buf = PaddedBuffer::from_str("1 2 3")?;
//! let values: Vec<u64> = tapir::parse_many(buf.as_padded(), 64, 64)
//!     .map(|doc| doc.unwrap().root().get_u64().unwrap())
//!     .collect();
//! assert_eq!(values, vec![1, 2, 3]);
//! # Ok::<(), tapir::ErrorKind>(())
//! ```

#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]

pub use tapir_core::{
    DEFAULT_MAX_DEPTH, ErrorKind, MAX_DOCUMENT_LEN, PADDING, PaddedBuffer, PaddedSlice,
    ParserConfig, Result,
};
pub use tapir_ondemand::{Array, Document, Field, Object, OndemandParser, Value};
pub use tapir_simd::{build_structural_index, minify};
pub use tapir_stream::{DocumentStream, parse_many};
pub use tapir_tape::{
    DomArray, DomObject, DomValue, ParsedNumber, Parser, TapeDocument, TapeTag, ValueType,
};

/// Parse one document from unpadded bytes, copying them into a padded
/// buffer first.
///
/// # Errors
///
/// Any stage-1 or stage-2 error kind; see [`ErrorKind`].
pub fn parse(json: &[u8]) -> Result<TapeDocument> {
    let buffer = PaddedBuffer::from_slice(json)?;
    Parser::new().parse_buffer(&buffer)
}

/// Parse one document from a string slice.
///
/// # Errors
///
/// As [`parse`].
pub fn parse_str(json: &str) -> Result<TapeDocument> {
    parse(json.as_bytes())
}
