// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tape building and DOM reading for tapir
//!
//! Stage 2 of the parse: walks the structural index produced by
//! [`tapir_simd`], enforces the JSON grammar, and emits a compact tape of
//! 64-bit words plus a string buffer. Provides:
//!
//! - [`tape`] - the tape word format and document container
//! - [`number`] - scalar number parsing
//! - [`string_parse`] - string unescaping into the string buffer
//! - [`builder`] - the grammar state machine
//! - [`reader`] - random-access DOM views over a finished tape
//! - [`parser`] - the `Parser` front end tying stage 1 and stage 2 together

#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]

/// Grammar state machine writing the tape
pub mod builder;
/// Number parsing
pub mod number;
/// Parser front end
pub mod parser;
/// DOM views over a finished tape
pub mod reader;
/// String unescaping
pub mod string_parse;
/// Tape word format
pub mod tape;

pub use builder::{StreamStep, build_tape, build_tape_streaming};
pub use number::{ParsedNumber, parse_number};
pub use parser::Parser;
pub use reader::{DomArray, DomObject, DomValue, ValueType};
pub use string_parse::parse_string_into;
pub use tape::{TapeDocument, TapeTag};
