// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lazy on-demand JSON navigation for tapir
//!
//! Walks the stage-1 structural index directly, without building a tape.
//! Values are parsed only when the caller binds them to a typed result, so
//! a query for one field of a large document touches only the bytes on the
//! way to it.
//!
//! - [`document`] - the iterated document and its cursor
//! - [`value`] - lazy value handles and typed binds
//! - [`array`] - array iteration
//! - [`object`] - object iteration and field lookup
//!
//! The cursor moves strictly forward (except for the wrap-around of
//! unordered field lookup). Errors are sticky: once latched, every further
//! operation reports the same error, and iterators yield it exactly once
//! before terminating.

#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]

/// Array iteration
pub mod array;
/// Document and cursor state
pub mod document;
/// Object iteration and lookup
pub mod object;
/// Lazy value handles
pub mod value;

pub use array::Array;
pub use document::{Document, OndemandParser};
pub use object::{Field, Object};
pub use value::Value;
