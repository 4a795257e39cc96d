// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy for tapir operations
//!
//! Every fallible operation in the workspace returns [`ErrorKind`] as the
//! error half of a [`Result`]. Errors are plain values: the parsing core
//! never panics on malformed input and never carries payloads that would tie
//! an error to a particular buffer lifetime.

use thiserror::Error;

/// Result alias used across the tapir crates.
pub type Result<T> = core::result::Result<T, ErrorKind>;

/// The error kinds a parse, lookup, or typed access can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Document exceeds the configured or supported maximum size.
    #[error("this parser can't support a document that big")]
    Capacity,
    /// Growing an internal buffer failed.
    #[error("error allocating memory, we're most likely out of memory")]
    MemAlloc,
    /// The document structure is invalid: unexpected token, missing comma or
    /// colon, or unbalanced brace/bracket.
    #[error("the JSON document has an improper structure")]
    TapeError,
    /// Nesting deeper than the configured maximum depth.
    #[error("the JSON document was too deep (too many nested objects and arrays)")]
    DepthError,
    /// Bad escape sequence, unescaped control character, or lone surrogate
    /// inside a string.
    #[error("problem while parsing a string")]
    StringError,
    /// A value starting with `t` was not exactly `true`.
    #[error("problem while parsing an atom starting with the letter 't'")]
    TAtomError,
    /// A value starting with `f` was not exactly `false`.
    #[error("problem while parsing an atom starting with the letter 'f'")]
    FAtomError,
    /// A value starting with `n` was not exactly `null`.
    #[error("problem while parsing an atom starting with the letter 'n'")]
    NAtomError,
    /// Malformed number or an integer outside the representable range.
    #[error("problem while parsing a number")]
    NumberError,
    /// The input is not valid UTF-8.
    #[error("the input is not valid UTF-8")]
    Utf8Error,
    /// A string literal was never closed.
    #[error("a string is opened but never closed")]
    UnclosedString,
    /// The input held no JSON at all (empty or whitespace only).
    #[error("no structural element found")]
    Empty,
    /// A caller-provided buffer lacks the required trailing padding.
    #[error("the caller-provided buffer lacks the required trailing padding")]
    InsufficientPadding,
    /// A typed accessor was called against a value of a different kind.
    #[error("the JSON element does not have the requested type")]
    IncorrectType,
    /// An object lookup did not find the requested key.
    #[error("the JSON field referenced does not exist in this object")]
    NoSuchField,
    /// An array lookup was past the end of the array.
    #[error("attempted to access an element of a JSON array that is beyond its length")]
    IndexOutOfBounds,
    /// On-demand values were bound or iterated out of document order.
    #[error("objects and arrays can only be iterated when they are first encountered")]
    OutOfOrderIteration,
    /// Reading the input from a file failed.
    #[error("error reading the file")]
    IoError,
}

impl ErrorKind {
    /// Whether this kind reports misuse of an accessor rather than a defect
    /// in the document itself.
    #[must_use]
    pub const fn is_usage_error(self) -> bool {
        matches!(
            self,
            Self::IncorrectType
                | Self::NoSuchField
                | Self::IndexOutOfBounds
                | Self::OutOfOrderIteration
        )
    }
}
