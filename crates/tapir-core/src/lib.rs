// SPDX-License-Identifier: MIT OR Apache-2.0
//! Core types, error handling, and padded buffers for tapir
//!
//! This crate provides the foundational types used across the tapir ecosystem:
//!
//! - [`error`] - Error taxonomy and Result alias
//! - [`buffer`] - Padded input buffers and file loading
//! - [`config`] - Parser configuration

#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]

/// Padded input buffers
pub mod buffer;
/// Parser configuration
pub mod config;
/// Error taxonomy for tapir operations
pub mod error;

// Re-exports for convenience
pub use buffer::{MAX_DOCUMENT_LEN, PADDING, PaddedBuffer, PaddedSlice};
pub use config::{DEFAULT_MAX_DEPTH, ParserConfig};
pub use error::{ErrorKind, Result};
