// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parser front end
//!
//! Owns the reusable stage-1 scratch (the structural index) and the
//! configuration, and runs both stages. Documents returned by
//! [`Parser::parse`] are self-contained; the parser only keeps scratch
//! capacity between parses.

use crate::builder::build_tape;
use crate::tape::TapeDocument;
use tapir_core::{PaddedBuffer, PaddedSlice, ParserConfig, Result};
use tapir_simd::build_structural_index_into;

/// A reusable two-stage JSON parser.
#[derive(Debug, Default)]
pub struct Parser {
    config: ParserConfig,
    structurals: Vec<u32>,
}

impl Parser {
    /// A parser with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// A parser with an explicit configuration.
    #[must_use]
    pub const fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            structurals: Vec::new(),
        }
    }

    /// A parser whose structural index is pre-sized for documents up to
    /// `input_capacity` bytes. Useful with
    /// [`ParserConfig::expand_buffer_on_need`] off, where a parse never
    /// allocates and larger documents fail with `Capacity`.
    ///
    /// # Errors
    ///
    /// [`tapir_core::ErrorKind::MemAlloc`] when the reservation fails.
    pub fn allocate(config: ParserConfig, input_capacity: usize) -> Result<Self> {
        let mut structurals = Vec::new();
        structurals
            .try_reserve_exact(input_capacity + 1)
            .map_err(|_| tapir_core::ErrorKind::MemAlloc)?;
        Ok(Self {
            config,
            structurals,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse one complete document.
    ///
    /// # Errors
    ///
    /// Any stage-1 or stage-2 error kind; see the crate-level docs.
    pub fn parse(&mut self, input: PaddedSlice<'_>) -> Result<TapeDocument> {
        build_structural_index_into(input, &self.config, &mut self.structurals)?;
        build_tape(input, &self.structurals, &self.config)
    }

    /// Parse one complete document from an owned padded buffer.
    ///
    /// # Errors
    ///
    /// As [`Parser::parse`].
    pub fn parse_buffer(&mut self, input: &PaddedBuffer) -> Result<TapeDocument> {
        self.parse(input.as_padded())
    }
}
