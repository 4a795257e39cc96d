// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parser configuration

/// Default nesting limit for objects and arrays.
pub const DEFAULT_MAX_DEPTH: u32 = 1024;

/// Options shared by the tape parser, the on-demand navigator, and document
/// streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum container nesting depth before a parse fails with
    /// `DepthError`.
    pub max_depth: u32,
    /// Grow internal buffers on demand. When `false`, a parse whose
    /// structural index outgrows the already-allocated capacity fails with
    /// `Capacity` instead of reallocating.
    pub expand_buffer_on_need: bool,
    /// Replace invalid UTF-8 sequences with U+FFFD while decoding strings
    /// instead of failing the whole parse with `Utf8Error`.
    pub allow_replacement_of_invalid_utf8: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserConfig {
    /// The default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            expand_buffer_on_need: true,
            allow_replacement_of_invalid_utf8: false,
        }
    }

    /// Set the maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Control whether internal buffers may grow during a parse.
    #[must_use]
    pub const fn with_expand_buffer_on_need(mut self, expand: bool) -> Self {
        self.expand_buffer_on_need = expand;
        self
    }

    /// Control replacement of invalid UTF-8 in decoded strings.
    #[must_use]
    pub const fn with_replacement_of_invalid_utf8(mut self, replace: bool) -> Self {
        self.allow_replacement_of_invalid_utf8 = replace;
        self
    }
}
