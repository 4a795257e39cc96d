// SPDX-License-Identifier: MIT OR Apache-2.0
//! Document and cursor state
//!
//! An on-demand [`Document`] owns the structural index for its input and a
//! single forward cursor over it: the token position, the container depth,
//! and the sticky error. Value, array, and object handles all share the
//! document's cursor; the handles themselves only remember where in the
//! token stream they are valid.

use crate::value::Value;
use std::cell::Cell;
use tapir_core::{ErrorKind, PaddedSlice, ParserConfig, Result};
use tapir_simd::build_structural_index;

#[cfg(feature = "trace")]
macro_rules! trace_event {
    ($($t:tt)*) => { log::trace!($($t)*) };
}
#[cfg(not(feature = "trace"))]
macro_rules! trace_event {
    ($($t:tt)*) => {{}};
}

/// Front end producing on-demand documents.
#[derive(Debug, Default, Clone)]
pub struct OndemandParser {
    config: ParserConfig,
}

impl OndemandParser {
    /// A parser with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// A parser with an explicit configuration.
    #[must_use]
    pub const fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Run stage 1 and wrap the input in a lazily navigable document.
    ///
    /// # Errors
    ///
    /// Any stage-1 kind: `Empty`, `UnclosedString`, `Utf8Error`,
    /// `Capacity`, `MemAlloc`.
    pub fn iterate<'a>(&self, input: PaddedSlice<'a>) -> Result<Document<'a>> {
        let structurals = build_structural_index(input, &self.config)?;
        Ok(Document {
            input,
            structurals,
            config: self.config,
            pos: Cell::new(0),
            depth: Cell::new(0),
            error: Cell::new(None),
        })
    }
}

/// A lazily navigated document.
#[derive(Debug)]
pub struct Document<'a> {
    pub(crate) input: PaddedSlice<'a>,
    pub(crate) structurals: Vec<u32>,
    pub(crate) config: ParserConfig,
    pub(crate) pos: Cell<usize>,
    pub(crate) depth: Cell<u32>,
    pub(crate) error: Cell<Option<ErrorKind>>,
}

impl<'a> Document<'a> {
    /// The root value of the document. Meaningful only while the cursor is
    /// still at the start; binding it out of order reports
    /// `OutOfOrderIteration`.
    #[must_use]
    pub fn root<'c>(&'c self) -> Value<'c, 'a> {
        Value::new(self, 0, 0)
    }

    /// Depth of the cursor: 0 at the root, +1 per open container.
    #[must_use]
    pub fn current_depth(&self) -> u32 {
        self.depth.get()
    }

    /// Skip whatever remains of the document and verify nothing follows
    /// the root value.
    ///
    /// # Errors
    ///
    /// The latched error if any; [`ErrorKind::TapeError`] when tokens
    /// remain after the root value.
    pub fn finish(&self) -> Result<()> {
        if let Some(error) = self.error.get() {
            return Err(error);
        }
        if self.pos.get() == 0 {
            self.skip_one_value().map_err(|e| self.latch(e))?;
        } else {
            self.skip_to_depth(0).map_err(|e| self.latch(e))?;
        }
        if self.pos.get() != self.structurals.len() - 1 {
            return Err(self.latch(ErrorKind::TapeError));
        }
        Ok(())
    }

    /// Latch `error` (usage errors pass through without latching) and hand
    /// it back for propagation.
    pub(crate) fn latch(&self, error: ErrorKind) -> ErrorKind {
        if !error.is_usage_error() && self.error.get().is_none() {
            trace_event!("latching {error:?} at token {}", self.pos.get());
            self.error.set(Some(error));
        }
        error
    }

    /// The byte offset of the token at the cursor, without consuming it.
    pub(crate) fn peek_token(&self) -> Result<usize> {
        let pos = self.pos.get();
        if pos + 1 >= self.structurals.len() {
            return Err(ErrorKind::TapeError);
        }
        Ok(self.structurals[pos] as usize)
    }

    /// Consume the token at the cursor, maintaining the depth counter for
    /// container brackets.
    pub(crate) fn next_token(&self) -> Result<usize> {
        let offset = self.peek_token()?;
        self.pos.set(self.pos.get() + 1);
        match self.byte_at(offset) {
            b'{' | b'[' => {
                let depth = self.depth.get() + 1;
                if depth > self.config.max_depth {
                    return Err(ErrorKind::DepthError);
                }
                self.depth.set(depth);
            }
            b'}' | b']' => self.depth.set(self.depth.get().saturating_sub(1)),
            _ => {}
        }
        Ok(offset)
    }

    pub(crate) fn byte_at(&self, offset: usize) -> u8 {
        self.input.document()[offset]
    }

    /// Consume one whole value at the cursor: one token for scalars, the
    /// full bracket range for containers.
    pub(crate) fn skip_one_value(&self) -> Result<()> {
        let target = self.depth.get();
        let offset = self.next_token()?;
        if matches!(self.byte_at(offset), b'{' | b'[') {
            self.skip_to_depth(target)?;
        }
        Ok(())
    }

    /// Consume tokens until the cursor is back at `target` depth.
    pub(crate) fn skip_to_depth(&self, target: u32) -> Result<()> {
        while self.depth.get() > target {
            self.next_token()?;
        }
        Ok(())
    }

    /// Restore a previous `(pos, depth)` pair; used by unordered field
    /// lookup to wrap to the container start.
    pub(crate) fn rewind_to(&self, pos: usize, depth: u32) {
        self.pos.set(pos);
        self.depth.set(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapir_core::PaddedBuffer;

    #[test]
    fn test_iterate_runs_stage_one() {
        let buf = PaddedBuffer::from_str("   ").unwrap();
        assert_eq!(
            OndemandParser::new()
                .iterate(buf.as_padded())
                .unwrap_err(),
            ErrorKind::Empty
        );
        let buf = PaddedBuffer::from_str(r#"{"open": "#).unwrap();
        assert_eq!(
            OndemandParser::new()
                .iterate(buf.as_padded())
                .unwrap_err(),
            ErrorKind::UnclosedString
        );
    }

    #[test]
    fn test_finish_skips_untouched_root() {
        let buf = PaddedBuffer::from_str(r#"{"a": [1, 2, {"b": 3}]}"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        doc.finish().unwrap();
        assert_eq!(doc.current_depth(), 0);
    }

    #[test]
    fn test_finish_rejects_trailing_tokens() {
        let buf = PaddedBuffer::from_str("{} {}").unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        assert_eq!(doc.finish().unwrap_err(), ErrorKind::TapeError);
    }

    #[test]
    fn test_depth_limit_enforced_by_cursor() {
        let buf = PaddedBuffer::from_str("[[[[1]]]]").unwrap();
        let parser = OndemandParser::with_config(ParserConfig::default().with_max_depth(3));
        let doc = parser.iterate(buf.as_padded()).unwrap();
        assert_eq!(doc.finish().unwrap_err(), ErrorKind::DepthError);
    }
}
