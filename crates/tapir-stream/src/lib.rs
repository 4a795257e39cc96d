// SPDX-License-Identifier: MIT OR Apache-2.0
//! Multi-document JSON streams for tapir
//!
//! Parses documents concatenated in one buffer, separated only by
//! whitespace. The input is consumed in windows of a caller-chosen size:
//! stage 1 runs once per window, then stage 2 peels complete documents off
//! the window's structural index one at a time. A document cut by the end
//! of its window is re-parsed from its own first byte in a fresh window; a
//! document larger than the whole window yields `Capacity`.

#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]

use tapir_core::{ErrorKind, MAX_DOCUMENT_LEN, PaddedBuffer, PaddedSlice, ParserConfig, Result};
use tapir_simd::build_structural_index_streaming_into;
use tapir_tape::builder::{StreamStep, build_tape_streaming};
use tapir_tape::tape::TapeDocument;

/// Whitespace as JSON defines it.
const fn is_json_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

/// One window of the input: a padded copy of the slice plus its structural
/// index. The copy gives the window clean zero padding, so a token cut off
/// by the window edge cannot leak into the bytes of the next document.
struct Window {
    buffer: PaddedBuffer,
    structurals: Vec<u32>,
    /// Absolute offset of the window's first byte.
    base: usize,
    /// Absolute offset just past the window's last byte.
    end: usize,
    /// Next token to hand to stage 2.
    token: usize,
    /// Tokens at and past this position belong to a document the window
    /// cuts off; stage 2 never sees them.
    limit: usize,
}

/// Index of the token just past the last document that completes inside
/// the window. Containers complete when their bracket depth returns to
/// zero; a root scalar completes when any token follows it (its terminator
/// is then inside the window). The final token of a cut window never
/// completes a scalar document, since the scalar's bytes may continue past
/// the edge.
fn last_complete_token(structurals: &[u32], bytes: &[u8], window_is_final: bool) -> usize {
    let tokens = &structurals[..structurals.len() - 1];
    if window_is_final {
        return tokens.len();
    }
    let mut depth = 0u32;
    let mut safe = 0;
    for (k, &offset) in tokens.iter().enumerate() {
        match bytes[offset as usize] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    safe = k + 1;
                }
            }
            _ if depth == 0 && k + 1 < tokens.len() => safe = k + 1,
            _ => {}
        }
    }
    safe
}

/// An iterator of parsed documents over a concatenated input.
pub struct DocumentStream<'a> {
    input: PaddedSlice<'a>,
    window_size: usize,
    max_doc_size: usize,
    config: ParserConfig,
    start: usize,
    window: Option<Window>,
    current_index: usize,
    finished: bool,
}

impl<'a> DocumentStream<'a> {
    /// Stream the documents in `input`, running stage 1 over
    /// `window_size`-byte slices. `max_doc_size` bounds the size of any
    /// single document; documents larger than either bound yield
    /// [`ErrorKind::Capacity`].
    #[must_use]
    pub const fn new(
        input: PaddedSlice<'a>,
        window_size: usize,
        max_doc_size: usize,
        config: ParserConfig,
    ) -> Self {
        Self {
            input,
            window_size,
            max_doc_size,
            config,
            start: 0,
            window: None,
            current_index: 0,
            finished: false,
        }
    }

    /// As [`DocumentStream::new`] with `max_doc_size` equal to the window.
    #[must_use]
    pub const fn with_window(input: PaddedSlice<'a>, window_size: usize) -> Self {
        Self::new(input, window_size, window_size, ParserConfig::new())
    }

    /// Byte offset of the most recently yielded document within the input.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    fn finish_with(&mut self, error: ErrorKind) -> Option<Result<TapeDocument>> {
        self.finished = true;
        Some(Err(error))
    }

    /// Run stage 1 over the next window. Returns `None` when the input is
    /// exhausted, `Some(Err(..))` on a fatal condition.
    fn open_window(&mut self) -> Option<Result<()>> {
        let doc = self.input.document();
        while self.start < doc.len() && is_json_whitespace(doc[self.start]) {
            self.start += 1;
        }
        if self.start >= doc.len() {
            return None;
        }
        let end = self.start.saturating_add(self.window_size).min(doc.len());
        let buffer = match PaddedBuffer::from_slice(&doc[self.start..end]) {
            Ok(buffer) => buffer,
            Err(error) => return Some(Err(error)),
        };
        let mut structurals = Vec::new();
        match build_structural_index_streaming_into(
            buffer.as_padded(),
            &self.config,
            &mut structurals,
        ) {
            Ok(()) => {
                let limit =
                    last_complete_token(&structurals, buffer.document(), end >= doc.len());
                self.window = Some(Window {
                    buffer,
                    structurals,
                    base: self.start,
                    end,
                    token: 0,
                    limit,
                });
                Some(Ok(()))
            }
            // A non-empty suffix with no token at all means the window is
            // too small to hold even the start of a document.
            Err(ErrorKind::Empty) if end < doc.len() => Some(Err(ErrorKind::Capacity)),
            Err(ErrorKind::Empty) => None,
            Err(error) => Some(Err(error)),
        }
    }
}

impl Iterator for DocumentStream<'_> {
    type Item = Result<TapeDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.window_size > MAX_DOCUMENT_LEN {
            return self.finish_with(ErrorKind::Capacity);
        }
        loop {
            if self.window.is_none() {
                match self.open_window()? {
                    Ok(()) => {}
                    Err(error) => return self.finish_with(error),
                }
            }
            let Some(window) = self.window.as_mut() else {
                return None;
            };

            let token_count = window.structurals.len() - 1;
            if window.token >= window.limit {
                if window.limit < token_count {
                    // The remaining tokens belong to a document the window
                    // cuts off; re-parse it from its own first byte.
                    let doc_start = window.base + window.structurals[window.limit] as usize;
                    if doc_start == window.base {
                        // It begins the window and still does not fit: the
                        // window is smaller than the document.
                        return self.finish_with(ErrorKind::Capacity);
                    }
                    self.start = doc_start;
                } else {
                    // Window cleanly exhausted; anything left is whitespace.
                    self.start = window.end;
                }
                self.window = None;
                continue;
            }

            let doc_start = window.base + window.structurals[window.token] as usize;
            let step = build_tape_streaming(
                window.buffer.as_padded(),
                &window.structurals[..=window.limit],
                window.token,
                &self.config,
            );
            match step {
                Ok(StreamStep::Document {
                    document,
                    next_token,
                }) => {
                    // The entry at `next_token` is the next document's
                    // first token or the sentinel; either bounds this one.
                    let doc_end = window.base + window.structurals[next_token] as usize;
                    if doc_end - doc_start > self.max_doc_size {
                        return self.finish_with(ErrorKind::Capacity);
                    }
                    window.token = next_token;
                    self.current_index = doc_start;
                    return Some(Ok(document));
                }
                Ok(StreamStep::Truncated) => {
                    // Within the complete region this means unbalanced
                    // brackets at the end of the input.
                    return self.finish_with(ErrorKind::TapeError);
                }
                Err(error) => return self.finish_with(error),
            }
        }
    }
}

/// Convenience constructor mirroring the tape parser's entry points.
#[must_use]
pub const fn parse_many(
    input: PaddedSlice<'_>,
    window_size: usize,
    max_doc_size: usize,
) -> DocumentStream<'_> {
    DocumentStream::new(input, window_size, max_doc_size, ParserConfig::new())
}
