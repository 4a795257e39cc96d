// SPDX-License-Identifier: MIT OR Apache-2.0
//! Incremental UTF-8 validation
//!
//! Validates the input in the same 64-byte blocks stage 1 scans, so a
//! multi-byte sequence may straddle a block boundary. Up to three trailing
//! bytes of an incomplete sequence carry over into the next block; the error
//! flag is sticky and reported once, at the end of stage 1.

use tapir_core::{ErrorKind, Result};

/// Longest possible carry: a four-byte sequence missing its final byte.
const MAX_CARRY: usize = 3;

/// Streaming validator over byte blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Validator {
    carry: [u8; MAX_CARRY],
    carry_len: usize,
    error: bool,
}

impl Utf8Validator {
    /// A validator positioned before the first block.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            carry: [0; MAX_CARRY],
            carry_len: 0,
            error: false,
        }
    }

    /// Consume the next block of input bytes. Blocks are normally
    /// [`crate::BLOCK_SIZE`] long; the final block may be shorter.
    pub fn update(&mut self, block: &[u8]) {
        debug_assert!(block.len() <= crate::classify::BLOCK_SIZE);
        if self.error {
            return;
        }
        if self.carry_len == 0 && block.iter().fold(0u8, |acc, &b| acc | b) < 0x80 {
            return;
        }

        let mut joined = [0u8; MAX_CARRY + crate::classify::BLOCK_SIZE];
        joined[..self.carry_len].copy_from_slice(&self.carry[..self.carry_len]);
        joined[self.carry_len..self.carry_len + block.len()].copy_from_slice(block);
        let total = self.carry_len + block.len();

        let suffix = incomplete_suffix_len(&joined[..total]);
        let complete = total - suffix;
        if simdutf8::basic::from_utf8(&joined[..complete]).is_err() {
            self.error = true;
            self.carry_len = 0;
            return;
        }
        self.carry[..suffix].copy_from_slice(&joined[complete..total]);
        self.carry_len = suffix;
    }

    /// Report the validation outcome once all blocks are consumed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Utf8Error`] when any block held an invalid
    /// sequence or the input ended mid-sequence.
    pub const fn finish(&self) -> Result<()> {
        if self.error || self.carry_len != 0 {
            Err(ErrorKind::Utf8Error)
        } else {
            Ok(())
        }
    }

    /// As [`Utf8Validator::finish`], but tolerate a sequence cut off at the
    /// end of the input. Used for stream windows, whose tail may split a
    /// sequence that the re-windowed parse will see whole.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Utf8Error`] for invalid sequences only.
    pub const fn finish_streaming(&self) -> Result<()> {
        if self.error {
            Err(ErrorKind::Utf8Error)
        } else {
            Ok(())
        }
    }
}

/// Length of the trailing bytes that might begin a multi-byte sequence
/// completed by the next block. At most three bytes matter: a lead byte
/// announcing an n-byte sequence with fewer than n-1 continuations behind
/// it.
fn incomplete_suffix_len(buf: &[u8]) -> usize {
    for back in 1..=buf.len().min(MAX_CARRY) {
        let byte = buf[buf.len() - back];
        if byte < 0x80 {
            return 0;
        }
        if byte >= 0xC0 {
            let need = match byte {
                0xF0.. => 4,
                0xE0.. => 3,
                _ => 2,
            };
            return if need > back { back } else { 0 };
        }
        // Continuation byte: keep looking for the lead.
    }
    0
}
