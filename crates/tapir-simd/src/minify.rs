// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON minification
//!
//! Drops whitespace that lies outside string literals, leaving every other
//! byte untouched. Shares the stage-1 classifier and string scanner, so the
//! cost is one masked pass over the input.

use crate::bits::SetBits;
use crate::classify::{BLOCK_SIZE, CharacterBlock};
use crate::strings::StringScanner;
use tapir_core::{PaddedSlice, Result};

/// Append the minified form of `input` to `out`.
///
/// # Errors
///
/// Returns [`tapir_core::ErrorKind::UnclosedString`] when a string literal
/// never closes; the bytes already appended are left in `out`.
pub fn minify(input: PaddedSlice<'_>, out: &mut Vec<u8>) -> Result<()> {
    let doc = input.document();
    out.reserve(doc.len());
    let mut scanner = StringScanner::new();

    let mut base = 0usize;
    while base < doc.len() {
        let remaining = doc.len() - base;
        let mut scratch;
        let block: &[u8; BLOCK_SIZE] = if remaining >= BLOCK_SIZE {
            doc[base..base + BLOCK_SIZE]
                .try_into()
                .map_err(|_| tapir_core::ErrorKind::Capacity)?
        } else {
            scratch = [b' '; BLOCK_SIZE];
            scratch[..remaining].copy_from_slice(&doc[base..]);
            &scratch
        };

        let characters = CharacterBlock::classify(block);
        let strings = scanner.next(characters.quote, characters.backslash);
        let mut keep = !(characters.whitespace & !strings.in_string);
        if remaining < BLOCK_SIZE {
            keep &= (1u64 << remaining) - 1;
        }
        for bit in SetBits(keep) {
            out.push(block[bit as usize]);
        }
        base += BLOCK_SIZE;
    }

    scanner.finish()
}
