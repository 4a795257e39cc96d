// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural index construction
//!
//! Stage 1 of the parse: one pass over the padded input that classifies
//! bytes, tracks string literals, validates UTF-8, and emits the byte
//! offset of every structural character and every scalar start as a 32-bit
//! index. The index is terminated by a sentinel equal to the document
//! length so stage 2 can always look one token ahead.

use crate::bits::SetBits;
use crate::classify::{BLOCK_SIZE, CharacterBlock};
use crate::strings::StringScanner;
use crate::utf8::Utf8Validator;
use tapir_core::{ErrorKind, PaddedSlice, ParserConfig, Result};

/// Build a structural index into a fresh vector.
///
/// # Errors
///
/// See [`build_structural_index_into`].
pub fn build_structural_index(input: PaddedSlice<'_>, config: &ParserConfig) -> Result<Vec<u32>> {
    let mut indices = Vec::new();
    build_structural_index_into(input, config, &mut indices)?;
    Ok(indices)
}

/// Build a structural index into a reusable vector, clearing it first.
///
/// On success `indices` holds the strictly ascending offsets of every
/// structural character and scalar start, followed by one sentinel equal to
/// `input.len()`.
///
/// # Errors
///
/// - [`ErrorKind::Empty`] when the input holds no token at all.
/// - [`ErrorKind::UnclosedString`] when a string literal never closes.
/// - [`ErrorKind::Utf8Error`] when the input is not valid UTF-8 (suppressed
///   by [`ParserConfig::allow_replacement_of_invalid_utf8`]).
/// - [`ErrorKind::Capacity`] when the index would outgrow its capacity and
///   [`ParserConfig::expand_buffer_on_need`] is off.
/// - [`ErrorKind::MemAlloc`] when growing the index fails.
pub fn build_structural_index_into(
    input: PaddedSlice<'_>,
    config: &ParserConfig,
    indices: &mut Vec<u32>,
) -> Result<()> {
    index_into(input, config, indices, false)
}

/// Build a structural index for one window of a document stream.
///
/// Identical to [`build_structural_index_into`] except that a string or a
/// UTF-8 sequence still open at the end of the window is not an error: the
/// window may cut a document anywhere, and the cut document is re-parsed
/// from its own start in the next window.
///
/// # Errors
///
/// As [`build_structural_index_into`], minus `UnclosedString` and the
/// truncated-sequence case of `Utf8Error`.
pub fn build_structural_index_streaming_into(
    input: PaddedSlice<'_>,
    config: &ParserConfig,
    indices: &mut Vec<u32>,
) -> Result<()> {
    index_into(input, config, indices, true)
}

fn index_into(
    input: PaddedSlice<'_>,
    config: &ParserConfig,
    indices: &mut Vec<u32>,
    streaming: bool,
) -> Result<()> {
    let doc = input.document();
    indices.clear();

    // Worst case is one index per byte plus the sentinel ("[[[[" style
    // inputs), sized up front so the emission loop never reallocates.
    let worst_case = doc.len() + 1;
    if indices.capacity() < worst_case {
        if config.expand_buffer_on_need {
            indices
                .try_reserve_exact(worst_case)
                .map_err(|_| ErrorKind::MemAlloc)?;
        } else {
            return Err(ErrorKind::Capacity);
        }
    }

    let mut scanner = StringScanner::new();
    let mut validator = Utf8Validator::new();
    let validate_utf8 = !config.allow_replacement_of_invalid_utf8;
    let mut prev_scalar = 0u64;

    let mut base = 0usize;
    while base < doc.len() {
        let remaining = doc.len() - base;
        let mut scratch;
        let block: &[u8; BLOCK_SIZE] = if remaining >= BLOCK_SIZE {
            doc[base..base + BLOCK_SIZE]
                .try_into()
                .map_err(|_| ErrorKind::Capacity)?
        } else {
            // Space-filled tail block: spaces are whitespace, so the bytes
            // past the document produce no structurals and break any
            // pending pseudo-scalar run.
            scratch = [b' '; BLOCK_SIZE];
            scratch[..remaining].copy_from_slice(&doc[base..]);
            &scratch
        };

        let characters = CharacterBlock::classify(block);
        let strings = scanner.next(characters.quote, characters.backslash);
        if validate_utf8 {
            validator.update(&doc[base..base + remaining.min(BLOCK_SIZE)]);
        }

        let scalar = characters.scalar();
        let nonquote_scalar = scalar & !strings.quote;
        let follows_nonquote_scalar = (nonquote_scalar << 1) | prev_scalar;
        prev_scalar = nonquote_scalar >> 63;

        let pseudo_scalar_start = scalar & !follows_nonquote_scalar;
        let structurals =
            (characters.op | pseudo_scalar_start) & !strings.string_tail();
        for bit in SetBits(structurals) {
            indices.push((base + bit as usize) as u32);
        }
        base += BLOCK_SIZE;
    }

    if !streaming {
        scanner.finish()?;
    }
    if validate_utf8 {
        if streaming {
            validator.finish_streaming()?;
        } else {
            validator.finish()?;
        }
    }
    if indices.is_empty() {
        return Err(ErrorKind::Empty);
    }
    indices.push(doc.len() as u32);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapir_core::PaddedBuffer;

    fn index_of(text: &str) -> Vec<u32> {
        let buf = PaddedBuffer::from_str(text).unwrap();
        build_structural_index(buf.as_padded(), &ParserConfig::default()).unwrap()
    }

    fn tokens_of(text: &str) -> Vec<u8> {
        let bytes = text.as_bytes();
        let index = index_of(text);
        index[..index.len() - 1]
            .iter()
            .map(|&i| bytes[i as usize])
            .collect()
    }

    #[test]
    fn test_small_object() {
        let text = r#"{"a":1,"b":2}"#;
        let index = index_of(text);
        assert_eq!(index, vec![0, 1, 4, 5, 6, 7, 10, 11, 12, 13]);
        assert_eq!(tokens_of(text), b"{\":1,\":2}");
    }

    #[test]
    fn test_sentinel_is_document_length() {
        let text = "  [true, false]  ";
        let index = index_of(text);
        assert_eq!(*index.last().unwrap(), text.len() as u32);
    }

    #[test]
    fn test_strictly_ascending_and_outside_strings() {
        let text = r#"{"a{b":"c,d","e\"f":[1,"]"]}"#;
        let bytes = text.as_bytes();
        let index = index_of(text);
        let body = &index[..index.len() - 1];
        for pair in body.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        // Braces, commas, and brackets inside the string literals stay out.
        for &i in body {
            let b = bytes[i as usize];
            assert!(
                matches!(b, b'{' | b'}' | b'[' | b']' | b':' | b',' | b'"' | b'1'),
                "unexpected token byte {} at {i}",
                b as char
            );
        }
        assert_eq!(tokens_of(text), b"{\":\",\":[1,\"]}");
    }

    #[test]
    fn test_scalar_starts_once_per_token() {
        let text = "[truthy, 123.5e7, nullish]".replace("truthy", "true  ");
        // Each scalar contributes exactly its first byte.
        let index = index_of(&text);
        let bytes = text.as_bytes();
        let starts: Vec<u8> = index[..index.len() - 1]
            .iter()
            .map(|&i| bytes[i as usize])
            .collect();
        assert_eq!(starts, b"[t,1,n]");
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        for text in ["", "   ", "\n\t\r "] {
            let buf = PaddedBuffer::from_str(text).unwrap();
            assert_eq!(
                build_structural_index(buf.as_padded(), &ParserConfig::default()).unwrap_err(),
                ErrorKind::Empty
            );
        }
    }

    #[test]
    fn test_unclosed_string() {
        let buf = PaddedBuffer::from_str(r#"{"open": "value"#).unwrap();
        assert_eq!(
            build_structural_index(buf.as_padded(), &ParserConfig::default()).unwrap_err(),
            ErrorKind::UnclosedString
        );
    }

    #[test]
    fn test_invalid_utf8_reported_and_suppressed() {
        let buf = PaddedBuffer::new(b"[\"\xFF\"]".to_vec()).unwrap();
        assert_eq!(
            build_structural_index(buf.as_padded(), &ParserConfig::default()).unwrap_err(),
            ErrorKind::Utf8Error
        );
        let relaxed = ParserConfig::default().with_replacement_of_invalid_utf8(true);
        assert!(build_structural_index(buf.as_padded(), &relaxed).is_ok());
    }

    #[test]
    fn test_no_expand_requires_capacity() {
        let buf = PaddedBuffer::from_str("[1,2,3]").unwrap();
        let config = ParserConfig::default().with_expand_buffer_on_need(false);
        let mut indices = Vec::new();
        assert_eq!(
            build_structural_index_into(buf.as_padded(), &config, &mut indices).unwrap_err(),
            ErrorKind::Capacity
        );
        indices.reserve_exact(64);
        assert!(build_structural_index_into(buf.as_padded(), &config, &mut indices).is_ok());
    }

    #[test]
    fn test_streaming_mode_tolerates_cut_tails() {
        // A window cutting a document mid-string still indexes the
        // complete prefix.
        let buf = PaddedBuffer::from_str(r#"{"a":1} {"cut":"mid"#).unwrap();
        let mut indices = Vec::new();
        assert!(
            super::build_structural_index_streaming_into(
                buf.as_padded(),
                &ParserConfig::default(),
                &mut indices
            )
            .is_ok()
        );
        assert!(indices.contains(&6)); // the first document's close brace
    }

    #[test]
    fn test_block_boundary_token() {
        // A structural character exactly at byte 64.
        let mut text = String::from("[\"");
        text.push_str(&"x".repeat(61));
        text.push('"');
        text.push(',');
        text.push_str("1]");
        let index = index_of(&text);
        assert!(index.contains(&64));
        assert_eq!(tokens_of(&text), b"[\",1]");
    }
}
