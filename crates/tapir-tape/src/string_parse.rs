// SPDX-License-Identifier: MIT OR Apache-2.0
//! String unescaping
//!
//! Copies a JSON string into the string buffer, decoding escapes on the
//! way. Each stored string is laid out as a little-endian `u32` byte
//! length, the decoded bytes, and one trailing NUL that is not counted by
//! the length.

use tapir_core::{ErrorKind, Result};

/// Decoded byte for each single-character escape, zero when invalid.
const ESCAPE_MAP: [u8; 256] = {
    let mut map = [0u8; 256];
    map[b'"' as usize] = 0x22;
    map[b'\\' as usize] = 0x5C;
    map[b'/' as usize] = 0x2F;
    map[b'b' as usize] = 0x08;
    map[b'f' as usize] = 0x0C;
    map[b'n' as usize] = 0x0A;
    map[b'r' as usize] = 0x0D;
    map[b't' as usize] = 0x09;
    map
};

/// Decode the string whose opening quote was just consumed.
///
/// `src` starts at the first content byte and must extend through the
/// closing quote (stage 1 guarantees strings close inside the document).
/// Appends `[len:u32 LE][bytes][0x00]` to `dst` and returns the offset of
/// the length prefix within `dst` plus the number of source bytes consumed,
/// including the closing quote.
///
/// # Errors
///
/// - [`ErrorKind::StringError`] for a bad escape, a lone surrogate, or an
///   unescaped control character.
/// - [`ErrorKind::UnclosedString`] when no closing quote exists in `src`.
pub fn parse_string_into(
    src: &[u8],
    replace_invalid_utf8: bool,
    dst: &mut Vec<u8>,
) -> Result<(usize, usize)> {
    let prefix = dst.len();
    dst.extend_from_slice(&[0u8; 4]);

    let mut p = 0usize;
    loop {
        // The next byte needing attention is a quote or a backslash;
        // everything before it is copied verbatim.
        let Some(k) = memchr::memchr2(b'"', b'\\', &src[p..]) else {
            dst.truncate(prefix);
            return Err(ErrorKind::UnclosedString);
        };
        let span = &src[p..p + k];
        if span.iter().any(|&b| b < 0x20) {
            dst.truncate(prefix);
            return Err(ErrorKind::StringError);
        }
        dst.extend_from_slice(span);
        p += k;
        if src[p] == b'"' {
            p += 1;
            break;
        }
        // Backslash: decode the escape that follows it.
        p += 1;
        match src.get(p).copied() {
            Some(b'u') => {
                p += 1;
                p = decode_unicode_escape(src, p, dst).inspect_err(|_| dst.truncate(prefix))?;
            }
            Some(c) => {
                let decoded = ESCAPE_MAP[c as usize];
                if decoded == 0 {
                    dst.truncate(prefix);
                    return Err(ErrorKind::StringError);
                }
                dst.push(decoded);
                p += 1;
            }
            None => {
                dst.truncate(prefix);
                return Err(ErrorKind::UnclosedString);
            }
        }
    }

    if replace_invalid_utf8 {
        replace_invalid(prefix + 4, dst);
    }

    let len = dst.len() - prefix - 4;
    dst[prefix..prefix + 4].copy_from_slice(&(len as u32).to_le_bytes());
    dst.push(0);
    Ok((prefix, p))
}

/// Decode `XXXX` (and a following low-surrogate escape when needed) at `p`,
/// append the code point as UTF-8, and return the position after the
/// escape.
fn decode_unicode_escape(src: &[u8], p: usize, dst: &mut Vec<u8>) -> Result<usize> {
    let high = hex4(src, p)?;
    let (code_point, next) = if (0xD800..0xDC00).contains(&high) {
        // High surrogate: only valid when a `\uXXXX` low surrogate follows.
        if src.get(p + 4) != Some(&b'\\') || src.get(p + 5) != Some(&b'u') {
            return Err(ErrorKind::StringError);
        }
        let low = hex4(src, p + 6)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(ErrorKind::StringError);
        }
        let combined = 0x10000 + (((high - 0xD800) << 10) | (low - 0xDC00));
        (combined, p + 10)
    } else if (0xDC00..0xE000).contains(&high) {
        // Lone low surrogate.
        return Err(ErrorKind::StringError);
    } else {
        (high, p + 4)
    };
    let Some(ch) = char::from_u32(code_point) else {
        return Err(ErrorKind::StringError);
    };
    let mut utf8 = [0u8; 4];
    dst.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
    Ok(next)
}

/// Read four hex digits at `p`.
fn hex4(src: &[u8], p: usize) -> Result<u32> {
    let mut value = 0u32;
    for k in 0..4 {
        let byte = src.get(p + k).copied().ok_or(ErrorKind::StringError)?;
        let nibble = match byte {
            b'0'..=b'9' => u32::from(byte - b'0'),
            b'a'..=b'f' => u32::from(byte - b'a') + 10,
            b'A'..=b'F' => u32::from(byte - b'A') + 10,
            _ => return Err(ErrorKind::StringError),
        };
        value = (value << 4) | nibble;
    }
    Ok(value)
}

/// Swap the decoded bytes from `from` onward for their lossy form when they
/// are not valid UTF-8. Escape decoding always produces valid sequences, so
/// only raw copied bytes can be affected.
fn replace_invalid(from: usize, dst: &mut Vec<u8>) {
    if simdutf8::basic::from_utf8(&dst[from..]).is_ok() {
        return;
    }
    let replaced = String::from_utf8_lossy(&dst[from..]).into_owned();
    dst.truncate(from);
    dst.extend_from_slice(replaced.as_bytes());
}
