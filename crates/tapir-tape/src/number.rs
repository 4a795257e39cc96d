// SPDX-License-Identifier: MIT OR Apache-2.0
//! Number parsing
//!
//! Parses one JSON number starting at byte 0 of the given slice. The caller
//! guarantees that a terminating byte exists inside the slice: either the
//! padded input region or a scratch copy with a trailing space. Parsing is
//! deterministic and produces either one typed value or `NumberError`.
//!
//! Integers follow the 64-bit rules: up to 19 digits always resolve
//! exactly; a 20-digit positive number is accepted only when it starts with
//! `1` and exceeds `i64::MAX` (so it lands in `u64`); `-2^63` is the lone
//! negative value needing the 20th bit. Floats take the Clinger fast path
//! when the decimal power is within `10^±22` and the mantissa fits 53 bits
//! (both factors then being exact in binary64); everything else goes through
//! `lexical-core`, which rounds to nearest-even bit-exactly. Infinities and
//! NaN are rejected.

use tapir_core::{ErrorKind, Result};
use tapir_simd::classify::is_structural_or_whitespace;

/// One parsed number, already classified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedNumber {
    /// Fits a signed 64-bit integer.
    I64(i64),
    /// Fits only an unsigned 64-bit integer.
    U64(u64),
    /// A float, rounded to nearest-even.
    F64(f64),
}

/// Exact powers of ten representable in binary64.
const POWER_OF_TEN: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Largest mantissa exactly representable in binary64: 2^53 - 1.
const MAX_EXACT_MANTISSA: u64 = 9_007_199_254_740_991;

/// Decimal exponents outside this range cannot take any fast path:
/// below, the value is at best subnormal; above, it overflows.
const SMALLEST_POWER: i64 = -325;
const LARGEST_POWER: i64 = 308;

#[inline]
fn byte_at(src: &[u8], p: usize) -> u8 {
    src.get(p).copied().unwrap_or(0)
}

#[inline]
const fn digit(byte: u8) -> Option<u64> {
    let d = byte.wrapping_sub(b'0');
    if d <= 9 { Some(d as u64) } else { None }
}

/// Check whether the next 8 bytes are all ASCII digits.
#[inline]
fn is_made_of_eight_digits_fast(src: &[u8]) -> bool {
    let Some(chunk) = src.first_chunk::<8>() else {
        return false;
    };
    let val = u64::from_le_bytes(*chunk);
    ((val & 0xF0F0_F0F0_F0F0_F0F0)
        | ((val.wrapping_add(0x0606_0606_0606_0606) & 0xF0F0_F0F0_F0F0_F0F0) >> 4))
        == 0x3333_3333_3333_3333
}

/// Convert 8 ASCII digits to their value in three SWAR multiply steps.
#[inline]
fn parse_eight_digits_unrolled(src: &[u8]) -> u64 {
    let Some(chunk) = src.first_chunk::<8>() else {
        return 0;
    };
    let mut val = u64::from_le_bytes(*chunk);
    val = (val & 0x0F0F_0F0F_0F0F_0F0F).wrapping_mul(2561) >> 8;
    val = (val & 0x00FF_00FF_00FF_00FF).wrapping_mul(6_553_601) >> 16;
    (val & 0x0000_FFFF_0000_FFFF).wrapping_mul(42_949_672_960_001) >> 32
}

/// Parse the number at the start of `src`.
///
/// Returns the classified value and the number of bytes it occupied. The
/// byte after the number must be structural or whitespace.
///
/// # Errors
///
/// [`ErrorKind::NumberError`] on any malformed or unrepresentable number.
pub fn parse_number(src: &[u8]) -> Result<(ParsedNumber, usize)> {
    let negative = src.first() == Some(&b'-');
    let mut p = usize::from(negative);

    let start_digits = p;
    let mut i: u64 = 0;
    while let Some(d) = digit(byte_at(src, p)) {
        // Overflow is deliberate; the digit-count rules below decide
        // whether the accumulated value can be trusted.
        i = i.wrapping_mul(10).wrapping_add(d);
        p += 1;
    }
    let mut digit_count = p - start_digits;
    if digit_count == 0 || (byte_at(src, start_digits) == b'0' && digit_count > 1) {
        return Err(ErrorKind::NumberError);
    }

    let mut exponent: i64 = 0;
    let mut is_float = false;
    if byte_at(src, p) == b'.' {
        is_float = true;
        p += 1;
        parse_decimal(src, &mut p, &mut i, &mut exponent)?;
        digit_count = p - start_digits; // one high: includes the '.'
    }
    if matches!(byte_at(src, p), b'e' | b'E') {
        is_float = true;
        p += 1;
        parse_exponent(src, &mut p, &mut exponent)?;
    }

    if !is_structural_or_whitespace(byte_at(src, p)) {
        return Err(ErrorKind::NumberError);
    }

    if is_float {
        let value = compute_float(&src[..p], negative, i, start_digits, digit_count, exponent)?;
        return Ok((ParsedNumber::F64(value), p));
    }

    // The longest negative 64-bit number has 19 digits, the longest
    // positive one 20.
    let longest_digit_count = if negative { 19 } else { 20 };
    if digit_count > longest_digit_count {
        return Err(ErrorKind::NumberError);
    }
    if digit_count == longest_digit_count {
        if negative {
            // 19 digits never wrap u64, so `i` is exact here.
            if i > (i64::MAX as u64) + 1 {
                return Err(ErrorKind::NumberError);
            }
            return Ok((ParsedNumber::I64((i.wrapping_neg()) as i64), p));
        }
        // A 20-digit number is in range only when it starts with 1 (the
        // u64 maximum has 20 digits and starts with 1) and genuinely
        // exceeds i64::MAX: a wrapped accumulation would have landed below
        // the smallest 20-digit number, hence below i64::MAX, and is
        // rejected by the same test.
        if src[0] != b'1' || i <= i64::MAX as u64 {
            return Err(ErrorKind::NumberError);
        }
    }

    let value = if i > i64::MAX as u64 && !negative {
        ParsedNumber::U64(i)
    } else if negative {
        ParsedNumber::I64((i.wrapping_neg()) as i64)
    } else {
        ParsedNumber::I64(i as i64)
    };
    Ok((value, p))
}

/// Parse the fractional digits after the `.`, accumulating into `i` and
/// lowering `exponent` by one per digit.
fn parse_decimal(src: &[u8], p: &mut usize, i: &mut u64, exponent: &mut i64) -> Result<()> {
    let first_after_period = *p;
    // Bulk step: fractions with many digits are common enough to pay off.
    if is_made_of_eight_digits_fast(&src[*p..]) {
        *i = i
            .wrapping_mul(100_000_000)
            .wrapping_add(parse_eight_digits_unrolled(&src[*p..]));
        *p += 8;
    }
    while let Some(d) = digit(byte_at(src, *p)) {
        *i = i.wrapping_mul(10).wrapping_add(d);
        *p += 1;
    }
    *exponent = first_after_period as i64 - *p as i64;
    if *exponent == 0 {
        // A decimal point with no digits after it.
        return Err(ErrorKind::NumberError);
    }
    Ok(())
}

/// Parse the exponent digits after `e`/`E`, adding into `exponent`.
fn parse_exponent(src: &[u8], p: &mut usize, exponent: &mut i64) -> Result<()> {
    let neg_exp = byte_at(src, *p) == b'-';
    if neg_exp || byte_at(src, *p) == b'+' {
        *p += 1;
    }
    let start_exp = *p;
    let mut exp_number: i64 = 0;
    while let Some(d) = digit(byte_at(src, *p)) {
        exp_number = exp_number.wrapping_mul(10).wrapping_add(d as i64);
        *p += 1;
    }
    if *p == start_exp || *p > start_exp + 18 {
        // 1e000000000000000000001 is legal: skip leading zeroes before
        // deciding the exponent really overflows.
        let mut significant = start_exp;
        while byte_at(src, significant) == b'0' {
            significant += 1;
        }
        if *p == significant || *p > significant + 18 {
            return Err(ErrorKind::NumberError);
        }
    }
    *exponent += if neg_exp { -exp_number } else { exp_number };
    Ok(())
}

/// Convert the accumulated mantissa and decimal exponent to binary64.
fn compute_float(
    number: &[u8],
    negative: bool,
    i: u64,
    start_digits: usize,
    digit_count: usize,
    exponent: i64,
) -> Result<f64> {
    // With 19 or more significant digits the accumulator may have wrapped.
    // Leading zeroes (0.0000number) do not count as significant.
    if digit_count - 1 >= 19 {
        let mut start = start_digits;
        while matches!(byte_at(number, start), b'0' | b'.') {
            start += 1;
        }
        let significant = digit_count - (start - start_digits);
        if significant >= 19 {
            return parse_float_slow(number);
        }
    }
    if !(SMALLEST_POWER..=LARGEST_POWER).contains(&exponent) {
        return parse_float_slow(number);
    }
    if (-22..=22).contains(&exponent) && i <= MAX_EXACT_MANTISSA {
        // Clinger's fast path: both the mantissa and the power of ten are
        // exactly representable, so one rounding happens, in the divide or
        // multiply itself.
        let mut d = i as f64;
        if exponent < 0 {
            d /= POWER_OF_TEN[(-exponent) as usize];
        } else {
            d *= POWER_OF_TEN[exponent as usize];
        }
        return Ok(if negative { -d } else { d });
    }
    parse_float_slow(number)
}

/// Full-precision conversion of the number's textual form.
fn parse_float_slow(number: &[u8]) -> Result<f64> {
    let value: f64 =
        lexical_core::parse(number).map_err(|_| ErrorKind::NumberError)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ErrorKind::NumberError)
    }
}
