// SPDX-License-Identifier: MIT OR Apache-2.0
//! libFuzzer target for the minifier.
//!
//! Minification must never panic, and minifying valid JSON must keep it
//! parseable. Run with: cargo +nightly fuzz run fuzz_minify

#![no_main]

use libfuzzer_sys::fuzz_target;
use tapir::PaddedBuffer;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }
    let Ok(buf) = PaddedBuffer::from_slice(data) else {
        return;
    };
    let mut out = Vec::new();
    let minified = tapir::minify(buf.as_padded(), &mut out);

    if tapir::parse(data).is_ok() {
        assert!(minified.is_ok());
        assert!(out.len() <= data.len());
        assert!(tapir::parse(&out).is_ok(), "minified JSON stays valid");
    }
});
