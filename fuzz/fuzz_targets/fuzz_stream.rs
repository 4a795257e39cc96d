// SPDX-License-Identifier: MIT OR Apache-2.0
//! libFuzzer target for document streams.
//!
//! Uses the first input byte to pick a window size, then streams the rest.
//! The stream must terminate, yield documents in order, and stop cleanly
//! after the first fatal error. Run with: cargo +nightly fuzz run fuzz_stream

#![no_main]

use libfuzzer_sys::fuzz_target;
use tapir::{DocumentStream, PaddedBuffer};

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 || data.is_empty() {
        return;
    }
    let window = usize::from(data[0]).max(1) * 4;
    let Ok(buf) = PaddedBuffer::from_slice(&data[1..]) else {
        return;
    };
    let mut last_index = 0;
    let mut stream = DocumentStream::with_window(buf.as_padded(), window);
    let mut steps = 0u32;
    loop {
        let Some(item) = stream.next() else { break };
        steps += 1;
        assert!(steps <= 200_000, "stream must terminate");
        match item {
            Ok(_) => {
                assert!(stream.current_index() >= last_index, "documents in order");
                last_index = stream.current_index();
            }
            Err(_) => break,
        }
    }
});
