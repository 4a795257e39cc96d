// SPDX-License-Identifier: MIT OR Apache-2.0
//! libFuzzer target for the on-demand navigator.
//!
//! Drives the lazy cursor over arbitrary input and checks it always
//! terminates with either clean values or a sticky error, never a panic.
//! Run with: cargo +nightly fuzz run fuzz_ondemand

#![no_main]

use libfuzzer_sys::fuzz_target;
use tapir::{OndemandParser, PaddedBuffer, Value};

fn drive(value: Value<'_, '_>, budget: &mut u32) {
    if *budget == 0 {
        return;
    }
    *budget -= 1;
    if let Ok(array) = value.get_array() {
        for item in array {
            let Ok(item) = item else { return };
            drive(item, budget);
        }
        return;
    }
    if let Ok(object) = value.get_object() {
        for field in object {
            let Ok(field) = field else { return };
            drive(field.value, budget);
        }
        return;
    }
    let _ = value.is_null();
    let _ = value.get_u64();
    let _ = value.get_i64();
    let _ = value.get_f64();
    let _ = value.get_bool();
    let _ = value.get_string();
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }
    let Ok(buf) = PaddedBuffer::from_slice(data) else {
        return;
    };
    let Ok(doc) = OndemandParser::new().iterate(buf.as_padded()) else {
        return;
    };
    let mut budget = 10_000;
    drive(doc.root(), &mut budget);
    let _ = doc.finish();
});
