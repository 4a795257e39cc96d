// SPDX-License-Identifier: MIT OR Apache-2.0
//! libFuzzer target for the tape parser.
//!
//! Any input must either parse into a well-formed tape or fail with a
//! clean error kind. Run with: cargo +nightly fuzz run fuzz_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use tapir::TapeTag;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let Ok(doc) = tapir::parse(data) else {
        return;
    };

    // A successful parse must produce a root-bracketed tape whose
    // containers pair up.
    let words = doc.words();
    assert!(words.len() >= 3);
    assert_eq!(TapeTag::of(words[0]), Some(TapeTag::Root));
    assert_eq!(TapeTag::of(*words.last().unwrap()), Some(TapeTag::Root));

    // Walking the document touches every stored value.
    fn walk(value: tapir::DomValue<'_>) {
        match value.value_type() {
            tapir::ValueType::Array => {
                for item in value.get_array().unwrap().iter() {
                    walk(item);
                }
            }
            tapir::ValueType::Object => {
                for (key, item) in value.get_object().unwrap().iter() {
                    let _ = key.unwrap();
                    walk(item);
                }
            }
            tapir::ValueType::String => {
                let _ = value.get_string().unwrap();
            }
            tapir::ValueType::Double => {
                assert!(value.get_f64().unwrap().is_finite());
            }
            _ => {}
        }
    }
    walk(doc.root());
});
