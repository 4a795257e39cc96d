// SPDX-License-Identifier: MIT OR Apache-2.0
// Benchmarks: missing_docs - criterion_group! macro generates undocumentable code
#![allow(missing_docs)]
// Benchmarks: clippy lints relaxed for benchmark code (not production)
#![allow(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Stage-1 throughput in isolation: structural indexing and minification.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tapir::{PaddedBuffer, ParserConfig, build_structural_index, minify};

fn dense_document(bytes: usize) -> String {
    let mut text = String::from("[");
    while text.len() < bytes {
        text.push_str(r#"{"k":" quoted \" text ","n":123.456,"f":false},"#);
    }
    text.push_str("null]");
    text
}

fn bench_structural_index(c: &mut Criterion) {
    let text = dense_document(256 * 1024);
    let buf = PaddedBuffer::from_str(&text).unwrap();
    let config = ParserConfig::default();
    let mut group = c.benchmark_group("stage1");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("structural_index", |b| {
        b.iter(|| {
            let index = build_structural_index(black_box(buf.as_padded()), &config).unwrap();
            black_box(index.len());
        });
    });
    group.finish();
}

fn bench_minify(c: &mut Criterion) {
    let text = dense_document(256 * 1024).replace(',', " ,\n\t ");
    let buf = PaddedBuffer::from_str(&text).unwrap();
    let mut group = c.benchmark_group("minify");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("minify", |b| {
        let mut out = Vec::with_capacity(text.len());
        b.iter(|| {
            out.clear();
            minify(black_box(buf.as_padded()), &mut out).unwrap();
            black_box(out.len());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_structural_index, bench_minify);
criterion_main!(benches);
