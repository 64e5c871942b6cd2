//! Parser benchmarks

use ansi_response::app::Config;
use ansi_response::{AnsiResponseParser, InputDriver};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn bench_plain_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    // Typing, no escapes
    let plain_text = "Hello, World! ".repeat(1000);
    group.throughput(Throughput::Bytes(plain_text.len() as u64));

    group.bench_function("plain_text", |b| {
        b.iter(|| {
            let mut parser = AnsiResponseParser::new();
            black_box(parser.process_str(black_box(&plain_text)))
        })
    });

    group.finish();
}

fn bench_mouse_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    // Mouse drag, every report claimed
    let mouse = "\x1b[<32;40;12M\x1b[<32;41;12M\x1b[<0;41;12m".repeat(200);
    group.throughput(Throughput::Bytes(mouse.len() as u64));

    group.bench_function("mouse_reports", |b| {
        b.iter(|| {
            let mut parser = AnsiResponseParser::new();
            parser.expect_response_persistent('M', |r| {
                black_box(r);
            });
            parser.expect_response_persistent('m', |r| {
                black_box(r);
            });
            black_box(parser.process_str(black_box(&mouse)))
        })
    });

    group.finish();
}

fn bench_mixed_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    // Arrow keys, alt chords, unclaimed sequences
    let mixed = "ls\x1b[A\x1b[B\x1bf -la\x1b[1;5C\r".repeat(500);
    group.throughput(Throughput::Bytes(mixed.len() as u64));

    group.bench_function("mixed_keys", |b| {
        b.iter(|| {
            let mut parser = AnsiResponseParser::new();
            black_box(parser.process_str(black_box(&mixed)))
        })
    });

    group.finish();
}

fn bench_single_char_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    let mixed = "abc\x1b[12;40Rdef\x1b[?62;22c".repeat(200);
    group.throughput(Throughput::Bytes(mixed.len() as u64));

    group.bench_function("single_char_chunks", |b| {
        b.iter(|| {
            let mut parser = AnsiResponseParser::new();
            let mut out = String::new();
            let mut buf = [0u8; 4];
            for c in mixed.chars() {
                out.push_str(&parser.process_str(c.encode_utf8(&mut buf)));
            }
            black_box(out)
        })
    });

    group.finish();
}

fn bench_driver_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver");

    // UTF-8 text and mouse reports in 64-byte reads
    let input = "Hello, 世界! \x1b[<0;5;5M\x1b[<0;5;5m".repeat(200);
    group.throughput(Throughput::Bytes(input.len() as u64));

    let mut config = Config::default();
    config.mouse.enabled = true;

    group.bench_function("feed", |b| {
        b.iter(|| {
            let mut driver = InputDriver::new(&config);
            let mut count = 0;
            for read in input.as_bytes().chunks(64) {
                count += driver.feed(black_box(read)).len();
            }
            black_box((count, driver.take_mouse_events()))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_plain_text,
    bench_mouse_reports,
    bench_mixed_keys,
    bench_single_char_chunks,
    bench_driver_feed
);
criterion_main!(benches);
