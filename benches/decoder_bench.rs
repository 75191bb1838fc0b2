//! Performance benchmarks for the keyboard-input decoders.
//!
//! Every keystroke on the kiosk flows through both decoders before normal
//! input routing, so per-event cost is on the interactive path. These
//! benchmarks measure the push cost for the two interesting shapes: full
//! reader bursts that end in an emit, and ordinary typing that the decoders
//! must pass through untouched.
//!
//! # Run Benchmarks
//!
//! ```sh
//! # Run all decoder benchmarks
//! cargo bench --bench decoder_bench
//!
//! # Compare against a saved baseline
//! cargo bench --bench decoder_bench -- --save-baseline main
//! cargo bench --bench decoder_bench -- --baseline main
//! ```

use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use poolpass_input::{KeyEvent, StripeDecoder, WedgeDecoder};

const TRACK1: &str = "%B4242424242424242^DOE/JANE^27121015432112345678?";
const TRACK2: &str = ";4242424242424242=27121015432112345678?";

/// Feed a burst of characters followed by Enter, timestamped at reader speed.
fn stripe_burst(decoder: &mut StripeDecoder, data: &str) {
    let mut at = Instant::now();
    for c in data.chars() {
        black_box(decoder.push(KeyEvent::char(c, at)));
        at += Duration::from_millis(1);
    }
    black_box(decoder.push(KeyEvent::enter(at)));
}

fn bench_stripe_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("stripe_decode");
    group.throughput(Throughput::Elements(1));

    for (name, track) in [("track1", TRACK1), ("track2", TRACK2)] {
        group.bench_with_input(BenchmarkId::new("full_swipe", name), &track, |b, &track| {
            let mut decoder = StripeDecoder::new();
            b.iter(|| stripe_burst(&mut decoder, black_box(track)));
        });
    }

    group.finish();
}

fn bench_stripe_passthrough(c: &mut Criterion) {
    let mut group = c.benchmark_group("stripe_passthrough");
    group.throughput(Throughput::Elements(1));

    // Ordinary typing: one alphanumeric key, no terminator.
    group.bench_function("single_key", |b| {
        let mut decoder = StripeDecoder::new();
        let at = Instant::now();
        b.iter(|| black_box(decoder.push(KeyEvent::char(black_box('a'), at))));
    });

    group.finish();
}

fn bench_wedge_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("wedge_decode");
    group.throughput(Throughput::Elements(1));

    let uids = [("short", "04AB"), ("typical", "04AB12CD"), ("long", "0123456789ABCDEF0123")];

    for (name, uid) in uids {
        group.bench_with_input(BenchmarkId::new("full_scan", name), &uid, |b, &uid| {
            let mut decoder = WedgeDecoder::new();
            let mut at = Instant::now();
            b.iter(|| {
                for c in uid.chars() {
                    black_box(decoder.push(KeyEvent::char(c, at)));
                    at += Duration::from_millis(1);
                }
                black_box(decoder.push(KeyEvent::enter(at)));
                // Step past the debounce window so every iteration emits.
                at += Duration::from_secs(3);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_stripe_decode,
    bench_stripe_passthrough,
    bench_wedge_decode
);
criterion_main!(benches);
