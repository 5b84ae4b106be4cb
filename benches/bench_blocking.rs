//! Blocking adapter latency/throughput benchmarks.
//!
//! Compares the mutex-backed wait condition (C3) against the park-based
//! waiter registry (C4) under a producer/consumer pair that contends on a
//! small ring, where wait/signal overhead dominates over plain offer/poll.
//!
//! Run: cargo bench --bench bench_blocking

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;

use waitring::ring::disruptor::DisruptorRing;
use waitring::BlockingQueue;

const RING_SIZE: usize = 64;
const TOTAL_EVENTS: u64 = 200_000;

fn put_take_round_trip(use_waiting_locking: bool, events: u64) -> u64 {
    let queue = Arc::new(BlockingQueue::new(DisruptorRing::<u64>::new(RING_SIZE), use_waiting_locking));

    let consumer_queue = queue.clone();
    let consumer = thread::spawn(move || {
        let mut received = 0u64;
        while received < events {
            if consumer_queue.take().is_ok() {
                received += 1;
            }
        }
        received
    });

    for i in 0..events {
        queue.put(i).unwrap();
    }

    consumer.join().unwrap()
}

fn bench_blocking(c: &mut Criterion) {
    let mut group = c.benchmark_group("blocking_put_take");
    group.throughput(Throughput::Elements(TOTAL_EVENTS));

    group.bench_function(BenchmarkId::new("mutex_condition", RING_SIZE), |b| {
        b.iter(|| black_box(put_take_round_trip(false, TOTAL_EVENTS)));
    });

    group.bench_function(BenchmarkId::new("park_condition", RING_SIZE), |b| {
        b.iter(|| black_box(put_take_round_trip(true, TOTAL_EVENTS)));
    });

    group.finish();
}

criterion_group!(benches, bench_blocking);
criterion_main!(benches);
