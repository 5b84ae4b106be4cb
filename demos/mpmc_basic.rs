//! Multiple producers, multiple consumers sharing one Vyukov ring.
//!
//! Run: cargo run --example mpmc_basic

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use waitring::{NonBlockingQueue, VyukovRing};

const PRODUCERS: u64 = 4;
const CONSUMERS: u64 = 4;
const PER_PRODUCER: u64 = 250_000;

fn main() {
    let ring = Arc::new(VyukovRing::<u64>::new(4096));
    let total = PRODUCERS * PER_PRODUCER;
    let consumed = Arc::new(AtomicU64::new(0));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let ring = ring.clone();
            thread::spawn(move || {
                let base = p * PER_PRODUCER;
                for i in 0..PER_PRODUCER {
                    while !ring.offer(base + i) {
                        std::hint::spin_loop();
                    }
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let ring = ring.clone();
            let consumed = consumed.clone();
            thread::spawn(move || {
                while consumed.load(Ordering::Acquire) < total {
                    if ring.poll().is_some() {
                        consumed.fetch_add(1, Ordering::AcqRel);
                    } else {
                        std::thread::yield_now();
                    }
                }
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    for c in consumers {
        c.join().unwrap();
    }

    println!("{PRODUCERS} producers, {CONSUMERS} consumers, {total} events consumed");
}
