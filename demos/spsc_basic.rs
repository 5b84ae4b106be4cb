//! Single producer, single consumer over the Disruptor ring.
//!
//! Run: cargo run --example spsc_basic

use std::sync::Arc;
use std::thread;
use waitring::{DisruptorRing, NonBlockingQueue};

fn main() {
    let ring = Arc::new(DisruptorRing::<u64>::new(1024));
    const EVENTS: u64 = 1_000_000;

    let consumer_ring = ring.clone();
    let consumer = thread::spawn(move || {
        let mut sum = 0u64;
        let mut received = 0u64;
        while received < EVENTS {
            if let Some(value) = consumer_ring.poll() {
                sum += value;
                received += 1;
            } else {
                std::hint::spin_loop();
            }
        }
        sum
    });

    for i in 0..EVENTS {
        while !ring.offer(i) {
            std::hint::spin_loop();
        }
    }

    let sum = consumer.join().unwrap();
    println!("consumed {EVENTS} events, sum = {sum}");
}
