//! Blocking put/take over a small queue, forcing both sides to wait.
//!
//! Run: cargo run --example blocking_basic

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use waitring::{BlockingQueue, DisruptorRing};

fn main() {
    let queue = Arc::new(BlockingQueue::new(DisruptorRing::<&'static str>::new(2), true));

    let consumer_queue = queue.clone();
    let consumer = thread::spawn(move || {
        for _ in 0..5 {
            let value = consumer_queue.take().expect("not cancelled");
            println!("took {value}");
        }
    });

    let messages = ["a", "b", "c", "d", "e"];
    for message in messages {
        queue.put(message).expect("not cancelled");
        thread::sleep(Duration::from_millis(1));
    }

    consumer.join().unwrap();
}
