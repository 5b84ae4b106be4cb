//! Progressive spin escalation (C2).
//!
//! A waiter calls [`SpinPolicy::spin`] once per failed `test()` and gets
//! back the next spin count to pass in on the following iteration. The
//! policy escalates from a tight pause-hint loop to periodic parking to
//! periodic yielding as contention looks less likely to clear soon,
//! capping out once `count` reaches [`MAX_PROG_YIELD`].

use crate::constants::{MAX_PROG_YIELD, PARK_TIMEOUT};
use std::sync::atomic::{AtomicU32, Ordering};

/// Escalating spin/park/yield policy shared by C3 and C4 waiters.
#[derive(Debug, Default)]
pub struct SpinPolicy {
    count: AtomicU32,
}

impl SpinPolicy {
    pub const fn new() -> Self {
        Self { count: AtomicU32::new(0) }
    }

    /// Reset the escalation counter; call when a waiter starts a fresh wait.
    #[inline]
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    /// Perform one spin step and advance the internal counter.
    ///
    /// Thresholds:
    /// - `n < 500`: CPU pause hint every iteration.
    /// - `500 <= n < 1000`: pause hint, but park for [`PARK_TIMEOUT`] every 8th iteration.
    /// - `1000 <= n < 2000`: pause hint, but yield every 4th iteration.
    /// - `n >= 2000`: yield every iteration; the counter stops advancing past
    ///   [`MAX_PROG_YIELD`].
    #[inline]
    pub fn spin(&self) {
        let n = self.count.load(Ordering::Relaxed);
        step(n);
        if n < MAX_PROG_YIELD {
            self.count.store(n + 1, Ordering::Relaxed);
        }
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Stateless version of the same escalation, for call sites that already
/// track their own spin count (e.g. a loop-local `u32` rather than an
/// atomic field).
#[inline]
pub fn step(n: u32) {
    if n < 500 {
        std::hint::spin_loop();
    } else if n < 1000 {
        if n % 8 == 0 {
            std::thread::park_timeout(PARK_TIMEOUT);
        } else {
            std::hint::spin_loop();
        }
    } else if n < 2000 {
        if n % 4 == 0 {
            std::thread::yield_now();
        } else {
            std::hint::spin_loop();
        }
    } else {
        std::thread::yield_now();
    }
}
