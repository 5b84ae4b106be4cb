//! Mutex-backed wait condition (C3).
//!
//! Correct but heavier than [`super::park_condition::ParkCondition`]: every
//! wait and every signal takes the same lock.

use crate::cancel::CancelToken;
use crate::error::{QueueError, Result};
use crate::metrics::METRICS;
use crate::wait::condition::WaitCondition;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Spin briefly before taking the lock; avoids a syscall for waits that
/// clear within a few hundred nanoseconds.
const SPIN_BEFORE_LOCK: u32 = 100;

pub struct MutexCondition {
    guard: Mutex<()>,
    condvar: Condvar,
}

impl MutexCondition {
    pub fn new() -> Self {
        Self { guard: Mutex::new(()), condvar: Condvar::new() }
    }
}

impl Default for MutexCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitCondition for MutexCondition {
    fn wait(&self, test: &dyn Fn() -> bool, cancel: &CancelToken) -> Result<()> {
        METRICS.record_park();
        let mut spins = 0;
        loop {
            if !test() {
                return Ok(());
            }
            if cancel.is_cancelled() {
                return Err(QueueError::Interrupted);
            }
            if spins < SPIN_BEFORE_LOCK {
                std::hint::spin_loop();
                spins += 1;
                continue;
            }
            let mut locked = self.guard.lock();
            if !test() {
                return Ok(());
            }
            if cancel.is_cancelled() {
                return Err(QueueError::Interrupted);
            }
            self.condvar.wait_for(&mut locked, Duration::from_millis(1));
        }
    }

    fn wait_timeout(
        &self,
        test: &dyn Fn() -> bool,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<bool> {
        METRICS.record_park();
        let deadline = Instant::now() + timeout;
        let mut spins = 0;
        loop {
            if !test() {
                return Ok(true);
            }
            if cancel.is_cancelled() {
                return Err(QueueError::Interrupted);
            }
            let remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(d) if !d.is_zero() => d,
                _ => return Ok(false),
            };
            if spins < SPIN_BEFORE_LOCK {
                std::hint::spin_loop();
                spins += 1;
                continue;
            }
            let mut locked = self.guard.lock();
            if !test() {
                return Ok(true);
            }
            if cancel.is_cancelled() {
                return Err(QueueError::Interrupted);
            }
            let step = remaining.min(Duration::from_millis(1));
            self.condvar.wait_for(&mut locked, step);
        }
    }

    fn signal(&self) {
        let _locked = self.guard.lock();
        self.condvar.notify_all();
        METRICS.record_signal();
    }
}
