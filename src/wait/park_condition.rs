//! Park-based wait condition (C4).
//!
//! A low-latency alternative to [`super::mutex_condition::MutexCondition`].
//! The first waiter busy-spins using the progressive [`SpinPolicy`] escalation
//! and never touches the waiter ring; everyone else publishes itself into a
//! fixed slot and parks.

use crate::cancel::CancelToken;
use crate::constants::{MAX_PROG_YIELD, MAX_WAITERS, PARK_TIMEOUT};
use crate::error::{QueueError, Result};
use crate::insights;
use crate::metrics::METRICS;
use crate::padded::PaddedAtomicU64;
use crate::spin::SpinPolicy;
use crate::wait::condition::WaitCondition;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::Thread;
use std::time::{Duration, Instant};

const WAITER_MASK: u64 = (MAX_WAITERS - 1) as u64;

/// Heap-allocated and refcounted rather than borrowed off the waiting
/// thread's stack: a signaller's `swap` can observe a slot pointer and race
/// the owning thread's own `clear_slot`, so the pointer the ring hands out
/// must stay valid independent of whichever side's frame returns first.
/// Each side that extracts a non-null pointer from a slot takes ownership of
/// exactly one strong reference, reconstructed via `Arc::from_raw`.
struct ParkedThread {
    thread: Thread,
}

struct WaiterSlot {
    occupant: AtomicPtr<ParkedThread>,
}

impl WaiterSlot {
    const fn new() -> Self {
        Self { occupant: AtomicPtr::new(ptr::null_mut()) }
    }
}

/// Cache-line guard so the waiter ring doesn't share a line with whatever
/// precedes or follows it in a containing struct.
#[repr(align(64))]
struct RingPad([u8; 64]);

impl RingPad {
    const fn new() -> Self {
        Self([0; 64])
    }
}

pub struct ParkCondition {
    wait_count: PaddedAtomicU64,
    wait_cache: AtomicU64,
    _pad_front: RingPad,
    waiters: [WaiterSlot; MAX_WAITERS],
    _pad_back: RingPad,
    label: &'static str,
}

impl ParkCondition {
    pub fn new(label: &'static str) -> Self {
        Self {
            wait_count: PaddedAtomicU64::new(0),
            wait_cache: AtomicU64::new(0),
            _pad_front: RingPad::new(),
            waiters: std::array::from_fn(|_| WaiterSlot::new()),
            _pad_back: RingPad::new(),
            label,
        }
    }

    fn refresh_cache(&self) {
        let current = self.wait_count.load(Ordering::Relaxed);
        self.wait_cache.store(current, Ordering::Relaxed);
    }

    /// Publish the current thread into the ring, starting the probe at
    /// `start_seq`, escalating via [`SpinPolicy`] between attempts. Returns
    /// the slot index and the raw pointer now stored there; the caller must
    /// eventually pass both to [`clear_slot`] to release the reference this
    /// call took out via `Arc::into_raw`.
    fn publish_self(&self, start_seq: u64, parked: &Arc<ParkedThread>) -> (usize, *mut ParkedThread) {
        let candidate = Arc::into_raw(Arc::clone(parked)) as *mut ParkedThread;
        let mut seq = start_seq;
        let policy = SpinPolicy::new();
        loop {
            let idx = (seq & WAITER_MASK) as usize;
            if self.waiters[idx]
                .occupant
                .compare_exchange(
                    ptr::null_mut(),
                    candidate,
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return (idx, candidate);
            }
            seq = seq.wrapping_add(1);
            if policy.count() >= MAX_PROG_YIELD {
                std::thread::park_timeout(PARK_TIMEOUT * MAX_WAITERS as u32);
            } else {
                policy.spin();
            }
        }
    }

    /// Reclaim the slot if it still holds `expected`. If this thread wins the
    /// CAS, it also owns the strong reference `publish_self` stored there and
    /// must drop it; if `signal` already cleared the slot first, `signal` has
    /// already reconstructed and dropped that same reference, so this is a
    /// no-op.
    fn clear_slot(&self, idx: usize, expected: *mut ParkedThread) {
        if self.waiters[idx]
            .occupant
            .compare_exchange(expected, ptr::null_mut(), Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            // SAFETY: `expected` was produced by `Arc::into_raw` in
            // `publish_self` and this CAS win means nobody else reclaimed it.
            unsafe {
                drop(Arc::from_raw(expected));
            }
        }
    }
}

impl WaitCondition for ParkCondition {
    fn wait(&self, test: &dyn Fn() -> bool, cancel: &CancelToken) -> Result<()> {
        insights::record_park(self.label);
        METRICS.record_park();
        let prev = self.wait_count.fetch_add(1, Ordering::AcqRel);
        let result = if prev == 0 {
            wait_as_spinner(test, cancel)
        } else {
            wait_as_registered(self, prev, test, cancel, None)
        };
        self.wait_count.fetch_sub(1, Ordering::AcqRel);
        self.refresh_cache();
        result.map(|_| ())
    }

    fn wait_timeout(
        &self,
        test: &dyn Fn() -> bool,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<bool> {
        insights::record_park(self.label);
        METRICS.record_park();
        let deadline = Instant::now() + timeout;
        let prev = self.wait_count.fetch_add(1, Ordering::AcqRel);
        let result = if prev == 0 {
            wait_as_spinner_timed(test, cancel, deadline)
        } else {
            wait_as_registered(self, prev, test, cancel, Some(deadline))
        };
        self.wait_count.fetch_sub(1, Ordering::AcqRel);
        self.refresh_cache();
        result
    }

    fn signal(&self) {
        if self.wait_cache.load(Ordering::Relaxed) == 0
            && self.wait_count.load(Ordering::Acquire) == 0
        {
            return;
        }
        let mut woken = 0;
        for slot in self.waiters.iter() {
            let ptr = slot.occupant.swap(ptr::null_mut(), Ordering::AcqRel);
            if !ptr.is_null() {
                // SAFETY: the swap above is the only way to observe a
                // non-null pointer here, and whichever side's CAS/swap wins
                // takes ownership of exactly the one strong reference
                // `publish_self` stored; reconstructing it via `Arc::from_raw`
                // keeps the allocation alive for this call regardless of
                // whether the owning thread's stack frame has already
                // returned.
                let parked = unsafe { Arc::from_raw(ptr) };
                parked.thread.unpark();
                woken += 1;
            }
            if self.wait_count.load(Ordering::Relaxed) == 0 {
                break;
            }
        }
        insights::record_signal(self.label, woken);
        METRICS.record_signal();
        self.refresh_cache();
    }
}

/// First waiter: never touches the ring, just spins on `test` with C2 escalation.
fn wait_as_spinner(test: &dyn Fn() -> bool, cancel: &CancelToken) -> Result<bool> {
    let policy = SpinPolicy::new();
    while test() {
        if cancel.is_cancelled() {
            return Err(QueueError::Interrupted);
        }
        policy.spin();
    }
    Ok(true)
}

fn wait_as_spinner_timed(
    test: &dyn Fn() -> bool,
    cancel: &CancelToken,
    deadline: Instant,
) -> Result<bool> {
    let policy = SpinPolicy::new();
    while test() {
        if cancel.is_cancelled() {
            return Err(QueueError::Interrupted);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        policy.spin();
    }
    Ok(true)
}

/// Any waiter after the first: publish into the ring and park in short bursts.
fn wait_as_registered(
    condition: &ParkCondition,
    start_seq: u64,
    test: &dyn Fn() -> bool,
    cancel: &CancelToken,
    deadline: Option<Instant>,
) -> Result<bool> {
    let parked = Arc::new(ParkedThread { thread: std::thread::current() });
    let (idx, slot_ptr) = condition.publish_self(start_seq, &parked);

    let outcome = loop {
        if !test() {
            break Ok(true);
        }
        if cancel.is_cancelled() {
            break Err(QueueError::Interrupted);
        }
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                break Ok(false);
            }
            let remaining = deadline - now;
            std::thread::park_timeout(remaining.min(PARK_TIMEOUT * 4));
        } else {
            std::thread::park_timeout(PARK_TIMEOUT * 4);
        }
        // If the slot no longer holds us, a signal already cleared it;
        // loop back around to re-check `test` without re-publishing.
    };

    condition.clear_slot(idx, slot_ptr);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering as O};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn size_has_no_surprise_growth() {
        assert!(std::mem::size_of::<ParkCondition>() >= 128);
    }

    #[test]
    fn first_waiter_returns_once_test_clears() {
        let cond = ParkCondition::new("test");
        let cancel = CancelToken::new();
        let flag = AtomicBool::new(false);
        let flag2 = &flag;
        thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(2));
                flag2.store(true, O::Release);
            });
            cond.wait(&|| !flag2.load(O::Acquire), &cancel).unwrap();
        });
        assert!(flag.load(O::Acquire));
    }

    #[test]
    fn second_waiter_registers_and_gets_woken_by_signal() {
        let cond = Arc::new(ParkCondition::new("test"));
        let ready = Arc::new(AtomicBool::new(false));

        // Occupy the "first waiter" spinner slot with a long-lived spinner.
        let spinner_cond = cond.clone();
        let spinner_ready = ready.clone();
        let spinner = thread::spawn(move || {
            let cancel = CancelToken::new();
            spinner_cond.wait(&|| !spinner_ready.load(O::Acquire), &cancel).unwrap();
        });
        thread::sleep(Duration::from_millis(2));

        let reg_cond = cond.clone();
        let reg_ready = ready.clone();
        let registrant = thread::spawn(move || {
            let cancel = CancelToken::new();
            reg_cond.wait(&|| !reg_ready.load(O::Acquire), &cancel).unwrap();
        });
        thread::sleep(Duration::from_millis(2));

        ready.store(true, O::Release);
        cond.signal();

        spinner.join().unwrap();
        registrant.join().unwrap();
    }

    #[test]
    fn wait_timeout_expires() {
        let cond = ParkCondition::new("test");
        let cancel = CancelToken::new();
        let woke = cond.wait_timeout(&|| true, Duration::from_millis(5), &cancel).unwrap();
        assert!(!woke);
    }

    #[test]
    fn signal_with_no_waiters_is_a_noop() {
        let cond = ParkCondition::new("test");
        cond.signal();
    }
}
