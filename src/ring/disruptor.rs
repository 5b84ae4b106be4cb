//! Disruptor-style split-cursor MPMC ring (C5).
//!
//! Four padded cursors over a power-of-two slot array: `tail`/`head` are the
//! authoritative commit counts, `tail_cursor`/`head_cursor` are CAS claim
//! cursors producers and consumers race on before writing/reading a slot.
//! `head_cache` lets a producer skip re-reading `head` on every offer once
//! it already knows there's room.

use crate::insights;
use crate::metrics::METRICS;
use crate::padded::PaddedAtomicU64;
use crate::ring::{normalize_capacity, NonBlockingQueue};
use crate::spin::SpinPolicy;
use std::cell::UnsafeCell;
use std::sync::atomic::Ordering;

pub struct DisruptorRing<E> {
    slots: Box<[UnsafeCell<Option<E>>]>,
    mask: u64,
    capacity: usize,
    tail: PaddedAtomicU64,
    tail_cursor: PaddedAtomicU64,
    head: PaddedAtomicU64,
    head_cursor: PaddedAtomicU64,
    head_cache: PaddedAtomicU64,
}

unsafe impl<E: Send> Send for DisruptorRing<E> {}
unsafe impl<E: Send> Sync for DisruptorRing<E> {}

/// RAII guard over a claimed `[head, head + k)` range for `remove_into`'s
/// batch-drain path. Commits the claim on drop (clearing any slots the
/// caller hadn't reached yet and advancing `head` past the whole range) so
/// a panic partway through the copy loop still leaves `headCursor == head`
/// instead of a permanently claimed-but-uncommitted range.
struct BatchReadGuard<'a, E> {
    ring: &'a DisruptorRing<E>,
    head: u64,
    k: usize,
    taken: usize,
}

impl<'a, E> BatchReadGuard<'a, E> {
    fn take_next(&mut self) -> Option<E> {
        if self.taken >= self.k {
            return None;
        }
        let idx = self.ring.index(self.head + self.taken as u64);
        let value = unsafe { (*self.ring.slots[idx].get()).take() };
        self.taken += 1;
        value
    }
}

impl<'a, E> Drop for BatchReadGuard<'a, E> {
    fn drop(&mut self) {
        for i in self.taken..self.k {
            let idx = self.ring.index(self.head + i as u64);
            unsafe {
                *self.ring.slots[idx].get() = None;
            }
        }
        self.ring.head.lazy_store(self.head + self.k as u64);
    }
}

impl<E> DisruptorRing<E> {
    pub fn new(requested_capacity: usize) -> Self {
        let capacity = normalize_capacity(requested_capacity);
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(None))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            mask: (capacity - 1) as u64,
            capacity,
            tail: PaddedAtomicU64::new(0),
            tail_cursor: PaddedAtomicU64::new(0),
            head: PaddedAtomicU64::new(0),
            head_cursor: PaddedAtomicU64::new(0),
            head_cache: PaddedAtomicU64::new(0),
        }
    }

    /// Construct with an initial collection; when the seed is longer than
    /// the resulting capacity, earlier elements are evicted by wraparound
    /// (the last `capacity` elements of the seed survive).
    pub fn with_seed(requested_capacity: usize, seed: impl IntoIterator<Item = E>) -> Self {
        let ring = Self::new(requested_capacity);
        for value in seed {
            if ring.size() == ring.capacity() {
                ring.poll();
            }
            ring.offer(value);
        }
        ring
    }

    #[inline]
    fn index(&self, position: u64) -> usize {
        (position & self.mask) as usize
    }
}

impl<E> NonBlockingQueue<E> for DisruptorRing<E> {
    fn try_offer(&self, value: E) -> std::result::Result<(), E> {
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let queue_start = tail.wrapping_sub(self.capacity as u64);
            let mut head_cache = self.head_cache.load(Ordering::Relaxed);
            if head_cache == queue_start {
                head_cache = self.head.load(Ordering::Acquire);
                self.head_cache.store(head_cache, Ordering::Relaxed);
                if head_cache == queue_start {
                    insights::record_offer(false);
                    METRICS.record_offer(false);
                    return Err(value);
                }
            }
            match self.tail_cursor.compare_exchange_weak(
                tail,
                tail + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    let idx = self.index(tail);
                    unsafe {
                        *self.slots[idx].get() = Some(value);
                    }
                    self.tail.lazy_store(tail + 1);
                    insights::record_offer(true);
                    METRICS.record_offer(true);
                    return Ok(());
                }
                Err(_) => continue,
            }
        }
    }

    fn poll(&self) -> Option<E> {
        loop {
            let head = self.head.load(Ordering::Acquire);
            let tail = self.tail.load(Ordering::Acquire);
            if tail == head {
                insights::record_poll(false);
                METRICS.record_poll(false);
                return None;
            }
            match self.head_cursor.compare_exchange_weak(
                head,
                head + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    let policy = SpinPolicy::new();
                    while self.tail.load(Ordering::Acquire) < head + 1 {
                        policy.spin();
                    }
                    let idx = self.index(head);
                    let value = unsafe { (*self.slots[idx].get()).take() };
                    self.head.lazy_store(head + 1);
                    insights::record_poll(true);
                    METRICS.record_poll(true);
                    return value;
                }
                Err(_) => continue,
            }
        }
    }

    fn peek(&self) -> Option<E>
    where
        E: Clone,
    {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        if tail == head {
            return None;
        }
        let idx = self.index(head);
        unsafe { (*self.slots[idx].get()).clone() }
    }

    fn size(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        (tail.wrapping_sub(head) as usize).min(self.capacity)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn remove_into(&self, out: &mut [E]) -> usize {
        loop {
            let head = self.head.load(Ordering::Acquire);
            let tail = self.tail.load(Ordering::Acquire);
            let available = tail.wrapping_sub(head) as usize;
            let k = out.len().min(available).min(self.capacity);
            if k == 0 {
                return 0;
            }
            if self
                .head_cursor
                .compare_exchange_weak(head, head + k as u64, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }
            let policy = SpinPolicy::new();
            while self.tail.load(Ordering::Acquire) < head + k as u64 {
                policy.spin();
            }
            let mut guard = BatchReadGuard { ring: self, head, k, taken: 0 };
            for slot in out.iter_mut().take(k) {
                if let Some(value) = guard.take_next() {
                    *slot = value;
                }
            }
            return k;
        }
    }

    fn contains(&self, target: &E) -> bool
    where
        E: PartialEq,
    {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        let mut pos = head;
        while pos != tail {
            let idx = self.index(pos);
            let slot = unsafe { &*self.slots[idx].get() };
            if slot.as_ref().is_some_and(|v| v == target) {
                return true;
            }
            pos = pos.wrapping_add(1);
        }
        false
    }
}

impl<E> DisruptorRing<E>
where
    E: PartialEq,
{
    /// Arbitrary removal by value. O(N), contends with every other
    /// operation; exists for interface completeness, not for hot-path use.
    pub fn remove_value(&self, target: &E) -> bool {
        loop {
            let head = self.head.load(Ordering::Acquire);
            let tail = self.tail.load(Ordering::Acquire);
            if head == tail {
                return false;
            }
            if self
                .head_cursor
                .compare_exchange(head, tail, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }
            if self
                .tail_cursor
                .compare_exchange(tail, tail, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
            {
                self.head_cursor.store(head, Ordering::Release);
                continue;
            }

            let mut found = false;
            let mut write_pos = head;
            let mut read_pos = head;
            while read_pos != tail {
                let read_idx = self.index(read_pos);
                let is_match = !found && unsafe { (*self.slots[read_idx].get()).as_ref() }
                    .is_some_and(|v| v == target);
                if is_match {
                    found = true;
                    unsafe {
                        *self.slots[read_idx].get() = None;
                    }
                } else {
                    if write_pos != read_pos {
                        let moved = unsafe { (*self.slots[read_idx].get()).take() };
                        let write_idx = self.index(write_pos);
                        unsafe {
                            *self.slots[write_idx].get() = moved;
                        }
                    }
                    write_pos = write_pos.wrapping_add(1);
                }
                read_pos = read_pos.wrapping_add(1);
            }

            self.head.lazy_store(head);
            self.tail.lazy_store(write_pos);
            self.head_cursor.store(head, Ordering::Release);
            self.tail_cursor.store(write_pos, Ordering::Release);
            return found;
        }
    }
}
