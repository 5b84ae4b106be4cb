//! Vyukov per-slot-sequence MPMC ring (C6).
//!
//! Trades the split-cursor's headCache shortcut for one extra atomic per
//! slot: each slot's `sequence` field gates whether it is this producer's or
//! consumer's turn, so there is no shared `headCache` to get stale. Simpler
//! invariant, one more cache line touched per operation than C5.

use crate::insights;
use crate::metrics::METRICS;
use crate::padded::PaddedAtomicU64;
use crate::ring::{normalize_capacity, NonBlockingQueue};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Aligned to a cache line so neighbouring slots' `sequence` fields, which
/// producers and consumers at adjacent indices spin-read concurrently,
/// don't false-share.
#[repr(align(64))]
struct Slot<E> {
    sequence: AtomicU64,
    value: UnsafeCell<Option<E>>,
}

pub struct VyukovRing<E> {
    slots: Box<[Slot<E>]>,
    mask: u64,
    capacity: usize,
    head: PaddedAtomicU64,
    tail: PaddedAtomicU64,
}

unsafe impl<E: Send> Send for VyukovRing<E> {}
unsafe impl<E: Send> Sync for VyukovRing<E> {}

impl<E> VyukovRing<E> {
    pub fn new(requested_capacity: usize) -> Self {
        let capacity = normalize_capacity(requested_capacity);
        let slots = (0..capacity)
            .map(|i| Slot { sequence: AtomicU64::new(i as u64), value: UnsafeCell::new(None) })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { slots, mask: (capacity - 1) as u64, capacity, head: PaddedAtomicU64::new(0), tail: PaddedAtomicU64::new(0) }
    }

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

impl<E> NonBlockingQueue<E> for VyukovRing<E> {
    fn try_offer(&self, value: E) -> std::result::Result<(), E> {
        let mut tail = self.tail.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[self.index(tail)];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as i64 - tail as i64;
            match diff.cmp(&0) {
                std::cmp::Ordering::Equal => {
                    match self.tail.compare_exchange_weak(
                        tail,
                        tail + 1,
                        Ordering::AcqRel,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            unsafe {
                                *slot.value.get() = Some(value);
                            }
                            slot.sequence.store(tail + 1, Ordering::Release);
                            insights::record_offer(true);
                            METRICS.record_offer(true);
                            return Ok(());
                        }
                        Err(actual) => {
                            tail = actual;
                            continue;
                        }
                    }
                }
                std::cmp::Ordering::Less => {
                    insights::record_offer(false);
                    METRICS.record_offer(false);
                    return Err(value);
                }
                std::cmp::Ordering::Greater => {
                    tail = self.tail.load(Ordering::Relaxed);
                }
            }
        }
    }

    fn poll(&self) -> Option<E> {
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[self.index(head)];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as i64 - (head as i64 + 1);
            match diff.cmp(&0) {
                std::cmp::Ordering::Equal => {
                    match self.head.compare_exchange_weak(
                        head,
                        head + 1,
                        Ordering::AcqRel,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            let value = unsafe { (*slot.value.get()).take() };
                            slot.sequence.store(head + self.capacity as u64, Ordering::Release);
                            insights::record_poll(value.is_some());
                            METRICS.record_poll(value.is_some());
                            return value;
                        }
                        Err(actual) => {
                            head = actual;
                            continue;
                        }
                    }
                }
                std::cmp::Ordering::Less => {
                    insights::record_poll(false);
                    METRICS.record_poll(false);
                    return None;
                }
                std::cmp::Ordering::Greater => {
                    head = self.head.load(Ordering::Relaxed);
                }
            }
        }
    }

    fn peek(&self) -> Option<E>
    where
        E: Clone,
    {
        let head = self.head.load(Ordering::Relaxed);
        let slot = &self.slots[self.index(head)];
        let seq = slot.sequence.load(Ordering::Acquire);
        if seq != head + 1 {
            return None;
        }
        unsafe { (*slot.value.get()).clone() }
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
        let mut copied = 0;
        for slot in out.iter_mut() {
            match self.poll() {
                Some(value) => {
                    *slot = value;
                    copied += 1;
                }
                None => break,
            }
        }
        copied
    }

    fn contains(&self, target: &E) -> bool
    where
        E: PartialEq,
    {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        let mut pos = head;
        while pos != tail {
            let slot = &self.slots[self.index(pos)];
            let seq = slot.sequence.load(Ordering::Acquire);
            if seq == pos + 1 {
                let value = unsafe { &*slot.value.get() };
                if value.as_ref().is_some_and(|v| v == target) {
                    return true;
                }
            }
            pos = pos.wrapping_add(1);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_cache_line_aligned() {
        assert_eq!(std::mem::align_of::<Slot<u64>>(), 64);
        assert!(std::mem::size_of::<Slot<u64>>() % 64 == 0);
    }

    #[test]
    fn capacity_rounds_up_with_floor_of_two() {
        assert_eq!(VyukovRing::<i32>::new(0).capacity(), 2);
        assert_eq!(VyukovRing::<i32>::new(3).capacity(), 4);
    }

    #[test]
    fn seed_case_cap4_fill_and_drain() {
        let ring = VyukovRing::new(4);
        assert!(ring.offer(1));
        assert!(ring.offer(2));
        assert!(ring.offer(3));
        assert!(ring.offer(4));
        assert!(!ring.offer(5));

        assert_eq!(ring.poll(), Some(1));
        assert_eq!(ring.poll(), Some(2));
        assert_eq!(ring.poll(), Some(3));
        assert_eq!(ring.poll(), Some(4));
        assert_eq!(ring.poll(), None);
    }

    #[test]
    fn seed_collection_evicts_earliest_on_wraparound() {
        let ring = VyukovRing::with_seed(4, ['a', 'b', 'c', 'd', 'e']);
        assert_eq!(ring.poll(), Some('b'));
        assert_eq!(ring.poll(), Some('c'));
        assert_eq!(ring.poll(), Some('d'));
        assert_eq!(ring.poll(), Some('e'));
        assert_eq!(ring.poll(), None);
    }

    #[test]
    fn sequence_reuses_slot_after_wraparound() {
        let ring = VyukovRing::new(2);
        for round in 0..5 {
            assert!(ring.offer(round));
            assert_eq!(ring.poll(), Some(round));
        }
    }

    #[test]
    fn peek_does_not_consume() {
        let ring = VyukovRing::new(4);
        ring.offer(7);
        assert_eq!(ring.peek(), Some(7));
        assert_eq!(ring.peek(), Some(7));
        assert_eq!(ring.poll(), Some(7));
    }

    #[test]
    fn two_producer_two_consumer_soak_preserves_multiset() {
        use std::collections::HashMap;
        use std::sync::atomic::{AtomicU64, Ordering as O};
        use std::sync::{Arc, Mutex};
        use std::thread;

        let ring = Arc::new(VyukovRing::<u64>::new(1024));
        const PER_PRODUCER: u64 = 20_000;
        const TOTAL: u64 = 2 * PER_PRODUCER;

        let producers: Vec<_> = (0..2)
            .map(|p| {
                let ring = ring.clone();
                thread::spawn(move || {
                    let base = p as u64 * PER_PRODUCER;
                    for i in 0..PER_PRODUCER {
                        let value = base + i;
                        while !ring.offer(value) {
                            std::hint::spin_loop();
                        }
                    }
                })
            })
            .collect();

        let consumed_count = Arc::new(AtomicU64::new(0));
        let consumed = Arc::new(Mutex::new(Vec::with_capacity(TOTAL as usize)));
        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let ring = ring.clone();
                let consumed = consumed.clone();
                let consumed_count = consumed_count.clone();
                thread::spawn(move || {
                    let mut local = Vec::new();
                    while consumed_count.load(O::Acquire) < TOTAL {
                        match ring.poll() {
                            Some(v) => {
                                local.push(v);
                                consumed_count.fetch_add(1, O::AcqRel);
                            }
                            None => std::thread::yield_now(),
                        }
                    }
                    consumed.lock().unwrap().extend(local);
                })
            })
            .collect();

        for p in producers {
            p.join().unwrap();
        }
        for c in consumers {
            c.join().unwrap();
        }

        let mut counts: HashMap<u64, u32> = HashMap::new();
        for v in consumed.lock().unwrap().iter() {
            *counts.entry(*v).or_default() += 1;
        }
        assert_eq!(counts.len() as u64, TOTAL);
        assert!(counts.values().all(|&c| c == 1));
    }
}
