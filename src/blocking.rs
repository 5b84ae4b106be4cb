//! Blocking adapter (C7): lifts a [`NonBlockingQueue`] into put/take/
//! offer-timed/poll-timed, backed by a not-full and a not-empty condition.

use crate::cancel::CancelToken;
use crate::constants::PARK_TIMEOUT;
use crate::error::{QueueError, Result};
use crate::ring::NonBlockingQueue;
use crate::wait::{self, WaitCondition};
use std::time::{Duration, Instant};

/// Wraps any [`NonBlockingQueue`] with blocking put/take semantics.
///
/// The adapter signals on every producer and consumer operation rather than
/// conditioning on prior state: `signal` is O(1) when nobody waits (the
/// park-based condition's cached count short-circuits) and O(waiters)
/// otherwise.
pub struct BlockingQueue<E, Q> {
    inner: Q,
    not_full: Box<dyn WaitCondition>,
    not_empty: Box<dyn WaitCondition>,
    cancel: CancelToken,
    _marker: std::marker::PhantomData<E>,
}

impl<E, Q: NonBlockingQueue<E>> BlockingQueue<E, Q> {
    /// `use_waiting_locking` selects the park-based condition (true, lower
    /// latency, higher CPU) or the mutex-backed one (false).
    pub fn new(inner: Q, use_waiting_locking: bool) -> Self {
        Self {
            inner,
            not_full: wait::make_condition(use_waiting_locking, "not_full"),
            not_empty: wait::make_condition(use_waiting_locking, "not_empty"),
            cancel: CancelToken::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// A token that, when cancelled, causes any thread parked in this
    /// queue's put/take/offer/poll to surface [`QueueError::Interrupted`].
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity() - self.size()
    }

    pub fn contains(&self, target: &E) -> bool
    where
        E: PartialEq,
    {
        self.inner.contains(target)
    }

    pub fn peek(&self) -> Option<E>
    where
        E: Clone,
    {
        self.inner.peek()
    }

    /// Non-blocking offer that fails with [`QueueError::CapacityExhausted`]
    /// instead of returning false.
    pub fn add(&self, value: E) -> Result<()> {
        if self.offer(value) {
            Ok(())
        } else {
            Err(QueueError::CapacityExhausted)
        }
    }

    /// Non-blocking peek that fails with [`QueueError::Empty`] instead of
    /// returning `None`.
    pub fn element(&self) -> Result<E>
    where
        E: Clone,
    {
        self.peek().ok_or(QueueError::Empty)
    }

    /// Non-blocking enqueue. Always signals `not_empty`, even on failure:
    /// the signal is idempotent and a consumer may already be waiting on a
    /// state change this call is about to produce.
    pub fn offer(&self, value: E) -> bool {
        let ok = self.inner.try_offer(value).is_ok();
        self.not_empty.signal();
        ok
    }

    /// Non-blocking dequeue. Always signals `not_full`.
    pub fn poll(&self) -> Option<E> {
        let value = self.inner.poll();
        self.not_full.signal();
        value
    }

    /// Blocks until there is room, then enqueues.
    pub fn put(&self, value: E) -> Result<()> {
        let mut value = value;
        loop {
            match self.inner.try_offer(value) {
                Ok(()) => {
                    self.not_empty.signal();
                    return Ok(());
                }
                Err(rejected) => {
                    value = rejected;
                    if self.cancel.is_cancelled() {
                        return Err(QueueError::Interrupted);
                    }
                    let capacity = self.inner.capacity();
                    let test = || self.inner.size() >= capacity;
                    self.not_full.wait_timeout(&test, PARK_TIMEOUT, &self.cancel)?;
                }
            }
        }
    }

    /// Blocks until an element is available, then dequeues it.
    pub fn take(&self) -> Result<E> {
        loop {
            if let Some(value) = self.inner.poll() {
                self.not_full.signal();
                return Ok(value);
            }
            if self.cancel.is_cancelled() {
                return Err(QueueError::Interrupted);
            }
            let test = || self.inner.is_empty();
            self.not_empty.wait_timeout(&test, PARK_TIMEOUT, &self.cancel)?;
        }
    }

    /// Enqueues if room opens up within `timeout`.
    pub fn offer_timeout(&self, value: E, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut value = value;
        loop {
            match self.inner.try_offer(value) {
                Ok(()) => {
                    self.not_empty.signal();
                    return Ok(true);
                }
                Err(rejected) => {
                    value = rejected;
                    if self.cancel.is_cancelled() {
                        return Err(QueueError::Interrupted);
                    }
                    let remaining = match deadline.checked_duration_since(Instant::now()) {
                        Some(d) if !d.is_zero() => d,
                        _ => return Ok(false),
                    };
                    let capacity = self.inner.capacity();
                    let test = || self.inner.size() >= capacity;
                    if !self.not_full.wait_timeout(&test, remaining, &self.cancel)? {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// Dequeues if an element appears within `timeout`.
    pub fn poll_timeout(&self, timeout: Duration) -> Result<Option<E>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.inner.poll() {
                self.not_full.signal();
                return Ok(Some(value));
            }
            if self.cancel.is_cancelled() {
                return Err(QueueError::Interrupted);
            }
            let remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(d) if !d.is_zero() => d,
                _ => return Ok(None),
            };
            let test = || self.inner.is_empty();
            if !self.not_empty.wait_timeout(&test, remaining, &self.cancel)? {
                return Ok(None);
            }
        }
    }

    /// Batch drain into `out`, signalling `not_full` once.
    pub fn remove_into(&self, out: &mut [E]) -> usize {
        let n = self.inner.remove_into(out);
        if n > 0 {
            self.not_full.signal();
        }
        n
    }

    /// Drains up to `max` elements into `sink`. `sink` is a plain `Vec`, a
    /// distinct type from `Self`, so there is no aliasing case to guard
    /// against here; see [`Self::drain_to_queue`] for the queue-to-queue
    /// form, where the sink can actually be `self`.
    pub fn drain_to(&self, sink: &mut Vec<E>, max: usize) -> Result<usize> {
        let mut drained = 0;
        while drained < max {
            match self.inner.poll() {
                Some(value) => {
                    sink.push(value);
                    drained += 1;
                }
                None => break,
            }
        }
        if drained > 0 {
            self.not_full.signal();
        }
        Ok(drained)
    }

    /// Drains up to `max` elements out of `self` and offers each into
    /// `sink`. Fails with [`QueueError::IllegalArgument`] if `sink` is the
    /// same queue as `self`: a self-drain would pull a value out and try to
    /// hand it right back in, which can deadlock a full queue and never
    /// terminates a queue at or below `max` capacity.
    ///
    /// Elements already pulled out of `self` that `sink` then rejects
    /// (because `sink` is full) are dropped rather than returned to `self`;
    /// the count returned is how many were removed from `self`, not how
    /// many landed in `sink`.
    pub fn drain_to_queue(&self, sink: &BlockingQueue<E, Q>, max: usize) -> Result<usize> {
        if std::ptr::eq(self, sink) {
            return Err(QueueError::illegal_argument("drain_to_queue: sink cannot be self"));
        }
        let mut drained = 0;
        while drained < max {
            match self.inner.poll() {
                Some(value) => {
                    drained += 1;
                    sink.offer(value);
                }
                None => break,
            }
        }
        if drained > 0 {
            self.not_full.signal();
        }
        Ok(drained)
    }

    pub fn clear(&self) {
        self.inner.clear();
        self.not_full.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::disruptor::DisruptorRing;

    fn make(capacity: usize, use_waiting_locking: bool) -> BlockingQueue<i32, DisruptorRing<i32>> {
        BlockingQueue::new(DisruptorRing::new(capacity), use_waiting_locking)
    }

    #[test]
    fn put_take_round_trip_mutex_condition() {
        let q = make(4, false);
        q.put(1).unwrap();
        assert_eq!(q.take().unwrap(), 1);
    }

    #[test]
    fn put_take_round_trip_park_condition() {
        let q = make(4, true);
        q.put(1).unwrap();
        assert_eq!(q.take().unwrap(), 1);
    }

    #[test]
    fn take_blocks_until_offer_from_another_thread() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let q = Arc::new(make(2, true));
        let q2 = q.clone();
        let handle = thread::spawn(move || q2.take().unwrap());

        thread::sleep(Duration::from_millis(5));
        q.offer(99);

        assert_eq!(handle.join().unwrap(), 99);
    }

    #[test]
    fn put_blocks_until_take_frees_space() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let q = Arc::new(make(2, true));
        q.put(1).unwrap();
        q.put(2).unwrap();

        let q2 = q.clone();
        let handle = thread::spawn(move || q2.put(3));

        thread::sleep(Duration::from_millis(5));
        assert_eq!(q.take().unwrap(), 1);

        handle.join().unwrap().unwrap();
        assert_eq!(q.take().unwrap(), 2);
        assert_eq!(q.take().unwrap(), 3);
    }

    #[test]
    fn offer_timeout_fails_when_queue_stays_full() {
        let q = make(2, true);
        q.put(1).unwrap();
        q.put(2).unwrap();
        let ok = q.offer_timeout(3, Duration::from_millis(5)).unwrap();
        assert!(!ok);
    }

    #[test]
    fn poll_timeout_fails_when_queue_stays_empty() {
        let q: BlockingQueue<i32, DisruptorRing<i32>> = make(2, true);
        let result = q.poll_timeout(Duration::from_millis(5)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn add_errors_on_full_queue() {
        let q = make(2, false);
        q.add(1).unwrap();
        q.add(2).unwrap();
        assert!(matches!(q.add(3).unwrap_err(), QueueError::CapacityExhausted));
    }

    #[test]
    fn element_errors_on_empty_queue() {
        let q: BlockingQueue<i32, DisruptorRing<i32>> = make(2, false);
        assert!(matches!(q.element().unwrap_err(), QueueError::Empty));
    }

    #[test]
    fn cancellation_unblocks_a_parked_take() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let q = Arc::new(make(2, true));
        let cancel = q.cancel_token();
        let q2 = q.clone();
        let handle = thread::spawn(move || q2.take());

        thread::sleep(Duration::from_millis(5));
        cancel.cancel();

        assert!(matches!(handle.join().unwrap(), Err(QueueError::Interrupted)));
    }

    #[test]
    fn drain_to_queue_moves_elements_between_distinct_queues() {
        let src = make(4, false);
        let dst = make(4, false);
        src.put(1).unwrap();
        src.put(2).unwrap();
        src.put(3).unwrap();

        let moved = src.drain_to_queue(&dst, 2).unwrap();
        assert_eq!(moved, 2);
        assert_eq!(src.size(), 1);
        assert_eq!(dst.take().unwrap(), 1);
        assert_eq!(dst.take().unwrap(), 2);
    }

    #[test]
    fn drain_to_queue_rejects_draining_into_self() {
        let q = make(4, false);
        q.put(1).unwrap();
        let err = q.drain_to_queue(&q, 1).unwrap_err();
        assert!(matches!(err, QueueError::IllegalArgument { .. }));
        assert_eq!(q.size(), 1);
    }

    #[test]
    fn seed_cap2_blocking_handoff() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let q = Arc::new(make(2, true));
        q.put(1).unwrap();
        q.put(2).unwrap();

        let q2 = q.clone();
        let producer = thread::spawn(move || q2.put(3));

        thread::sleep(Duration::from_millis(10));
        assert_eq!(q.take().unwrap(), 1);
        producer.join().unwrap().unwrap();

        assert_eq!(q.take().unwrap(), 2);
        assert_eq!(q.take().unwrap(), 3);
    }
}
