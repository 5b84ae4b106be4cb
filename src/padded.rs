//! Cache-line padded atomic counter (C1).
//!
//! Every cursor shared between a producer and a consumer side of a ring
//! lives in one of these so that two adjacent cursors in a containing
//! struct never share a cache line.

use std::sync::atomic::{AtomicU64, Ordering};

/// Fillers sized so the whole struct spans one cache line on the widest
/// common platform (128 bytes on Apple Silicon, 64 on x86_64) regardless of
/// where the `AtomicU64` itself lands within it.
const FILLER_WORDS: usize = 15;

/// A 64-bit monotonic counter isolated on its own cache line.
#[repr(align(128))]
pub struct PaddedAtomicU64 {
    value: AtomicU64,
    _filler: [u64; FILLER_WORDS],
}

impl PaddedAtomicU64 {
    pub const fn new(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
            _filler: [0; FILLER_WORDS],
        }
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> u64 {
        self.value.load(order)
    }

    #[inline]
    pub fn store(&self, value: u64, order: Ordering) {
        self.value.store(value, order)
    }

    /// Release-only publication: sufficient for cursor commits because a
    /// subsequent acquire-load by the peer establishes happens-before with
    /// the slot writes that preceded this store.
    #[inline]
    pub fn lazy_store(&self, value: u64) {
        self.value.store(value, Ordering::Release);
    }

    #[inline]
    pub fn compare_exchange_weak(
        &self,
        current: u64,
        new: u64,
        success: Ordering,
        failure: Ordering,
    ) -> std::result::Result<u64, u64> {
        self.value.compare_exchange_weak(current, new, success, failure)
    }

    #[inline]
    pub fn compare_exchange(
        &self,
        current: u64,
        new: u64,
        success: Ordering,
        failure: Ordering,
    ) -> std::result::Result<u64, u64> {
        self.value.compare_exchange(current, new, success, failure)
    }

    #[inline]
    pub fn fetch_add(&self, delta: u64, order: Ordering) -> u64 {
        self.value.fetch_add(delta, order)
    }

    #[inline]
    pub fn fetch_sub(&self, delta: u64, order: Ordering) -> u64 {
        self.value.fetch_sub(delta, order)
    }
}

#[cfg(test)]
static_assertions::const_assert_eq!(std::mem::size_of::<PaddedAtomicU64>(), 128);

impl Default for PaddedAtomicU64 {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for PaddedAtomicU64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaddedAtomicU64")
            .field("value", &self.value.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_spans_one_cache_line() {
        // 1 (value) + 15 (filler) = 16 u64 words = 128 bytes.
        assert_eq!(std::mem::size_of::<PaddedAtomicU64>(), 128);
        assert_eq!(std::mem::align_of::<PaddedAtomicU64>(), 128);
    }

    #[test]
    fn two_counters_never_share_a_cache_line() {
        struct Pair {
            a: PaddedAtomicU64,
            b: PaddedAtomicU64,
        }
        let pair = Pair { a: PaddedAtomicU64::new(0), b: PaddedAtomicU64::new(0) };
        let a_addr = &pair.a as *const _ as usize;
        let b_addr = &pair.b as *const _ as usize;
        assert_eq!(a_addr % 128, 0);
        assert_eq!(b_addr % 128, 0);
        assert_ne!(a_addr / 128, b_addr / 128);
    }

    #[test]
    fn load_store_cas() {
        let c = PaddedAtomicU64::new(5);
        assert_eq!(c.load(Ordering::Acquire), 5);
        c.store(10, Ordering::Release);
        assert_eq!(c.load(Ordering::Acquire), 10);
        assert_eq!(c.compare_exchange_weak(10, 11, Ordering::AcqRel, Ordering::Relaxed), Ok(10));
        assert_eq!(c.load(Ordering::Acquire), 11);
        c.lazy_store(20);
        assert_eq!(c.load(Ordering::Acquire), 20);
    }
}
