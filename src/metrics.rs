//! Metrics for waitring queues.
//!
//! Lightweight counters for observability

use std::sync::atomic::{ AtomicU64, Ordering };

/// Global metrics counters
pub struct Metrics {
    pub offers_succeeded: AtomicU64,
    pub offers_failed: AtomicU64,
    pub polls_succeeded: AtomicU64,
    pub polls_failed: AtomicU64,
    pub parks: AtomicU64,
    pub signals: AtomicU64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            offers_succeeded: AtomicU64::new(0),
            offers_failed: AtomicU64::new(0),
            polls_succeeded: AtomicU64::new(0),
            polls_failed: AtomicU64::new(0),
            parks: AtomicU64::new(0),
            signals: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_offer(&self, succeeded: bool) {
        if succeeded {
            self.offers_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.offers_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_poll(&self, succeeded: bool) {
        if succeeded {
            self.polls_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.polls_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_park(&self) {
        self.parks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_signal(&self) {
        self.signals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            offers_succeeded: self.offers_succeeded.load(Ordering::Relaxed),
            offers_failed: self.offers_failed.load(Ordering::Relaxed),
            polls_succeeded: self.polls_succeeded.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
            parks: self.parks.load(Ordering::Relaxed),
            signals: self.signals.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.offers_succeeded.store(0, Ordering::Relaxed);
        self.offers_failed.store(0, Ordering::Relaxed);
        self.polls_succeeded.store(0, Ordering::Relaxed);
        self.polls_failed.store(0, Ordering::Relaxed);
        self.parks.store(0, Ordering::Relaxed);
        self.signals.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub offers_succeeded: u64,
    pub offers_failed: u64,
    pub polls_succeeded: u64,
    pub polls_failed: u64,
    pub parks: u64,
    pub signals: u64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "offer_ok={} offer_fail={} poll_ok={} poll_fail={} parks={} signals={}",
            self.offers_succeeded,
            self.offers_failed,
            self.polls_succeeded,
            self.polls_failed,
            self.parks,
            self.signals
        )
    }
}

/// Global metrics instance
pub static METRICS: Metrics = Metrics::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let m = Metrics::new();
        m.record_offer(true);
        m.record_offer(false);
        m.record_poll(true);
        m.record_park();
        m.record_signal();

        let s = m.snapshot();
        assert_eq!(s.offers_succeeded, 1);
        assert_eq!(s.offers_failed, 1);
        assert_eq!(s.polls_succeeded, 1);
        assert_eq!(s.parks, 1);
        assert_eq!(s.signals, 1);
    }

    #[test]
    fn test_reset() {
        let m = Metrics::new();
        m.record_offer(true);
        m.reset();
        assert_eq!(m.snapshot().offers_succeeded, 0);
    }
}
