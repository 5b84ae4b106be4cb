//! Bounded, lock-free, ring-buffer-backed concurrent queues.
//!
//! Two non-blocking ring implementations share one contract
//! ([`ring::NonBlockingQueue`]):
//! - [`ring::disruptor::DisruptorRing`] — LMAX Disruptor-style split-cursor
//!   MPMC ring, usually the faster of the two.
//! - [`ring::vyukov::VyukovRing`] — Vyukov's per-slot-sequence MPMC ring,
//!   one extra atomic per slot in exchange for a simpler invariant.
//!
//! [`blocking::BlockingQueue`] wraps either one with put/take/offer-timed/
//! poll-timed semantics, backed by a pluggable wait condition:
//! [`wait::MutexCondition`] (correct, heavier) or [`wait::ParkCondition`]
//! (lower latency, bounded waiter ring).

pub mod blocking;
pub mod cancel;
pub mod constants;
pub mod error;
pub mod insights;
pub mod metrics;
pub mod padded;
pub mod ring;
pub mod spin;
pub mod wait;

pub use blocking::BlockingQueue;
pub use cancel::CancelToken;
pub use error::{QueueError, Result};
pub use ring::disruptor::DisruptorRing;
pub use ring::vyukov::VyukovRing;
pub use ring::NonBlockingQueue;
pub use wait::{MutexCondition, ParkCondition, WaitCondition};

/// Crate version, exposed for diagnostics and as a sanity check in embedders.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "tracy")]
pub use insights::init_tracy;
