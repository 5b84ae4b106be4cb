//! Waitring tuning constants.
//!
//! These are fixed operating parameters, not meant to be tuned per-deployment.

use std::time::Duration;

/// Default ring buffer size when none is requested explicitly (must be power of 2).
pub const DEFAULT_RING_BUFFER_SIZE: usize = 1024;

/// Smallest capacity a queue will ever report.
pub const MIN_CAPACITY: usize = 2;

/// Park duration used by the progressive spin policy (C2) and by the
/// blocking adapter's put/take retry loop (C7).
pub const PARK_TIMEOUT: Duration = Duration::from_nanos(50);

/// Spin-count ceiling before a waiter gives up spinning entirely and parks
/// indefinitely between `test()` re-checks (C2, C4).
pub const MAX_PROG_YIELD: u32 = 2000;

/// Number of waiter slots in the park-based wait condition's ring (C4).
pub const MAX_WAITERS: usize = 8;
