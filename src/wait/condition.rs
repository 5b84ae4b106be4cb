//! The shared contract both wait conditions (C3, C4) implement.

use crate::cancel::CancelToken;
use crate::error::Result;
use std::time::Duration;

/// A reusable wait/signal primitive gated on a caller-supplied predicate.
///
/// `test` returns true while the caller should keep waiting (e.g. "queue is
/// empty" for a not-empty condition). Implementations re-check `test` after
/// every wake-up, so spurious wake-ups and lost signals are both harmless.
pub trait WaitCondition: Send + Sync {
    /// Block until `test` returns false or `cancel` is tripped.
    fn wait(&self, test: &dyn Fn() -> bool, cancel: &CancelToken) -> Result<()>;

    /// Block until `test` returns false, `cancel` is tripped, or `timeout`
    /// elapses. Returns `Ok(true)` if woken by a state change, `Ok(false)`
    /// on timeout.
    fn wait_timeout(
        &self,
        test: &dyn Fn() -> bool,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<bool>;

    /// Wake every waiter so it re-checks `test`. A no-op when nobody waits.
    fn signal(&self);
}
