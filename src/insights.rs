//! Insights - Observability for waitring.
//!
//! Unified tracing, profiling, and logging. Zero-cost when disabled.
//!
//! # Usage
//!
//! ## Basic tracing (console output)
//! ```toml
//! waitring = { version = "0.1", features = ["tracing"] }
//! ```
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! ## Tracy profiler (real-time visualization)
//! ```toml
//! waitring = { version = "0.1", features = ["tracy"] }
//! ```
//! ```rust,ignore
//! waitring::init_tracy();
//! ```
//! Then run Tracy profiler: https://github.com/wolfpld/tracy

/// Initialize Tracy profiler (call once at startup)
#[cfg(feature = "tracy")]
pub fn init_tracy() {
    use tracing_subscriber::layer::SubscriberExt;
    tracing::subscriber::set_global_default(
        tracing_subscriber::registry().with(tracing_tracy::TracyLayer::default()),
    )
    .expect("setup tracy layer");
}

#[cfg(not(feature = "tracy"))]
pub fn init_tracy() {}

/// Record a successful or failed non-blocking offer.
#[cfg(feature = "tracing")]
#[inline]
pub fn record_offer(succeeded: bool) {
    let _span = tracing::trace_span!("offer", succeeded).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn record_offer(_succeeded: bool) {}

/// Record a successful or failed non-blocking poll.
#[cfg(feature = "tracing")]
#[inline]
pub fn record_poll(succeeded: bool) {
    let _span = tracing::trace_span!("poll", succeeded).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn record_poll(_succeeded: bool) {}

/// Record a thread registering itself in a waiter slot.
#[cfg(feature = "tracing")]
#[inline]
pub fn record_park(component: &str) {
    let _span = tracing::debug_span!("park", component).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn record_park(_component: &str) {}

/// Record a signal sweep and how many waiters it woke.
#[cfg(feature = "tracing")]
#[inline]
pub fn record_signal(component: &str, woken: usize) {
    let _span = tracing::trace_span!("signal", component, woken).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn record_signal(_component: &str, _woken: usize) {}

/// Create a span for a queue instance
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! span_queue {
    ($label:expr) => {
        tracing::info_span!("queue", label = %$label)
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! span_queue {
    ($label:expr) => {
        ()
    };
}

/// Enter a span (no-op when tracing disabled)
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! enter_span {
    ($span:expr) => {
        let _guard = $span.enter();
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! enter_span {
    ($span:expr) => {};
}
