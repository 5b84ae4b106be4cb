//! Wait/signal coordination layer (C3, C4) used by the blocking adapter.

pub mod condition;
pub mod mutex_condition;
pub mod park_condition;

pub use condition::WaitCondition;
pub use mutex_condition::MutexCondition;
pub use park_condition::ParkCondition;

/// Picks the condition implementation a blocking queue uses for its
/// not-full / not-empty pair.
pub fn make_condition(use_waiting_locking: bool, label: &'static str) -> Box<dyn WaitCondition> {
    if use_waiting_locking {
        Box::new(ParkCondition::new(label))
    } else {
        Box::new(MutexCondition::new())
    }
}
