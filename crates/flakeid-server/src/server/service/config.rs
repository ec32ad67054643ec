use flakeid::{MonotonicClock, MultiFlakeGenerator};

/// Clock shared by every generator delegate.
///
/// This controls how timestamps are embedded into generated IDs.
pub type Clock = MonotonicClock;

/// Generator served over TCP: one lock-based delegate per configured machine
/// ID, picked round-robin.
pub type Generator = MultiFlakeGenerator<Clock>;
