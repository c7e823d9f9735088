use std::time::Instant;

/// Host render cadence. The capture loop asks for the next tick before every
/// iteration instead of rescheduling itself.
pub trait FrameScheduler: Send + Sync {
    /// Blocks until the next refresh tick and returns when it fired.
    fn wait_for_tick(&self) -> Instant;
}
