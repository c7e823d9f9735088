use crate::library::scheduler::interface::FrameScheduler;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Fires immediately and counts how many ticks were requested.
#[derive(Debug, Default)]
pub struct FrameSchedulerFake {
    ticks: AtomicUsize,
}

impl FrameSchedulerFake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }
}

impl FrameScheduler for FrameSchedulerFake {
    fn wait_for_tick(&self) -> Instant {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        Instant::now()
    }
}
