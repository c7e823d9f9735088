use crate::library::scheduler::interface::FrameScheduler;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Ticks on a fixed grid anchored at creation time, like a display vsync.
///
/// A slow iteration does not shift the grid: the next tick is the first grid
/// point after the call, so missed ticks are dropped rather than queued.
pub struct FrameSchedulerRefreshRate {
    origin: Instant,
    period: Duration,
    last_tick: Mutex<u64>,
}

impl FrameSchedulerRefreshRate {
    pub fn new(refresh_hz: u32) -> Self {
        let period = Duration::from_nanos(1_000_000_000 / refresh_hz.max(1) as u64);
        Self {
            origin: Instant::now(),
            period,
            last_tick: Mutex::new(0),
        }
    }

    fn next_tick_index(&self, now: Instant, last_tick: u64) -> u64 {
        let elapsed = now.duration_since(self.origin).as_nanos();
        let period = self.period.as_nanos().max(1);
        let current = (elapsed / period) as u64;
        (current + 1).max(last_tick + 1)
    }
}

impl FrameScheduler for FrameSchedulerRefreshRate {
    fn wait_for_tick(&self) -> Instant {
        let mut last_tick = match self.last_tick.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let index = self.next_tick_index(Instant::now(), *last_tick);
        let deadline = self.origin
            + Duration::from_nanos((self.period.as_nanos() as u64).saturating_mul(index));

        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }

        *last_tick = index;
        deadline
    }
}
