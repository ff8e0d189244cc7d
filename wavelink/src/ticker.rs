//! Fixed-period stepping loop

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use wavelink_core::LinkResult;

/// Shared run flag cleared by the signal handler.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl RunFlag {
    /// Flag in the running state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Whether the loop should keep going.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Ask the loop to stop after the current tick.
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Call `step` once per `period` until `flag` is cleared or `max_ticks`
/// steps have run. Returns the number of steps taken.
///
/// A step that overruns its period is followed immediately by the next one.
pub fn run_loop(
    flag: &RunFlag,
    period: Duration,
    max_ticks: Option<u64>,
    mut step: impl FnMut(u64) -> LinkResult<()>,
) -> LinkResult<u64> {
    let mut tick = 0u64;
    let mut next = Instant::now();
    while flag.is_running() && max_ticks.is_none_or(|max| tick < max) {
        step(tick)?;
        tick += 1;

        next += period;
        let now = Instant::now();
        if next > now {
            std::thread::sleep(next - now);
        } else {
            next = now;
        }
    }
    Ok(tick)
}
