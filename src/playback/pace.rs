//! Inter-frame pacing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Longest delay between frames, reached at pace 0.
pub const MAX_FRAME_DELAY_MS: u64 = 100;

/// Source of the delay to apply after each frame.
///
/// Queried once per frame, so implementations may change their answer
/// while a run is in progress.
pub trait PaceProvider {
    fn frame_delay(&self) -> Duration;
}

impl<F> PaceProvider for F
where
    F: Fn() -> Duration,
{
    fn frame_delay(&self) -> Duration {
        self()
    }
}

/// Constant delay between frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDelay(pub Duration);

impl PaceProvider for FixedDelay {
    fn frame_delay(&self) -> Duration {
        self.0
    }
}

/// Delay for a pace value on a `[0, max_pace]` scale.
///
/// `max_pace` gives no delay, `0` gives [`MAX_FRAME_DELAY_MS`].
pub fn delay_for_pace(pace: u32, max_pace: u32) -> Duration {
    if max_pace == 0 {
        return Duration::ZERO;
    }
    let pace = pace.min(max_pace);
    let ms = (MAX_FRAME_DELAY_MS as f64 * (max_pace - pace) as f64 / max_pace as f64).round();
    Duration::from_millis(ms as u64)
}

/// Shared speed setting, adjusted by the presentation surface while the
/// engine reads it.
#[derive(Debug, Clone)]
pub struct PaceControl {
    pace: Arc<AtomicU32>,
    max_pace: u32,
}

impl PaceControl {
    pub fn new(initial: u32, max_pace: u32) -> Self {
        Self {
            pace: Arc::new(AtomicU32::new(initial.min(max_pace))),
            max_pace,
        }
    }

    pub fn pace(&self) -> u32 {
        self.pace.load(Ordering::Relaxed)
    }

    pub fn max_pace(&self) -> u32 {
        self.max_pace
    }

    /// Set the pace, clamped to `max_pace`.
    pub fn set_pace(&self, pace: u32) {
        let pace = pace.min(self.max_pace);
        let previous = self.pace.swap(pace, Ordering::Relaxed);
        if previous != pace {
            log::debug!("Pace changed {} -> {} (of {})", previous, pace, self.max_pace);
        }
    }
}

impl PaceProvider for PaceControl {
    fn frame_delay(&self) -> Duration {
        delay_for_pace(self.pace(), self.max_pace)
    }
}
