//! Seam between the engine and whatever draws frames.

use std::time::Duration;

use super::engine::{Frame, PlaybackOutcome};
use super::projection::Viewport;

/// A presentation layer driven by [`PlaybackEngine::play`].
///
/// `present` is called synchronously; the engine does not decode the next
/// cycle until it returns.
///
/// [`PlaybackEngine::play`]: super::PlaybackEngine::play
pub trait PresentationSurface {
    /// Current drawable area. Read before every frame.
    fn viewport(&self) -> Viewport;

    /// Delay to apply after the frame just presented.
    fn frame_delay(&self) -> Duration;

    /// Called once before the first frame.
    fn begin(&mut self, _cycle_count: u64, _body_count: usize) {}

    /// Draw one frame.
    fn present(&mut self, frame: Frame);

    /// Called once when the run ends, whatever the outcome.
    fn finish(&mut self, _outcome: &PlaybackOutcome) {}
}
