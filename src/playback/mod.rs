//! Paced playback of decoded timelines.
//!
//! A [`PlaybackRun`] walks a [`TrajectoryReader`](crate::trajectory::TrajectoryReader)
//! one cycle at a time:
//!
//! ```text
//! read snapshot -> drop absent bodies -> project -> classify -> Frame
//!      ^                                                          |
//!      +------------ pacing wait (cancellable) <-- consumer ------+
//! ```
//!
//! The wait between frames is the only suspension point. It wakes as soon
//! as the run's [`CancelToken`] is cancelled, so stop requests take effect
//! within one frame interval at most.

mod cancel;
mod classify;
mod engine;
mod pace;
mod projection;
mod surface;

pub use cancel::CancelToken;
pub use classify::{DisplayCategory, HEAVY_MASS_THRESHOLD, MEDIUM_MASS_THRESHOLD, classify};
pub use engine::{
    Frame, PlaybackEngine, PlaybackError, PlaybackOutcome, PlaybackRun, PlaybackState,
    ProjectedPoint,
};
pub use pace::{FixedDelay, MAX_FRAME_DELAY_MS, PaceControl, PaceProvider, delay_for_pace};
pub use projection::{Projection, SPACE_BORDER, Viewport};
pub use surface::PresentationSurface;
