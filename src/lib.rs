//! Trajectory replay - Paced playback of precomputed N-body timelines.
//!
//! An offline N-body run writes a timeline: the body count, followed by the
//! position and mass of every body for each simulated cycle. This crate
//! decodes such timelines and turns them into a paced, cancellable stream of
//! render-ready frames for a presentation layer to draw.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `trajectory`: Timeline file format and the forward-only reader
//! - `playback`: Projection, classification, pacing and the playback engine
//! - `schema`: Configuration types
//!
//! # Example
//!
//! ```rust,no_run
//! use trajectory_replay::{
//!     playback::{CancelToken, PaceControl, PlaybackEngine},
//!     schema::PlaybackConfig,
//!     trajectory::TrajectoryReader,
//! };
//!
//! let config = PlaybackConfig::default();
//! let reader = TrajectoryReader::open("timeline.dat")?;
//! let pace = PaceControl::new(config.initial_pace, config.max_pace);
//!
//! let engine = PlaybackEngine::new(&config);
//! let run = engine.start(reader, config.viewport, pace, CancelToken::new())?;
//!
//! for frame in run {
//!     let frame = frame?;
//!     println!("cycle {}: {} bodies", frame.cycle_index, frame.visible_count);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod playback;
pub mod schema;
pub mod trajectory;

// Re-export commonly used types
pub use playback::{CancelToken, Frame, PlaybackEngine, PlaybackState};
pub use schema::PlaybackConfig;
pub use trajectory::{TrajectoryError, TrajectoryReader};
