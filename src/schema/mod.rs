//! Schema module - Configuration types for trajectory playback.

mod config;

pub use config::*;
