//! Configuration types for trajectory playback.

use serde::{Deserialize, Serialize};

use crate::playback::{SPACE_BORDER, Viewport};

/// Top-level playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial drawable area in pixels.
    pub viewport: Viewport,
    /// Top of the speed scale; pace at this value plays without delay.
    pub max_pace: u32,
    /// Speed setting at start of playback.
    pub initial_pace: u32,
    /// World half-extent mapped onto half the viewport height.
    pub space_border: f64,
    /// Side of the square body marker in pixels.
    pub marker_size: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            max_pace: 100,
            initial_pace: 50,
            space_border: SPACE_BORDER,
            marker_size: 5,
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::InvalidViewport);
        }
        if self.max_pace == 0 {
            return Err(ConfigError::InvalidMaxPace);
        }
        if self.initial_pace > self.max_pace {
            return Err(ConfigError::PaceOutOfRange {
                pace: self.initial_pace,
                max: self.max_pace,
            });
        }
        if !self.space_border.is_finite() || self.space_border <= 0.0 {
            return Err(ConfigError::InvalidSpaceBorder);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Viewport dimensions must be non-zero")]
    InvalidViewport,
    #[error("Maximum pace must be non-zero")]
    InvalidMaxPace,
    #[error("Initial pace {pace} exceeds maximum pace {max}")]
    PaceOutOfRange { pace: u32, max: u32 },
    #[error("Space border must be finite and positive")]
    InvalidSpaceBorder,
}
