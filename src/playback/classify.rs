//! Mass-based display categories.
//!
//! The categories split a timeline into stars, giant planets and everything
//! else.

/// Masses above this are drawn as [`DisplayCategory::Heavy`].
pub const HEAVY_MASS_THRESHOLD: i32 = 1_900_000;

/// Masses above this (and up to [`HEAVY_MASS_THRESHOLD`]) are drawn as
/// [`DisplayCategory::Medium`].
pub const MEDIUM_MASS_THRESHOLD: i32 = 1_000;

/// How a body is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayCategory {
    Heavy,
    Medium,
    Light,
}

impl DisplayCategory {
    pub const ALL: [DisplayCategory; 3] = [
        DisplayCategory::Heavy,
        DisplayCategory::Medium,
        DisplayCategory::Light,
    ];

    /// Marker color as RGB.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            DisplayCategory::Heavy => [255, 255, 0],
            DisplayCategory::Medium => [0, 128, 0],
            DisplayCategory::Light => [128, 128, 128],
        }
    }

    /// Position in [`DisplayCategory::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Classify a body by mass.
///
/// Callers filter out absent (negative-mass) bodies first; a negative
/// mass here still maps to [`DisplayCategory::Light`].
#[inline]
pub fn classify(mass: i32) -> DisplayCategory {
    if mass > HEAVY_MASS_THRESHOLD {
        DisplayCategory::Heavy
    } else if mass > MEDIUM_MASS_THRESHOLD {
        DisplayCategory::Medium
    } else {
        DisplayCategory::Light
    }
}
