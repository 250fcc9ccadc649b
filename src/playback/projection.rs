//! World-to-viewport projection.

use serde::{Deserialize, Serialize};

/// Half-extent of the simulated world: the generator's space border
/// (`1 << 14`) with a 10% margin.
pub const SPACE_BORDER: f64 = (1 << 14) as f64 * 1.1;

/// Drawable area in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Half the height, rounded down.
    #[inline]
    pub fn half_height(&self) -> i32 {
        (self.height / 2) as i32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Linear map from world coordinates to pixels.
///
/// Both axes are scaled by the viewport half-height, so the world square
/// is drawn as a square anchored at the left edge. On a viewport wider than
/// it is tall the right-hand strip stays empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    space_border: f64,
    half_height: i32,
}

impl Projection {
    pub fn new(viewport: Viewport, space_border: f64) -> Self {
        let half_height = viewport.half_height();
        Self {
            space_border,
            half_height,
        }
    }

    /// Project one world-space coordinate pair.
    #[inline]
    pub fn project(&self, x: i32, y: i32) -> (i32, i32) {
        (self.axis(x), self.axis(y))
    }

    /// Pixels beyond the `i32` range saturate.
    #[inline]
    fn axis(&self, world: i32) -> i32 {
        let half_height = self.half_height as f64;
        ((world as f64 / self.space_border * half_height).round() + half_height) as i32
    }
}
