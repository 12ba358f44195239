//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the edit session (which decides what to apply) and the
//! pixel code in [`buffer`](super::buffer) and [`filters`](super::filters).
//!
//! ## Types
//!
//! - [`Intensity`] — Slider position for parameterized filters (0–100, default 50). Clamped on construction.
//! - [`Quality`] — Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CropRect`] — Crop rectangle in source pixel coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter intensity on the 0–100 slider scale.
///
/// The derived parameters are fixed: enhance filters use
/// [`factor`](Self::factor) (`value / 50`, so 50 is the identity) and the
/// blur uses [`radius`](Self::radius) (`value / 10`).
///
/// Deserializing goes through [`Intensity::new`], so out-of-range input is
/// clamped like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32")]
pub struct Intensity(u8);

impl Intensity {
    pub const MIN: Intensity = Intensity(0);
    pub const NEUTRAL: Intensity = Intensity(50);
    pub const MAX: Intensity = Intensity(100);

    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Enhancement factor: 0 → 0.0, 50 → 1.0, 100 → 2.0.
    pub fn factor(self) -> f32 {
        self.0 as f32 / 50.0
    }

    /// Gaussian blur radius: 0 → 0.0, 100 → 10.0.
    pub fn radius(self) -> f32 {
        self.0 as f32 / 10.0
    }
}

impl From<u32> for Intensity {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Crop rectangle: top-left corner plus size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}
