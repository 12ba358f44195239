//! Shared test utilities for the retouch test suite.
//!
//! Synthetic buffers with predictable content, so tests never depend on
//! fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = gradient(32, 16, ColorMode::Rgba);
//! let flat = solid(8, 8, ColorMode::Rgb, [10, 20, 30, 255]);
//! ```

use crate::imaging::{ColorMode, PixelBuffer};

// =========================================================================
// Buffer builders
// =========================================================================

/// A buffer where every channel varies across the image.
///
/// Red follows x, green follows y, blue mixes both, and alpha cycles through
/// a range of partial opacities. No two neighbouring pixels are equal, which
/// makes orientation and round-trip mistakes show up.
pub fn gradient(width: u32, height: u32, mode: ColorMode) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, mode, |x, y| {
        let r = (x * 255 / width.saturating_sub(1).max(1)) as u8;
        let g = (y * 255 / height.saturating_sub(1).max(1)) as u8;
        let b = ((x * 37 + y * 71) % 256) as u8;
        let a = 128 + ((x * 13 + y * 29) % 128) as u8;
        match mode {
            // Gray takes the first channel, so give it a varied value
            ColorMode::Gray => [((x * 31 + y * 17) % 256) as u8, 0, 0, 255],
            _ => [r, g, b, a],
        }
    })
    .unwrap()
}

/// A buffer filled with one color. `rgba` is narrowed to the mode's channels.
pub fn solid(width: u32, height: u32, mode: ColorMode, rgba: [u8; 4]) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, mode, |_, _| rgba).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_neighbours_differ() {
        let img = gradient(6, 4, ColorMode::Rgb);
        assert_ne!(img.pixel(0, 0), img.pixel(1, 0));
        assert_ne!(img.pixel(0, 0), img.pixel(0, 1));
    }

    #[test]
    fn gradient_single_pixel_is_valid() {
        assert_eq!(gradient(1, 1, ColorMode::Rgba).dimensions(), (1, 1));
    }

    #[test]
    fn solid_is_uniform() {
        let img = solid(3, 3, ColorMode::Rgba, [1, 2, 3, 4]);
        assert!(img.samples().chunks(4).all(|p| p == [1, 2, 3, 4]));
    }
}
