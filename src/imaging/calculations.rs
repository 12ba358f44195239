//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! The session runs the validators *before* computing anything, so a
//! rejected crop or resize never touches session state.

use super::buffer::BufferError;
use super::params::CropRect;

/// Check that a crop rectangle lies inside an image of the given size.
///
/// The rectangle must start inside `[0, width) × [0, height)`, be at least
/// one pixel in each direction, and not extend past the right or bottom edge.
///
/// # Examples
/// ```
/// # use retouch::imaging::{CropRect, validate_crop};
/// assert!(validate_crop(CropRect::new(0, 0, 100, 100), (100, 100)).is_ok());
/// assert!(validate_crop(CropRect::new(50, 0, 51, 10), (100, 100)).is_err());
/// ```
pub fn validate_crop(rect: CropRect, size: (u32, u32)) -> Result<(), BufferError> {
    let (width, height) = size;
    let out_of_bounds = || BufferError::Bounds {
        rect,
        width,
        height,
    };

    if rect.x >= width || rect.y >= height {
        return Err(out_of_bounds());
    }
    if rect.width == 0 || rect.height == 0 {
        return Err(out_of_bounds());
    }
    // u64 so x + width cannot wrap
    if rect.x as u64 + rect.width as u64 > width as u64
        || rect.y as u64 + rect.height as u64 > height as u64
    {
        return Err(out_of_bounds());
    }
    Ok(())
}

/// Check that resize target dimensions are positive.
pub fn validate_resize(width: u32, height: u32) -> Result<(), BufferError> {
    if width == 0 || height == 0 {
        return Err(BufferError::InvalidDimension { width, height });
    }
    Ok(())
}

/// Calculate the largest size that fits inside a viewport while keeping the
/// source aspect ratio.
///
/// Scales both up and down. Neither edge rounds below one pixel.
///
/// # Arguments
/// * `source` - Image dimensions (width, height)
/// * `viewport` - Available area (width, height)
///
/// # Returns
/// * `(width, height)` - Fitted dimensions (at least one edge matches the viewport)
pub fn fit_within(source: (u32, u32), viewport: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (view_w, view_h) = viewport;
    if src_w == 0 || src_h == 0 || view_w == 0 || view_h == 0 {
        return (0, 0);
    }

    let scale = (view_w as f64 / src_w as f64).min(view_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, view_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, view_h);
    (w, h)
}
