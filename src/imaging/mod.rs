//! Image processing — buffers, filters, and the persistence seam.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` crate codecs |
//! | **Resize** | `DynamicImage::resize_exact` with Lanczos3 |
//! | **Gaussian blur** | `DynamicImage::blur` |
//! | **Enhance, grayscale, rotate, crop** | hand-written loops on [`PixelBuffer`] samples |
//!
//! The module is split into:
//! - **Buffer**: [`PixelBuffer`] and its geometric transforms
//! - **Filters**: the closed [`Filter`] set and its lookup table
//! - **Calculations**: Pure functions for crop/resize validation and viewport fit
//! - **Parameters**: [`Intensity`], [`Quality`], [`CropRect`]
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod buffer;
mod calculations;
pub mod filters;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use buffer::{BufferError, ColorMode, PixelBuffer, luma};
pub use calculations::{fit_within, validate_crop, validate_resize};
pub use filters::{Adjustment, Filter, UnknownFilter};
pub use params::{CropRect, Intensity, Quality};
pub use rust_backend::{RustBackend, supported_extensions};
