//! In-memory pixel buffers.
//!
//! A [`PixelBuffer`] is an 8-bit image in one of three [`ColorMode`]s with
//! samples stored row-major and interleaved. Buffers have value semantics:
//! every operation returns a new buffer and there is no way to mutate one
//! after construction, so two history entries can never alias.
//!
//! Geometric transforms (crop, rotate, flip) are plain index shuffles on the
//! sample vector. Resampling, decoding and encoding go through the `image`
//! crate:
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode | `image::load_from_memory` (format sniffed from content) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` after flattening alpha onto white |
//! | Encode → other | `DynamicImage::write_to` |

use super::calculations::{validate_crop, validate_resize};
use super::params::{CropRect, Quality};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Crop {rect} is outside the {width}x{height} image")]
    Bounds {
        rect: CropRect,
        width: u32,
        height: u32,
    },
    #[error("Invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimension { width: u32, height: u32 },
    #[error("Expected {expected} samples for the image, got {actual}")]
    SampleLength { expected: usize, actual: usize },
}

/// Channel layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Gray,
    Rgb,
    Rgba,
}

impl ColorMode {
    pub fn channels(self) -> usize {
        match self {
            ColorMode::Gray => 1,
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, ColorMode::Rgba)
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorMode::Gray => "gray",
            ColorMode::Rgb => "rgb",
            ColorMode::Rgba => "rgba",
        };
        f.write_str(name)
    }
}

/// ITU-R 601-2 luma, rounded: `R*299/1000 + G*587/1000 + B*114/1000`.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// An immutable 8-bit image.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    mode: ColorMode,
    samples: Vec<u8>,
}

impl fmt::Debug for PixelBuffer {
    // Samples are left out; a 100x100 image would print 40k numbers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    /// Wrap raw samples. Fails unless `samples.len() == width * height * channels`
    /// and both dimensions are positive.
    pub fn new(
        width: u32,
        height: u32,
        mode: ColorMode,
        samples: Vec<u8>,
    ) -> Result<Self, BufferError> {
        validate_resize(width, height)?;
        let expected = width as usize * height as usize * mode.channels();
        if samples.len() != expected {
            return Err(BufferError::SampleLength {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            mode,
            samples,
        })
    }

    /// Build a buffer by evaluating `f` at every pixel.
    ///
    /// `f` returns RGBA; channels the mode does not have are ignored, and a
    /// gray buffer takes the first channel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mode: ColorMode,
        mut f: impl FnMut(u32, u32) -> [u8; 4],
    ) -> Result<Self, BufferError> {
        let channels = mode.channels();
        let mut samples = Vec::with_capacity(width as usize * height as usize * channels);
        for y in 0..height {
            for x in 0..width {
                samples.extend_from_slice(&f(x, y)[..channels]);
            }
        }
        Self::new(width, height, mode, samples)
    }

    /// Decode an encoded image (PNG, JPEG, TIFF, WebP, BMP).
    ///
    /// Color types map to the closest mode: luma → gray, luma+alpha and any
    /// RGBA → rgba, RGB → rgb. 16-bit and float samples are narrowed to 8 bits.
    pub fn decode(bytes: &[u8]) -> Result<Self, BufferError> {
        let img = image::load_from_memory(bytes).map_err(|e| BufferError::Decode(e.to_string()))?;
        Ok(Self::from_dynamic(&img))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn channels(&self) -> usize {
        self.mode.channels()
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Samples of one pixel. Panics if `(x, y)` is outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of range");
        let c = self.channels();
        let start = (y as usize * self.width as usize + x as usize) * c;
        &self.samples[start..start + c]
    }

    /// Same geometry and mode, new samples. Used by filters that keep the layout.
    pub(crate) fn with_samples(&self, samples: Vec<u8>) -> Self {
        debug_assert_eq!(samples.len(), self.samples.len());
        Self {
            width: self.width,
            height: self.height,
            mode: self.mode,
            samples,
        }
    }

    /// Convert to another color mode.
    ///
    /// Gray expands by replicating luma; color collapses through [`luma`].
    /// Adding alpha makes every pixel opaque; dropping alpha discards it.
    pub fn to_mode(&self, mode: ColorMode) -> Self {
        if mode == self.mode {
            return self.clone();
        }
        let src = self.channels();
        let mut samples = Vec::with_capacity(self.pixel_count() * mode.channels());
        for px in self.samples.chunks_exact(src) {
            let (r, g, b, a) = match self.mode {
                ColorMode::Gray => (px[0], px[0], px[0], 255),
                ColorMode::Rgb => (px[0], px[1], px[2], 255),
                ColorMode::Rgba => (px[0], px[1], px[2], px[3]),
            };
            match mode {
                ColorMode::Gray => samples.push(luma(r, g, b)),
                ColorMode::Rgb => samples.extend_from_slice(&[r, g, b]),
                ColorMode::Rgba => samples.extend_from_slice(&[r, g, b, a]),
            }
        }
        Self {
            width: self.width,
            height: self.height,
            mode,
            samples,
        }
    }

    /// Extract a sub-rectangle. Fails with [`BufferError::Bounds`] unless the
    /// rectangle lies entirely inside the image.
    pub fn crop(&self, rect: CropRect) -> Result<Self, BufferError> {
        validate_crop(rect, self.dimensions())?;
        let c = self.channels();
        let row_len = self.width as usize * c;
        let mut samples = Vec::with_capacity(rect.width as usize * rect.height as usize * c);
        for y in rect.y..rect.y + rect.height {
            let start = y as usize * row_len + rect.x as usize * c;
            samples.extend_from_slice(&self.samples[start..start + rect.width as usize * c]);
        }
        Ok(Self {
            width: rect.width,
            height: rect.height,
            mode: self.mode,
            samples,
        })
    }

    /// Resample to exactly `width × height` with Lanczos3.
    pub fn resize(&self, width: u32, height: u32) -> Result<Self, BufferError> {
        validate_resize(width, height)?;
        if (width, height) == self.dimensions() {
            return Ok(self.clone());
        }
        let resized = self
            .to_dynamic()
            .resize_exact(width, height, FilterType::Lanczos3);
        Ok(Self::from_dynamic_as(&resized, self.mode))
    }

    /// Rotate a quarter turn clockwise. Width and height swap.
    pub fn rotate90_cw(&self) -> Self {
        // Destination (x, y) reads source (y, H-1-x).
        let h = self.height;
        self.remap(self.height, self.width, |x, y| (y, h - 1 - x))
    }

    /// Rotate a quarter turn counter-clockwise. Width and height swap.
    pub fn rotate90_ccw(&self) -> Self {
        // Destination (x, y) reads source (W-1-y, x).
        let w = self.width;
        self.remap(self.height, self.width, |x, y| (w - 1 - y, x))
    }

    /// Mirror left-to-right.
    pub fn flip_horizontal(&self) -> Self {
        let w = self.width;
        self.remap(self.width, self.height, |x, y| (w - 1 - x, y))
    }

    /// Composite alpha onto an opaque white background, producing an RGB buffer.
    ///
    /// Buffers without alpha are returned as-is.
    pub fn flatten_alpha(&self) -> Self {
        if !self.mode.has_alpha() {
            return self.clone();
        }
        let mut samples = Vec::with_capacity(self.pixel_count() * 3);
        for px in self.samples.chunks_exact(4) {
            let a = px[3] as u32;
            for &c in &px[..3] {
                samples.push(((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            mode: ColorMode::Rgb,
            samples,
        }
    }

    /// Encode to bytes in the given container format.
    ///
    /// Formats without an alpha channel (JPEG) get the alpha composited onto
    /// white first. `quality` only affects lossy formats.
    pub fn encode(&self, format: ImageFormat, quality: Quality) -> Result<Vec<u8>, BufferError> {
        let source: Cow<'_, PixelBuffer> = if self.mode.has_alpha() && !supports_alpha(format) {
            Cow::Owned(self.flatten_alpha())
        } else {
            Cow::Borrowed(self)
        };
        let dynamic = source.to_dynamic();

        let mut bytes = Vec::new();
        let written = match format {
            ImageFormat::Jpeg => {
                let q = quality.value().min(100) as u8;
                let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, q);
                dynamic.write_with_encoder(encoder)
            }
            other => dynamic.write_to(&mut Cursor::new(&mut bytes), other),
        };
        written.map_err(|e| BufferError::Encode(format!("{format:?}: {e}")))?;
        Ok(bytes)
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Build a `dst_w × dst_h` buffer where each destination pixel copies the
    /// source pixel returned by `source_of(x, y)`.
    fn remap(&self, dst_w: u32, dst_h: u32, source_of: impl Fn(u32, u32) -> (u32, u32)) -> Self {
        let c = self.channels();
        let mut samples = Vec::with_capacity(self.samples.len());
        for y in 0..dst_h {
            for x in 0..dst_w {
                let (sx, sy) = source_of(x, y);
                let start = (sy as usize * self.width as usize + sx as usize) * c;
                samples.extend_from_slice(&self.samples[start..start + c]);
            }
        }
        Self {
            width: dst_w,
            height: dst_h,
            mode: self.mode,
            samples,
        }
    }

    pub(crate) fn to_dynamic(&self) -> DynamicImage {
        let (w, h) = self.dimensions();
        let raw = self.samples.clone();
        // Sample length is checked by every constructor, so from_raw cannot fail.
        let img = match self.mode {
            ColorMode::Gray => image::GrayImage::from_raw(w, h, raw).map(DynamicImage::ImageLuma8),
            ColorMode::Rgb => image::RgbImage::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
            ColorMode::Rgba => image::RgbaImage::from_raw(w, h, raw).map(DynamicImage::ImageRgba8),
        };
        img.expect("sample length validated at construction")
    }

    pub(crate) fn from_dynamic(img: &DynamicImage) -> Self {
        let mode = match img.color() {
            ColorType::L8 | ColorType::L16 => ColorMode::Gray,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
            _ => ColorMode::Rgba,
        };
        Self::from_dynamic_as(img, mode)
    }

    pub(crate) fn from_dynamic_as(img: &DynamicImage, mode: ColorMode) -> Self {
        let samples = match mode {
            ColorMode::Gray => img.to_luma8().into_raw(),
            ColorMode::Rgb => img.to_rgb8().into_raw(),
            ColorMode::Rgba => img.to_rgba8().into_raw(),
        };
        Self {
            width: img.width(),
            height: img.height(),
            mode,
            samples,
        }
    }
}

/// Whether the encoder for `format` keeps an alpha channel.
pub fn supports_alpha(format: ImageFormat) -> bool {
    !matches!(format, ImageFormat::Jpeg)
}
