//! The filter library.
//!
//! Every filter is a pure function `(&PixelBuffer, Intensity) → PixelBuffer`.
//! The set is closed: [`Filter`] enumerates the variants and [`FILTERS`] maps
//! each one to its transform, display name and whether it reads the slider.
//!
//! | Filter | Parameter | 0 | 50 | 100 |
//! |---|---|---|---|---|
//! | [`Filter::Grayscale`] | — | | | |
//! | [`Filter::Color`] | factor = i/50 | desaturated | identity | 2× saturation |
//! | [`Filter::Contrast`] | factor = i/50 | flat mean gray | identity | 2× contrast |
//! | [`Filter::Sharpen`] | factor = i/50 | smoothed | identity | 2× sharpened |
//! | [`Filter::Blur`] | radius = i/10 | none | radius 5 | radius 10 |
//! | [`Filter::RotateLeft`] / [`RotateRight`](Filter::RotateRight) / [`Mirror`](Filter::Mirror) | — | | | |
//!
//! ## Enhance filters
//!
//! Color, contrast and sharpen share one model: compute a *degenerate*
//! version of the image, then blend
//! `out = degenerate + factor × (input − degenerate)` per channel, clamped
//! to `[0, 255]`. Factor 1.0 reproduces the input exactly.
//!
//! Blends round to nearest. Truncating toward zero instead shifts every
//! non-identity result down by up to one level.
//!
//! | Filter | Degenerate image |
//! |---|---|
//! | Color | luma re-expanded to color |
//! | Contrast | flat image of the rounded mean luma |
//! | Sharpen | 3×3 smoothing kernel `[1 1 1; 1 5 1; 1 1 1] / 13`, borders copied |
//!
//! Alpha passes through the enhance filters and grayscale unchanged.

use super::buffer::{ColorMode, PixelBuffer, luma};
use super::params::Intensity;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown filter: {0:?}")]
pub struct UnknownFilter(pub String);

/// A pure pixel transform.
pub type Transform = fn(&PixelBuffer, Intensity) -> PixelBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    Grayscale,
    Color,
    Contrast,
    Sharpen,
    Blur,
    RotateLeft,
    RotateRight,
    Mirror,
}

/// Lookup table entry for one filter.
pub struct FilterSpec {
    pub filter: Filter,
    /// Canonical lowercase name, also accepted by [`Filter::from_str`].
    pub name: &'static str,
    /// Button label shown in an editor UI, accepted case-insensitively.
    pub label: &'static str,
    /// Whether the intensity slider affects the result.
    pub parameterized: bool,
    pub apply: Transform,
}

/// Indexed by `Filter as usize`.
pub static FILTERS: [FilterSpec; 8] = [
    FilterSpec {
        filter: Filter::Grayscale,
        name: "grayscale",
        label: "B/W",
        parameterized: false,
        apply: grayscale,
    },
    FilterSpec {
        filter: Filter::Color,
        name: "color",
        label: "Color",
        parameterized: true,
        apply: color_enhance,
    },
    FilterSpec {
        filter: Filter::Contrast,
        name: "contrast",
        label: "Contrast",
        parameterized: true,
        apply: contrast_enhance,
    },
    FilterSpec {
        filter: Filter::Sharpen,
        name: "sharpen",
        label: "Sharpen",
        parameterized: true,
        apply: sharpen,
    },
    FilterSpec {
        filter: Filter::Blur,
        name: "blur",
        label: "Blur",
        parameterized: true,
        apply: gaussian_blur,
    },
    FilterSpec {
        filter: Filter::RotateLeft,
        name: "left",
        label: "Left",
        parameterized: false,
        apply: rotate_left,
    },
    FilterSpec {
        filter: Filter::RotateRight,
        name: "right",
        label: "Right",
        parameterized: false,
        apply: rotate_right,
    },
    FilterSpec {
        filter: Filter::Mirror,
        name: "mirror",
        label: "Mirror",
        parameterized: false,
        apply: mirror,
    },
];

impl Filter {
    pub fn spec(self) -> &'static FilterSpec {
        &FILTERS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn is_parameterized(self) -> bool {
        self.spec().parameterized
    }

    pub fn apply(self, buffer: &PixelBuffer, intensity: Intensity) -> PixelBuffer {
        (self.spec().apply)(buffer, intensity)
    }

    pub fn all() -> impl Iterator<Item = Filter> {
        FILTERS.iter().map(|spec| spec.filter)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FILTERS
            .iter()
            .find(|spec| {
                spec.name.eq_ignore_ascii_case(wanted) || spec.label.eq_ignore_ascii_case(wanted)
            })
            .map(|spec| spec.filter)
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

/// What a preview or commit applies: a filter on the baseline, or a reset to
/// the pristine original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Adjustment {
    Reset,
    Apply(Filter),
}

impl Adjustment {
    /// Compute the adjusted buffer. `Reset` ignores the baseline and copies
    /// the original; every filter reads only the baseline.
    pub fn render(
        self,
        baseline: &PixelBuffer,
        original: &PixelBuffer,
        intensity: Intensity,
    ) -> PixelBuffer {
        match self {
            Adjustment::Reset => original.clone(),
            Adjustment::Apply(filter) => filter.apply(baseline, intensity),
        }
    }
}

impl From<Filter> for Adjustment {
    fn from(filter: Filter) -> Self {
        Adjustment::Apply(filter)
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Reset => f.write_str("reset"),
            Adjustment::Apply(filter) => filter.fmt(f),
        }
    }
}

impl FromStr for Adjustment {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("reset") || wanted.eq_ignore_ascii_case("original") {
            return Ok(Adjustment::Reset);
        }
        wanted.parse().map(Adjustment::Apply)
    }
}

// =============================================================================
// Transforms
// =============================================================================

/// Collapse to luma and re-expand to the buffer's own channel count.
pub fn grayscale(buffer: &PixelBuffer, _: Intensity) -> PixelBuffer {
    map_color(buffer, |[r, g, b]| {
        let l = luma(r, g, b);
        [l, l, l]
    })
}

pub fn color_enhance(buffer: &PixelBuffer, intensity: Intensity) -> PixelBuffer {
    let factor = intensity.factor();
    map_color(buffer, |[r, g, b]| {
        let l = luma(r, g, b);
        [blend(l, r, factor), blend(l, g, factor), blend(l, b, factor)]
    })
}

pub fn contrast_enhance(buffer: &PixelBuffer, intensity: Intensity) -> PixelBuffer {
    let factor = intensity.factor();
    let mean = mean_luma(buffer);
    map_color(buffer, |[r, g, b]| {
        [
            blend(mean, r, factor),
            blend(mean, g, factor),
            blend(mean, b, factor),
        ]
    })
}

pub fn sharpen(buffer: &PixelBuffer, intensity: Intensity) -> PixelBuffer {
    let factor = intensity.factor();
    let smoothed = smooth(buffer);
    let c = buffer.channels();
    let samples = buffer
        .samples()
        .iter()
        .zip(smoothed.iter())
        .enumerate()
        .map(|(i, (&v, &d))| {
            if c == 4 && i % 4 == 3 {
                v
            } else {
                blend(d, v, factor)
            }
        })
        .collect();
    buffer.with_samples(samples)
}

pub fn gaussian_blur(buffer: &PixelBuffer, intensity: Intensity) -> PixelBuffer {
    let radius = intensity.radius();
    if radius <= 0.0 {
        return buffer.clone();
    }
    let blurred = buffer.to_dynamic().blur(radius);
    PixelBuffer::from_dynamic_as(&blurred, buffer.mode())
}

pub fn rotate_left(buffer: &PixelBuffer, _: Intensity) -> PixelBuffer {
    buffer.rotate90_ccw()
}

pub fn rotate_right(buffer: &PixelBuffer, _: Intensity) -> PixelBuffer {
    buffer.rotate90_cw()
}

pub fn mirror(buffer: &PixelBuffer, _: Intensity) -> PixelBuffer {
    buffer.flip_horizontal()
}

// =============================================================================
// Helpers
// =============================================================================

/// `degenerate + factor × (value − degenerate)`, rounded and clamped.
fn blend(degenerate: u8, value: u8, factor: f32) -> u8 {
    let d = degenerate as f32;
    (d + factor * (value as f32 - d)).round().clamp(0.0, 255.0) as u8
}

/// Apply `f` to the color channels of every pixel, leaving alpha alone.
///
/// Gray pixels are passed as `[v, v, v]` and take the first returned channel.
fn map_color(buffer: &PixelBuffer, f: impl Fn([u8; 3]) -> [u8; 3]) -> PixelBuffer {
    let mut samples = buffer.samples().to_vec();
    match buffer.mode() {
        ColorMode::Gray => {
            for v in &mut samples {
                *v = f([*v, *v, *v])[0];
            }
        }
        ColorMode::Rgb | ColorMode::Rgba => {
            for px in samples.chunks_exact_mut(buffer.channels()) {
                let [r, g, b] = f([px[0], px[1], px[2]]);
                px[0] = r;
                px[1] = g;
                px[2] = b;
            }
        }
    }
    buffer.with_samples(samples)
}

fn mean_luma(buffer: &PixelBuffer) -> u8 {
    let c = buffer.channels();
    let total: u64 = buffer
        .samples()
        .chunks_exact(c)
        .map(|px| match buffer.mode() {
            ColorMode::Gray => px[0] as u64,
            _ => luma(px[0], px[1], px[2]) as u64,
        })
        .sum();
    let count = buffer.width() as u64 * buffer.height() as u64;
    ((total as f64 / count as f64) + 0.5) as u8
}

/// 3×3 smoothing kernel over every channel. Border pixels are copied.
fn smooth(buffer: &PixelBuffer) -> Vec<u8> {
    let src = buffer.samples();
    let mut out = src.to_vec();
    let (w, h) = (buffer.width() as usize, buffer.height() as usize);
    if w < 3 || h < 3 {
        return out;
    }
    let c = buffer.channels();
    let at = |x: usize, y: usize, ch: usize| src[(y * w + x) * c + ch] as u32;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            for ch in 0..c {
                let mut sum = 4 * at(x, y, ch);
                for (dx, dy) in NEIGHBOURHOOD {
                    sum += at(x + dx - 1, y + dy - 1, ch);
                }
                out[(y * w + x) * c + ch] = ((sum + 6) / 13) as u8;
            }
        }
    }
    out
}

/// Offsets (shifted by +1) of the 3×3 window, centre included once.
const NEIGHBOURHOOD: [(usize, usize); 9] = [
    (0, 0),
    (1, 0),
    (2, 0),
    (0, 1),
    (1, 1),
    (2, 1),
    (0, 2),
    (1, 2),
    (2, 2),
];
