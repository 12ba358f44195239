//! Pure Rust persistence backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image` crate, format sniffed from content |
//! | Encode | `image` crate, format from the file extension |
//! | List | `walkdir`, depth 1, sorted by file name |
//! | Ensure dir | `std::fs::create_dir_all` |

use super::backend::{BackendError, ImageBackend, has_allowed_extension};
use super::buffer::PixelBuffer;
use super::params::Quality;
use image::ImageFormat;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Extensions whose codecs are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the image file extensions that can be both decoded and encoded.
pub fn supported_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Output format for a path, from its extension.
pub fn format_for_path(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?;
    PHOTO_CANDIDATES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, fmt)| *fmt)
}

/// Backend on the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    jpeg_quality: Quality,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            jpeg_quality: Quality::default(),
        }
    }

    pub fn with_quality(jpeg_quality: Quality) -> Self {
        Self { jpeg_quality }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<PixelBuffer, BackendError> {
        let bytes = std::fs::read(path)?;
        PixelBuffer::decode(&bytes).map_err(|source| BackendError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    fn encode(&self, buffer: &PixelBuffer, path: &Path) -> Result<(), BackendError> {
        let format =
            format_for_path(path).ok_or_else(|| BackendError::UnsupportedFormat(path.to_path_buf()))?;
        let bytes = buffer
            .encode(format, self.jpeg_quality)
            .map_err(|source| BackendError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn ensure_dir(&self, dir: &Path) -> Result<(), BackendError> {
        std::fs::create_dir_all(dir)?;
        Ok(())
    }

    fn list_images(&self, dir: &Path, extensions: &[String]) -> Result<Vec<String>, BackendError> {
        let mut names = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if has_allowed_extension(entry.path(), extensions) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }
}
