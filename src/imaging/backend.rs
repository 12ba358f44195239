//! Persistence backend trait and shared error type.
//!
//! The [`ImageBackend`] trait defines the operations the edit session needs
//! from storage: decode a file, encode a buffer to a file, create an output
//! directory, and list the images in a directory.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module's test
//! submodule.

use super::buffer::{BufferError, PixelBuffer};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: BufferError,
    },
    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: BufferError,
    },
    #[error("Unsupported output format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl BackendError {
    /// True for failures that mean "the bytes are not a readable image",
    /// as opposed to the file being missing or unreadable.
    pub fn is_decode(&self) -> bool {
        matches!(self, BackendError::Decode { .. })
    }
}

/// Trait for persistence backends.
///
/// The session only ever talks to storage through this trait, so the whole
/// state machine can be exercised against a mock.
pub trait ImageBackend: Sync {
    /// Read and decode an image file.
    fn decode(&self, path: &Path) -> Result<PixelBuffer, BackendError>;

    /// Encode `buffer` into `path`. The format follows the file extension;
    /// formats without alpha get the buffer flattened onto white.
    fn encode(&self, buffer: &PixelBuffer, path: &Path) -> Result<(), BackendError>;

    /// Create `dir` and any missing parents. Succeeds if it already exists.
    fn ensure_dir(&self, dir: &Path) -> Result<(), BackendError>;

    /// Filenames in `dir` (non-recursive) whose extension is in `extensions`,
    /// compared case-insensitively, sorted by name.
    fn list_images(&self, dir: &Path, extensions: &[String]) -> Result<Vec<String>, BackendError>;
}

/// Check a filename's extension against an allow-list, ignoring ASCII case.
pub fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}
