//! The edit session state machine.
//!
//! An [`Editor`] holds at most one loaded image. Loading creates a fresh
//! session; every later operation works on it until the next load or
//! [`Editor::close`].
//!
//! ```text
//!            load ok                  preview
//!   Empty ───────────▶ Committed ◀──────────────▶ Previewing
//!     ▲  ◀───────────      │     commit / undo / redo /
//!     │   load failed      │     crop / resize / discard
//!     └──── close ─────────┘
//! ```
//!
//! ## History
//!
//! History is a linear list of committed buffers with an index pointing at the
//! active one. Entry 0 is always the image as loaded. Committing while the
//! index is behind the end drops every entry after it first, so redo
//! information is lost rather than merged.
//!
//! Filters always read the active history entry (the *baseline*), never a
//! preview. [`Adjustment::Reset`] is the only way back to the pristine
//! original, and it is itself a commit.
//!
//! ## Persistence
//!
//! Every commit, crop and resize writes the new state to the default save
//! target, `<image dir>/<edits_dir>/<filename>`. The edits directory is
//! created on the first write. A failed write is reported as
//! [`SessionError::Io`], but the history change stays applied.
//!
//! ## Display
//!
//! Every transition that changes the visible buffer calls
//! [`Display::render`] exactly once.

use crate::config::EditorConfig;
use crate::display::Display;
use crate::imaging::{
    Adjustment, BackendError, BufferError, ColorMode, CropRect, ImageBackend, Intensity,
    PixelBuffer, UnknownFilter, validate_crop, validate_resize,
};
use crate::preview::PreviewPipeline;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No image loaded")]
    NoImageLoaded,
    #[error("Failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Crop {rect} is outside the {width}x{height} image")]
    Bounds {
        rect: CropRect,
        width: u32,
        height: u32,
    },
    #[error("Invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimension { width: u32, height: u32 },
    #[error(transparent)]
    Buffer(BufferError),
    #[error("Nothing to undo")]
    UndoUnavailable,
    #[error("Nothing to redo")]
    RedoUnavailable,
    #[error(transparent)]
    UnknownFilter(#[from] UnknownFilter),
    #[error("Failed to start preview workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl SessionError {
    /// True when a load failed because the file is not a readable image.
    pub fn is_decode(&self) -> bool {
        matches!(self, SessionError::Load { source, .. } if source.is_decode())
    }
}

impl From<BufferError> for SessionError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::Bounds {
                rect,
                width,
                height,
            } => SessionError::Bounds {
                rect,
                width,
                height,
            },
            BufferError::InvalidDimension { width, height } => {
                SessionError::InvalidDimension { width, height }
            }
            other => SessionError::Buffer(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Committed,
    Previewing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Empty => "empty",
            SessionState::Committed => "committed",
            SessionState::Previewing => "previewing",
        })
    }
}

/// Where the session sits in its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryPosition {
    pub index: usize,
    pub len: usize,
}

impl HistoryPosition {
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.len
    }
}

/// Snapshot of the editor for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ColorMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_path: Option<PathBuf>,
}

/// One loaded image with its history.
struct EditSession {
    original: Arc<PixelBuffer>,
    history: Vec<Arc<PixelBuffer>>,
    index: usize,
    current: Arc<PixelBuffer>,
    previewing: bool,
    source_path: PathBuf,
    source_filename: String,
}

impl EditSession {
    fn new(buffer: PixelBuffer, source_path: &Path) -> Self {
        let original = Arc::new(buffer);
        Self {
            history: vec![original.clone()],
            current: original.clone(),
            original,
            index: 0,
            previewing: false,
            source_path: source_path.to_path_buf(),
            source_filename: source_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    fn baseline(&self) -> &Arc<PixelBuffer> {
        &self.history[self.index]
    }

    fn render(&self, adjustment: Adjustment, intensity: Intensity) -> PixelBuffer {
        adjustment.render(self.baseline(), &self.original, intensity)
    }

    /// Truncate any redo entries, then append `buffer` as the active state.
    fn push(&mut self, buffer: PixelBuffer) {
        self.history.truncate(self.index + 1);
        let entry = Arc::new(buffer);
        self.history.push(entry.clone());
        self.index = self.history.len() - 1;
        self.current = entry;
        self.previewing = false;
    }

    /// Make the history entry at `index` active again.
    fn restore(&mut self, index: usize) {
        self.index = index;
        self.current = self.history[index].clone();
        self.previewing = false;
    }

    fn position(&self) -> HistoryPosition {
        HistoryPosition {
            index: self.index,
            len: self.history.len(),
        }
    }

    fn session_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or(Path::new(""))
    }
}

/// A single-image editor over a persistence backend and a display.
pub struct Editor<B: ImageBackend, D: Display> {
    backend: B,
    display: D,
    config: EditorConfig,
    session: Option<EditSession>,
    previews: PreviewPipeline,
}

impl<B: ImageBackend, D: Display> Editor<B, D> {
    /// Create an empty editor. Preview workers are sized from
    /// `config.processing`.
    pub fn new(backend: B, display: D, config: EditorConfig) -> Result<Self, SessionError> {
        let threads = crate::config::effective_threads(&config.processing);
        Ok(Self {
            backend,
            display,
            config,
            session: None,
            previews: PreviewPipeline::new(threads)?,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Load an image, replacing any current session.
    ///
    /// On failure the editor is left Empty.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        self.session = None;
        self.previews.invalidate();

        let decoded = self
            .backend
            .decode(path)
            .map_err(|source| SessionError::Load {
                path: path.to_path_buf(),
                source,
            })?;
        let decoded = if self.config.session.force_rgba {
            decoded.to_mode(ColorMode::Rgba)
        } else {
            decoded
        };
        info!(
            "Loaded {} ({}x{} {})",
            path.display(),
            decoded.width(),
            decoded.height(),
            decoded.mode()
        );

        let session = EditSession::new(decoded, path);
        self.display.render(&session.current);
        self.session = Some(session);
        Ok(())
    }

    /// Show `adjustment` applied to the baseline without touching history or
    /// disk.
    pub fn preview(
        &mut self,
        adjustment: impl Into<Adjustment>,
        intensity: Intensity,
    ) -> Result<(), SessionError> {
        let adjustment = adjustment.into();
        let session = self.session.as_mut().ok_or(SessionError::NoImageLoaded)?;
        self.previews.invalidate();

        session.current = Arc::new(session.render(adjustment, intensity));
        session.previewing = true;
        self.display.render(&session.current);
        debug!("Previewing {adjustment} @ {intensity}");
        Ok(())
    }

    /// Apply `adjustment` to the baseline, append the result to history and
    /// persist it.
    pub fn commit(
        &mut self,
        adjustment: impl Into<Adjustment>,
        intensity: Intensity,
    ) -> Result<(), SessionError> {
        let adjustment = adjustment.into();
        let session = self.session.as_ref().ok_or(SessionError::NoImageLoaded)?;
        let result = session.render(adjustment, intensity);
        self.record(result, &format!("{adjustment} @ {intensity}"))
    }

    /// Crop the visible buffer and commit the result.
    pub fn crop(&mut self, rect: CropRect) -> Result<(), SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoImageLoaded)?;
        validate_crop(rect, session.current.dimensions())?;
        let result = session.current.crop(rect)?;
        self.record(result, &format!("crop {rect}"))
    }

    /// Resample the visible buffer to exactly `width`×`height` and commit the
    /// result.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoImageLoaded)?;
        validate_resize(width, height)?;
        let result = session.current.resize(width, height)?;
        self.record(result, &format!("resize {width}x{height}"))
    }

    pub fn undo(&mut self) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoImageLoaded)?;
        if session.index == 0 {
            return Err(SessionError::UndoUnavailable);
        }
        let index = session.index - 1;
        self.previews.invalidate();
        session.restore(index);
        self.display.render(&session.current);
        debug!("Undo → {}/{}", session.index, session.history.len() - 1);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoImageLoaded)?;
        if session.index + 1 >= session.history.len() {
            return Err(SessionError::RedoUnavailable);
        }
        let index = session.index + 1;
        self.previews.invalidate();
        session.restore(index);
        self.display.render(&session.current);
        debug!("Redo → {}/{}", session.index, session.history.len() - 1);
        Ok(())
    }

    /// Drop an active preview and show the baseline again.
    pub fn discard_preview(&mut self) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoImageLoaded)?;
        self.previews.invalidate();
        if session.previewing {
            let index = session.index;
            session.restore(index);
            self.display.render(&session.current);
        }
        Ok(())
    }

    /// Export the visible buffer to `path`. History is not affected and
    /// missing parent directories are not created.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        let session = self.session.as_ref().ok_or(SessionError::NoImageLoaded)?;
        self.backend
            .encode(&session.current, path)
            .map_err(|source| SessionError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Saved {}", path.display());
        Ok(())
    }

    /// Export the visible buffer to [`suggested_save_as_path`](Self::suggested_save_as_path),
    /// creating the edits directory if needed. Returns the path written.
    pub fn save_as_suggested(&mut self) -> Result<PathBuf, SessionError> {
        let path = self
            .suggested_save_as_path()
            .ok_or(SessionError::NoImageLoaded)?;
        if let Some(dir) = path.parent() {
            self.backend
                .ensure_dir(dir)
                .map_err(|source| SessionError::Io {
                    path: path.clone(),
                    source,
                })?;
        }
        self.save_as(&path)?;
        Ok(path)
    }

    /// Unload the image and return to Empty.
    pub fn close(&mut self) {
        self.previews.invalidate();
        if let Some(session) = self.session.take() {
            debug!("Closed {}", session.source_path.display());
        }
    }

    fn record(&mut self, result: PixelBuffer, label: &str) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoImageLoaded)?;
        self.previews.invalidate();
        session.push(result);
        self.display.render(&session.current);
        info!(
            "Committed {label} ({}/{})",
            session.index,
            session.history.len() - 1
        );
        persist(&self.backend, &self.config, session)
    }

    // =========================================================================
    // Asynchronous previews
    // =========================================================================

    /// Queue a preview on the worker pool. Returns its sequence number.
    ///
    /// Only the most recent request can win, and any transition issued before
    /// it reports cancels it.
    pub fn request_preview(
        &mut self,
        adjustment: impl Into<Adjustment>,
        intensity: Intensity,
    ) -> Result<u64, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoImageLoaded)?;
        Ok(self.previews.submit(
            session.baseline().clone(),
            session.original.clone(),
            adjustment.into(),
            intensity,
        ))
    }

    /// Apply a finished preview if one is ready. Returns whether the visible
    /// buffer changed.
    pub fn poll_previews(&mut self) -> bool {
        let ready = self.previews.drain();
        self.show_preview(ready)
    }

    /// Block until every queued preview has reported, then apply the winner.
    pub fn wait_previews(&mut self) -> bool {
        let ready = self.previews.wait();
        self.show_preview(ready)
    }

    fn show_preview(&mut self, ready: Option<PixelBuffer>) -> bool {
        let (Some(buffer), Some(session)) = (ready, self.session.as_mut()) else {
            return false;
        };
        session.current = Arc::new(buffer);
        session.previewing = true;
        self.display.render(&session.current);
        true
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> SessionState {
        match &self.session {
            None => SessionState::Empty,
            Some(s) if s.previewing => SessionState::Previewing,
            Some(_) => SessionState::Committed,
        }
    }

    /// The buffer on screen: the active history entry or a preview.
    pub fn current(&self) -> Option<&PixelBuffer> {
        self.session.as_ref().map(|s| s.current.as_ref())
    }

    /// The image exactly as loaded.
    pub fn original(&self) -> Option<&PixelBuffer> {
        self.session.as_ref().map(|s| s.original.as_ref())
    }

    pub fn position(&self) -> Option<HistoryPosition> {
        self.session.as_ref().map(EditSession::position)
    }

    /// The committed buffer at `index`, if it exists.
    pub fn history_entry(&self, index: usize) -> Option<&PixelBuffer> {
        self.session
            .as_ref()
            .and_then(|s| s.history.get(index))
            .map(|b| b.as_ref())
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.source_path.as_path())
    }

    /// `<image dir>/<edits_dir>/<filename>`, where commits are written.
    pub fn default_save_path(&self) -> Option<PathBuf> {
        self.session
            .as_ref()
            .map(|s| default_save_path(&self.config, s))
    }

    /// `<image dir>/<edits_dir>/<prefix><filename>`, the Save As suggestion.
    pub fn suggested_save_as_path(&self) -> Option<PathBuf> {
        self.session.as_ref().map(|s| {
            s.session_dir().join(&self.config.session.edits_dir).join(format!(
                "{}{}",
                self.config.export.save_as_prefix, s.source_filename
            ))
        })
    }

    pub fn summary(&self) -> SessionSummary {
        let current = self.current();
        SessionSummary {
            state: self.state(),
            source: self.source_path().map(Path::to_path_buf),
            width: current.map(PixelBuffer::width),
            height: current.map(PixelBuffer::height),
            mode: current.map(PixelBuffer::mode),
            history: self.position(),
            save_path: self.default_save_path(),
        }
    }

    /// Images in `dir` matching the configured extensions, sorted by name.
    /// Works with or without a loaded image.
    pub fn list_images(&self, dir: impl AsRef<Path>) -> Result<Vec<String>, SessionError> {
        let dir = dir.as_ref();
        self.backend
            .list_images(dir, &self.config.browse.extensions)
            .map_err(|source| SessionError::Io {
                path: dir.to_path_buf(),
                source,
            })
    }
}

fn default_save_path(config: &EditorConfig, session: &EditSession) -> PathBuf {
    session
        .session_dir()
        .join(&config.session.edits_dir)
        .join(&session.source_filename)
}

/// Write the active state to the default save target, creating the edits
/// directory if needed.
fn persist<B: ImageBackend>(
    backend: &B,
    config: &EditorConfig,
    session: &EditSession,
) -> Result<(), SessionError> {
    let target = default_save_path(config, session);
    let io_error = |source| SessionError::Io {
        path: target.clone(),
        source,
    };
    let result = match target.parent() {
        Some(dir) => backend.ensure_dir(dir),
        None => Ok(()),
    }
    .and_then(|()| backend.encode(&session.current, &target));

    match result {
        Ok(()) => {
            debug!("Wrote {}", target.display());
            Ok(())
        }
        Err(source) => {
            warn!(
                "Edit kept in history but not written to {}: {source}",
                target.display()
            );
            Err(io_error(source))
        }
    }
}
