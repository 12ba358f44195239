//! Display adapters.
//!
//! The session calls [`Display::render`] after every state change that alters
//! the visible buffer. Real UIs blit the buffer; the adapters here cover the
//! headless cases.
//!
//! | Adapter | Behavior |
//! |---|---|
//! | [`LogDisplay`] | logs the fitted frame size at `debug` level (CLI) |
//! | [`FrameDisplay`] | keeps the last frame scaled into its viewport |
//! | [`NullDisplay`] | ignores frames |

use crate::config::DisplayConfig;
use crate::imaging::{PixelBuffer, fit_within};
use log::debug;

/// Receives every frame the session wants shown.
pub trait Display {
    fn render(&mut self, buffer: &PixelBuffer);
}

/// Target area a frame is fitted into, preserving aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size `buffer` is drawn at inside this viewport.
    pub fn fit(&self, buffer: &PixelBuffer) -> (u32, u32) {
        fit_within(buffer.dimensions(), (self.width, self.height))
    }
}

impl From<&DisplayConfig> for Viewport {
    fn from(config: &DisplayConfig) -> Self {
        Self::new(config.width, config.height)
    }
}

/// Logs each frame instead of drawing it.
#[derive(Debug)]
pub struct LogDisplay {
    viewport: Viewport,
    frames: usize,
}

impl LogDisplay {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            frames: 0,
        }
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Display for LogDisplay {
    fn render(&mut self, buffer: &PixelBuffer) {
        self.frames += 1;
        let (w, h) = self.viewport.fit(buffer);
        debug!(
            "frame {}: {}x{} {} shown at {}x{}",
            self.frames,
            buffer.width(),
            buffer.height(),
            buffer.mode(),
            w,
            h
        );
    }
}

/// Keeps the most recent frame, resized to fit the viewport.
#[derive(Debug)]
pub struct FrameDisplay {
    viewport: Viewport,
    last: Option<PixelBuffer>,
    frames: usize,
}

impl FrameDisplay {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            last: None,
            frames: 0,
        }
    }

    pub fn last_frame(&self) -> Option<&PixelBuffer> {
        self.last.as_ref()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Display for FrameDisplay {
    fn render(&mut self, buffer: &PixelBuffer) {
        self.frames += 1;
        let (w, h) = self.viewport.fit(buffer);
        // fit_within never returns zero for a valid buffer and viewport
        self.last = buffer.resize(w, h).ok();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn render(&mut self, _: &PixelBuffer) {}
}

/// Lets callers keep ownership of a display and lend it to an editor.
impl<D: Display + ?Sized> Display for &mut D {
    fn render(&mut self, buffer: &PixelBuffer) {
        (**self).render(buffer)
    }
}
