//! Edit steps for headless sessions.
//!
//! Each `--step` argument of `retouch edit` parses into a [`Step`]:
//!
//! | Syntax | Effect |
//! |---|---|
//! | `<filter>[:<intensity>]` | commit a filter (or `reset`) |
//! | `preview:<filter>[:<intensity>]` | preview without committing |
//! | `discard` | drop the active preview |
//! | `crop:x,y,w,h` | crop the visible image |
//! | `resize:WxH` | resample to exactly W×H |
//! | `undo`, `redo` | move through history |
//!
//! Intensity defaults to 50 and is clamped to 0–100.

use crate::display::Display;
use crate::imaging::{Adjustment, CropRect, ImageBackend, Intensity, UnknownFilter};
use crate::session::{Editor, SessionError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StepParseError {
    #[error(transparent)]
    UnknownFilter(#[from] UnknownFilter),
    #[error("Invalid number {value:?} in step {step:?}")]
    InvalidNumber { step: String, value: String },
    #[error("Malformed step {0:?} (expected {1})")]
    Malformed(String, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Commit(Adjustment, Intensity),
    Preview(Adjustment, Intensity),
    Discard,
    Crop(CropRect),
    Resize(u32, u32),
    Undo,
    Redo,
}

impl Step {
    /// Run this step against `editor`.
    ///
    /// Previews go through the editor's worker pool and block until the
    /// result is on screen.
    pub fn apply<B: ImageBackend, D: Display>(
        &self,
        editor: &mut Editor<B, D>,
    ) -> Result<(), SessionError> {
        match *self {
            Step::Commit(adjustment, intensity) => editor.commit(adjustment, intensity),
            Step::Preview(adjustment, intensity) => {
                editor.request_preview(adjustment, intensity)?;
                editor.wait_previews();
                Ok(())
            }
            Step::Discard => editor.discard_preview(),
            Step::Crop(rect) => editor.crop(rect),
            Step::Resize(width, height) => editor.resize(width, height),
            Step::Undo => editor.undo(),
            Step::Redo => editor.redo(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Commit(adjustment, intensity) => write!(f, "{adjustment}:{intensity}"),
            Step::Preview(adjustment, intensity) => write!(f, "preview:{adjustment}:{intensity}"),
            Step::Discard => f.write_str("discard"),
            Step::Crop(r) => write!(f, "crop:{},{},{},{}", r.x, r.y, r.width, r.height),
            Step::Resize(w, h) => write!(f, "resize:{w}x{h}"),
            Step::Undo => f.write_str("undo"),
            Step::Redo => f.write_str("redo"),
        }
    }
}

impl FromStr for Step {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (head, rest) = match s.split_once(':') {
            Some((head, rest)) => (head, Some(rest)),
            None => (s, None),
        };

        match (head.to_ascii_lowercase().as_str(), rest) {
            ("undo", None) => Ok(Step::Undo),
            ("redo", None) => Ok(Step::Redo),
            ("discard", None) => Ok(Step::Discard),
            ("crop", Some(args)) => {
                let parts: Vec<&str> = args.split(',').collect();
                let [x, y, w, h] = parts.as_slice() else {
                    return Err(StepParseError::Malformed(s.to_string(), "crop:x,y,w,h"));
                };
                Ok(Step::Crop(CropRect::new(
                    number(s, x)?,
                    number(s, y)?,
                    number(s, w)?,
                    number(s, h)?,
                )))
            }
            ("resize", Some(args)) => {
                let (w, h) = args
                    .split_once(['x', 'X'])
                    .ok_or_else(|| StepParseError::Malformed(s.to_string(), "resize:WxH"))?;
                Ok(Step::Resize(number(s, w)?, number(s, h)?))
            }
            ("preview", Some(args)) => {
                let (adjustment, intensity) = adjustment(s, args)?;
                Ok(Step::Preview(adjustment, intensity))
            }
            ("crop", None) | ("resize", None) | ("preview", None) => Err(StepParseError::Malformed(
                s.to_string(),
                "arguments after ':'",
            )),
            _ => {
                let (adjustment, intensity) = adjustment(s, s)?;
                Ok(Step::Commit(adjustment, intensity))
            }
        }
    }
}

/// Parse `<filter>[:<intensity>]`.
fn adjustment(step: &str, spec: &str) -> Result<(Adjustment, Intensity), StepParseError> {
    match spec.rsplit_once(':') {
        Some((name, value)) => Ok((name.parse()?, Intensity::new(number(step, value)?))),
        None => Ok((spec.parse()?, Intensity::default())),
    }
}

fn number(step: &str, value: &str) -> Result<u32, StepParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| StepParseError::InvalidNumber {
            step: step.to_string(),
            value: value.to_string(),
        })
}
