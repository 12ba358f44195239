//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every line leads with what happened to the image (the step, its position in
//! the run, where history now stands) and shows filesystem paths as indented
//! context. The output reads as an edit log while still pointing at the files
//! it touched.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! Images in photos/
//! 001 cat.png
//! 002 dog.jpg
//! 2 images
//! ```
//!
//! ## Edit
//!
//! ```text
//! Loaded cat.png (640x480 rgba)
//!     Source: photos/cat.png
//!     Save target: photos/edits/cat.png
//! 001 grayscale:50 → history 2/2
//! 002 preview:blur:30 → previewing on 2/2
//! 003 redo → failed: Nothing to redo
//! Saved as out.png
//! ```
//!
//! ## Summary
//!
//! ```text
//! Session
//!     State: committed
//!     Image: 640x480 rgba
//!     History: 2/2 (undo: yes, redo: no)
//!     Source: photos/cat.png
//!     Save target: photos/edits/cat.png
//! ```
//!
//! # Architecture
//!
//! Each event has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::script::Step;
use crate::session::{HistoryPosition, SessionError, SessionState, SessionSummary};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// 1-based history position, as the user counts entries.
fn history_label(position: &HistoryPosition) -> String {
    format!("{}/{}", position.index + 1, position.len)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn image_size(summary: &SessionSummary) -> Option<String> {
    match (summary.width, summary.height, summary.mode) {
        (Some(w), Some(h), Some(mode)) => Some(format!("{w}x{h} {mode}")),
        _ => None,
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// List
// ============================================================================

/// Format a directory listing: one indexed line per image plus a count.
pub fn format_listing(dir: &Path, names: &[String]) -> Vec<String> {
    let mut lines = vec![format!("Images in {}/", dir.display())];
    for (i, name) in names.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), name));
    }
    lines.push(plural(names.len(), "image"));
    lines
}

/// Print a directory listing to stdout.
pub fn print_listing(dir: &Path, names: &[String]) {
    for line in format_listing(dir, names) {
        println!("{}", line);
    }
}

// ============================================================================
// Edit
// ============================================================================

/// Format the header printed right after a successful load.
pub fn format_loaded(summary: &SessionSummary) -> Vec<String> {
    let mut lines = Vec::new();
    let name = summary
        .source
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match image_size(summary) {
        Some(size) => lines.push(format!("Loaded {name} ({size})")),
        None => lines.push(format!("Loaded {name}")),
    }
    if let Some(source) = &summary.source {
        lines.push(format!("{}Source: {}", indent(1), source.display()));
    }
    if let Some(target) = &summary.save_path {
        lines.push(format!("{}Save target: {}", indent(1), target.display()));
    }
    lines
}

/// Print the load header to stdout.
pub fn print_loaded(summary: &SessionSummary) {
    for line in format_loaded(summary) {
        println!("{}", line);
    }
}

/// Format the result of one edit step.
///
/// `index` is the 1-based position of the step in the run; `summary` is the
/// editor state after the step ran.
pub fn format_step(
    index: usize,
    step: &Step,
    result: &Result<(), SessionError>,
    summary: &SessionSummary,
) -> Vec<String> {
    let head = format!("{} {}", format_index(index), step);
    let outcome = match (result, &summary.history) {
        (Err(err), _) => format!("failed: {err}"),
        (Ok(()), Some(position)) if summary.state == SessionState::Previewing => {
            format!("previewing on {}", history_label(position))
        }
        (Ok(()), Some(position)) => format!("history {}", history_label(position)),
        (Ok(()), None) => summary.state.to_string(),
    };
    let mut lines = vec![format!("{head} \u{2192} {outcome}")];

    // A commit that could not be written still moved history; say so
    if let (Err(SessionError::Io { path, .. }), Some(position)) = (result, &summary.history) {
        lines.push(format!(
            "{}Kept in history at {}, not written to {}",
            indent(1),
            history_label(position),
            path.display()
        ));
    }
    lines
}

/// Print the result of one edit step to stdout.
pub fn print_step(
    index: usize,
    step: &Step,
    result: &Result<(), SessionError>,
    summary: &SessionSummary,
) {
    for line in format_step(index, step, result, summary) {
        println!("{}", line);
    }
}

/// Format the confirmation for an explicit Save As.
pub fn format_saved(path: &Path) -> Vec<String> {
    vec![format!("Saved as {}", path.display())]
}

pub fn print_saved(path: &Path) {
    for line in format_saved(path) {
        println!("{}", line);
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Format a session summary block.
pub fn format_summary(summary: &SessionSummary) -> Vec<String> {
    let mut lines = vec!["Session".to_string()];
    lines.push(format!("{}State: {}", indent(1), summary.state));
    if let Some(size) = image_size(summary) {
        lines.push(format!("{}Image: {}", indent(1), size));
    }
    if let Some(position) = &summary.history {
        lines.push(format!(
            "{}History: {} (undo: {}, redo: {})",
            indent(1),
            history_label(position),
            yes_no(position.can_undo()),
            yes_no(position.can_redo())
        ));
    }
    if let Some(source) = &summary.source {
        lines.push(format!("{}Source: {}", indent(1), source.display()));
    }
    if let Some(target) = &summary.save_path {
        lines.push(format!("{}Save target: {}", indent(1), target.display()));
    }
    lines
}

/// Print a session summary block to stdout.
pub fn print_summary(summary: &SessionSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{BackendError, ColorMode, Filter, Intensity};
    use std::path::PathBuf;

    fn committed(index: usize, len: usize) -> SessionSummary {
        SessionSummary {
            state: SessionState::Committed,
            source: Some(PathBuf::from("photos/cat.png")),
            width: Some(640),
            height: Some(480),
            mode: Some(ColorMode::Rgba),
            history: Some(HistoryPosition { index, len }),
            save_path: Some(PathBuf::from("photos/edits/cat.png")),
        }
    }

    fn empty() -> SessionSummary {
        SessionSummary {
            state: SessionState::Empty,
            source: None,
            width: None,
            height: None,
            mode: None,
            history: None,
            save_path: None,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn history_label_is_one_based() {
        assert_eq!(history_label(&HistoryPosition { index: 0, len: 1 }), "1/1");
        assert_eq!(history_label(&HistoryPosition { index: 2, len: 5 }), "3/5");
    }

    // =========================================================================
    // List tests
    // =========================================================================

    #[test]
    fn listing_indexes_and_counts() {
        let names = vec!["cat.png".to_string(), "dog.jpg".to_string()];
        let lines = format_listing(Path::new("photos"), &names);
        assert_eq!(
            lines,
            vec!["Images in photos/", "001 cat.png", "002 dog.jpg", "2 images"]
        );
    }

    #[test]
    fn listing_singular_and_empty() {
        let one = format_listing(Path::new("d"), &["a.png".to_string()]);
        assert_eq!(one.last().unwrap(), "1 image");
        let none = format_listing(Path::new("d"), &[]);
        assert_eq!(none, vec!["Images in d/", "0 images"]);
    }

    // =========================================================================
    // Edit tests
    // =========================================================================

    #[test]
    fn loaded_header_shows_size_and_paths() {
        let lines = format_loaded(&committed(0, 1));
        assert_eq!(lines[0], "Loaded cat.png (640x480 rgba)");
        assert_eq!(lines[1], "    Source: photos/cat.png");
        assert_eq!(lines[2], "    Save target: photos/edits/cat.png");
    }

    #[test]
    fn step_commit_shows_history() {
        let step = Step::Commit(Filter::Grayscale.into(), Intensity::default());
        let lines = format_step(1, &step, &Ok(()), &committed(1, 2));
        assert_eq!(lines, vec!["001 grayscale:50 \u{2192} history 2/2"]);
    }

    #[test]
    fn step_preview_says_previewing() {
        let step = Step::Preview(Filter::Blur.into(), Intensity::new(30));
        let mut summary = committed(0, 1);
        summary.state = SessionState::Previewing;
        let lines = format_step(2, &step, &Ok(()), &summary);
        assert_eq!(lines, vec!["002 preview:blur:30 \u{2192} previewing on 1/1"]);
    }

    #[test]
    fn step_failure_shows_error() {
        let lines = format_step(3, &Step::Redo, &Err(SessionError::RedoUnavailable), &committed(1, 2));
        assert_eq!(lines, vec!["003 redo \u{2192} failed: Nothing to redo"]);
    }

    #[test]
    fn step_write_failure_notes_kept_history() {
        let err = SessionError::Io {
            path: PathBuf::from("photos/edits/cat.png"),
            source: BackendError::Io(std::io::Error::other("disk full")),
        };
        let step = Step::Commit(Filter::Mirror.into(), Intensity::default());
        let lines = format_step(1, &step, &Err(err), &committed(1, 2));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("failed: Failed to write photos/edits/cat.png"));
        assert_eq!(
            lines[1],
            "    Kept in history at 2/2, not written to photos/edits/cat.png"
        );
    }

    #[test]
    fn saved_line() {
        assert_eq!(format_saved(Path::new("out.png")), vec!["Saved as out.png"]);
    }

    // =========================================================================
    // Summary tests
    // =========================================================================

    #[test]
    fn summary_block_for_loaded_session() {
        let lines = format_summary(&committed(1, 3));
        assert_eq!(
            lines,
            vec![
                "Session",
                "    State: committed",
                "    Image: 640x480 rgba",
                "    History: 2/3 (undo: yes, redo: yes)",
                "    Source: photos/cat.png",
                "    Save target: photos/edits/cat.png",
            ]
        );
    }

    #[test]
    fn summary_block_for_empty_editor() {
        assert_eq!(format_summary(&empty()), vec!["Session", "    State: empty"]);
    }
}
