//! End-to-end edit sessions against the real `image`-crate backend.
//!
//! Every test works in its own temp directory: it writes a source image,
//! drives an `Editor`, and checks both the in-memory state and what landed
//! on disk.

use retouch::config::EditorConfig;
use retouch::display::{FrameDisplay, Viewport};
use retouch::imaging::{
    ColorMode, CropRect, Filter, ImageBackend, Intensity, PixelBuffer, RustBackend,
};
use retouch::script::Step;
use retouch::session::{Editor, SessionError, SessionState};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

type RealEditor = Editor<RustBackend, FrameDisplay>;

fn checker(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, ColorMode::Rgb, |x, y| {
        if (x / 10 + y / 10) % 2 == 0 {
            [220, 40, 40, 255]
        } else {
            [30, 90, 200, 255]
        }
    })
    .unwrap()
}

fn write_source(dir: &Path, name: &str, buffer: &PixelBuffer) -> PathBuf {
    let path = dir.join(name);
    RustBackend::new().encode(buffer, &path).unwrap();
    path
}

fn editor() -> RealEditor {
    let mut config = EditorConfig::default();
    config.processing.max_processes = Some(2);
    Editor::new(
        RustBackend::new(),
        FrameDisplay::new(Viewport::from(&config.display)),
        config,
    )
    .unwrap()
}

fn decode(path: &Path) -> PixelBuffer {
    RustBackend::new().decode(path).unwrap()
}

#[test]
fn grayscale_undo_blur_then_redo_fails() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "square.png", &checker(100, 100));
    let mut editor = editor();
    editor.load(&source).unwrap();

    editor.commit(Filter::Grayscale, Intensity::default()).unwrap();
    editor.undo().unwrap();
    editor.commit(Filter::Blur, Intensity::new(30)).unwrap();

    let position = editor.position().unwrap();
    assert_eq!((position.index, position.len), (1, 2));
    let blurred = Filter::Blur.apply(editor.original().unwrap(), Intensity::new(30));
    assert_eq!(editor.history_entry(1), Some(&blurred));
    assert!(matches!(editor.redo(), Err(SessionError::RedoUnavailable)));

    // The last commit is what sits in the edits directory
    let saved = decode(&tmp.path().join("edits/square.png"));
    assert_eq!(&saved, editor.current().unwrap());
}

#[test]
fn edits_directory_is_created_on_first_commit() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "cat.png", &checker(40, 20));
    let mut editor = editor();
    editor.load(&source).unwrap();

    let edits = tmp.path().join("edits");
    assert!(!edits.exists(), "load must not create the edits directory");
    editor.preview(Filter::Mirror, Intensity::default()).unwrap();
    assert!(!edits.exists(), "preview must not write");

    editor.commit(Filter::Mirror, Intensity::default()).unwrap();
    assert!(edits.join("cat.png").is_file());
    assert_eq!(editor.default_save_path(), Some(edits.join("cat.png")));
}

#[test]
fn source_file_is_never_modified() {
    let tmp = TempDir::new().unwrap();
    let original = checker(30, 30);
    let source = write_source(tmp.path(), "keep.png", &original);
    let before = std::fs::read(&source).unwrap();

    let mut editor = editor();
    editor.load(&source).unwrap();
    editor.commit(Filter::Contrast, Intensity::new(90)).unwrap();
    editor.crop(CropRect::new(5, 5, 10, 10)).unwrap();
    editor.resize(60, 60).unwrap();

    assert_eq!(std::fs::read(&source).unwrap(), before);
}

#[test]
fn resize_to_zero_is_rejected_without_side_effects() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "img.png", &checker(20, 20));
    let mut editor = editor();
    editor.load(&source).unwrap();

    let err = editor.resize(0, 50).unwrap_err();
    assert!(matches!(err, SessionError::InvalidDimension { width: 0, height: 50 }));
    assert_eq!(editor.position().unwrap().len, 1);
    assert!(!tmp.path().join("edits").exists());
}

#[test]
fn save_as_into_missing_directory_is_io_and_state_unchanged() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "img.png", &checker(20, 20));
    let mut editor = editor();
    editor.load(&source).unwrap();
    editor.commit(Filter::Grayscale, Intensity::default()).unwrap();
    let before = editor.current().unwrap().clone();

    let target = tmp.path().join("readonly/out.png");
    let err = editor.save_as(&target).unwrap_err();
    assert!(matches!(err, SessionError::Io { .. }));
    assert!(!target.exists());
    assert_eq!(editor.current(), Some(&before));
    assert_eq!(editor.position().unwrap().len, 2);
}

#[test]
fn save_as_exports_preview_in_requested_format() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "img.png", &checker(32, 16));
    let mut editor = editor();
    editor.load(&source).unwrap();
    editor.preview(Filter::RotateRight, Intensity::default()).unwrap();

    let target = tmp.path().join("rotated.jpg");
    editor.save_as(&target).unwrap();

    let exported = decode(&target);
    assert_eq!(exported.dimensions(), (16, 32));
    assert_eq!(exported.mode(), ColorMode::Rgb);
    assert_eq!(editor.state(), SessionState::Previewing);
    assert_eq!(editor.position().unwrap().len, 1);
}

#[test]
fn commit_keeps_source_extension_and_codec() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "photo.jpg", &checker(24, 24));
    let mut editor = editor();
    editor.load(&source).unwrap();
    editor.commit(Filter::Color, Intensity::new(0)).unwrap();

    let saved = tmp.path().join("edits/photo.jpg");
    let bytes = std::fs::read(&saved).unwrap();
    // JPEG SOI marker
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn loading_a_non_image_leaves_editor_empty() {
    let tmp = TempDir::new().unwrap();
    let good = write_source(tmp.path(), "good.png", &checker(10, 10));
    let bad = tmp.path().join("bad.png");
    std::fs::write(&bad, b"not an image").unwrap();

    let mut editor = editor();
    editor.load(&good).unwrap();
    let err = editor.load(&bad).unwrap_err();
    assert!(err.is_decode());
    assert_eq!(editor.state(), SessionState::Empty);

    let err = editor.load(tmp.path().join("missing.png")).unwrap_err();
    assert!(matches!(err, SessionError::Load { .. }));
    assert!(!err.is_decode());
}

#[test]
fn listing_returns_sorted_images_only() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "b.png", &checker(4, 4));
    write_source(tmp.path(), "a.jpg", &checker(4, 4));
    std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();

    let names = editor().list_images(tmp.path()).unwrap();
    assert_eq!(names, vec!["a.jpg", "b.png"]);
}

#[test]
fn scripted_steps_run_in_order() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "run.png", &checker(50, 40));
    let mut editor = editor();
    editor.load(&source).unwrap();

    let steps: Vec<Step> = ["sharpen:80", "crop:10,10,20,10", "preview:blur:40", "resize:40x20", "undo"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    for step in &steps {
        step.apply(&mut editor).unwrap();
    }

    let position = editor.position().unwrap();
    assert_eq!((position.index, position.len), (2, 4));
    assert_eq!(editor.current().unwrap().dimensions(), (20, 10));
    assert!(position.can_redo());
    assert_eq!(editor.display().frames(), 1 + steps.len());
}

#[test]
fn async_preview_superseded_by_commit() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "async.png", &checker(64, 64));
    let mut editor = editor();
    editor.load(&source).unwrap();

    for value in [10, 40, 70] {
        editor.request_preview(Filter::Blur, Intensity::new(value)).unwrap();
    }
    editor.commit(Filter::Mirror, Intensity::default()).unwrap();

    assert!(!editor.wait_previews());
    assert_eq!(editor.state(), SessionState::Committed);
    assert_eq!(
        editor.current().unwrap(),
        &editor.original().unwrap().flip_horizontal()
    );
}

#[test]
fn suggested_save_as_creates_edits_dir_before_any_commit() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "dog.png", &checker(12, 30));
    let mut editor = editor();
    editor.load(&source).unwrap();
    Step::Preview(Filter::RotateLeft.into(), Intensity::default())
        .apply(&mut editor)
        .unwrap();

    let path = editor.save_as_suggested().unwrap();
    assert_eq!(path, tmp.path().join("edits/edited_dog.png"));
    assert_eq!(decode(&path).dimensions(), (30, 12));
    assert!(!tmp.path().join("edits/dog.png").exists());
}
