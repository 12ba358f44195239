//! # Retouch
//!
//! Non-destructive photo editing sessions. An editor keeps the pristine
//! original, a linear history of committed states with undo/redo, and a
//! preview path that lets a slider show live results without touching history
//! or disk.
//!
//! # Architecture: Session Over Adapters
//!
//! ```text
//!            CLI / UI
//!               │  load / preview / commit / undo / redo / crop / resize / save_as
//!               ▼
//!        session::Editor ──────▶ preview::PreviewPipeline  (rayon workers)
//!          │          │
//!          ▼          ▼
//!   ImageBackend    Display          (persistence and screen seams)
//!          │
//!          ▼
//!   imaging::{PixelBuffer, Filter}   (pure pixel work)
//! ```
//!
//! The session owns all state transitions. Pixel work is pure and lives in
//! [`imaging`]; storage and presentation sit behind traits so the whole state
//! machine runs against a mock in tests.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | The `Editor` state machine: history, preview vs. commit, persistence of each commit |
//! | [`imaging`] | Pixel buffers, the filter library, crop/resize validation, the `ImageBackend` trait and its `image`-crate implementation |
//! | [`preview`] | Worker-pool preview rendering with stale-result suppression |
//! | [`display`] | The `Display` trait, viewport fitting, and headless displays |
//! | [`script`] | `--step` parsing for headless edit runs |
//! | [`config`] | `retouch.toml` loading, merging over stock defaults, and validation |
//! | [`output`] | CLI output formatting for listings, steps and summaries |
//!
//! # Design Decisions
//!
//! ## Value Semantics for Buffers
//!
//! Every transform returns a new [`imaging::PixelBuffer`]; nothing mutates a
//! buffer in place. History entries are shared through `Arc`, so undo and redo
//! never copy pixels and two entries can never alias.
//!
//! ## Filters Read the Baseline
//!
//! Previews and commits both apply their filter to the active history entry,
//! never to the previous preview. Dragging a slider from 20 to 80 shows
//! `filter(baseline, 80)`, not `filter(filter(baseline, 20), 80)`. The only
//! way back to the untouched original is an explicit reset, which is itself a
//! commit.
//!
//! ## Closed Filter Set
//!
//! [`imaging::Filter`] is an enum with a static lookup table of pure
//! transforms. Names from the command line parse through `FromStr`; anything
//! else is an `UnknownFilter` error rather than a silently ignored string.
//!
//! ## Config Is a Value
//!
//! The editor receives an [`config::EditorConfig`] at construction. Nothing
//! reads a working directory or UI state behind its back, which is what makes
//! the save-target rules testable.

pub mod config;
pub mod display;
pub mod imaging;
pub mod output;
pub mod preview;
pub mod script;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
