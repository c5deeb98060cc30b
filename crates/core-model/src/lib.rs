//! Screen-line records and the layout oracle seam.
//!
//! The rendering core never computes soft wrap or folds itself. It consumes
//! an ordered sequence of [`ScreenLine`]s from an external layout engine
//! through the [`LayoutOracle`] trait, and diffs against each line's stable
//! identity to decide whether a retained visual node can be reused.
//!
//! `fixture` provides a deterministic in-memory oracle used by tests across
//! the workspace (optionally soft-wrapped, identity derived from content).

pub mod fixture;
pub mod oracle;
pub mod screen_line;

pub use oracle::LayoutOracle;
pub use screen_line::{ScreenLine, ScreenLineId, TokenSpan};
