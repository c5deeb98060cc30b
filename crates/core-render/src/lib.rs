//! Viewport virtualization, decoration compositing, and frame assembly.
//!
//! This crate is the heart of the rendering core. It holds no text and
//! performs no wrapping; it turns the output of an external layout oracle
//! plus marker/decoration state into a bounded retained visual tree, and
//! keeps that tree synchronized with scrolling, edits, and style changes.
//!
//! Exposed components:
//! * `tiles`: partitions the rendered row range into recyclable fixed-size
//!   tiles whose containers are relabeled rather than destroyed as the
//!   window shifts.
//! * `blocks`: height bookkeeping for block decorations interleaved with
//!   rows; the only source of non-uniform vertical geometry.
//! * `composite`: resolves every decoration variant against the rendered
//!   row range as a pure function of marker/decoration state.
//! * `scroll`: scroll position in pixel and logical forms, autoscroll, and
//!   wheel translation; works detached from metrics.
//! * `scheduler`: coalesces mutations into one flush per driver tick (or
//!   inline in synchronous mode) with a single bounded correction pass.
//! * `visual`: the retained tree, written exactly once per flush.
//! * `surface`: the `RenderSurface` orchestrator tying the above together
//!   and exposing the host-facing query/command API.
//!
//! Invariants:
//! * Every rendered row has exactly one line node and (when the gutter is
//!   enabled) one line-number node at the same top offset.
//! * The retained tile count is bounded by `ceil(viewport_rows /
//!   rows_per_tile) + 1` and changes only when the window crosses a tile
//!   boundary.
//! * Scroll positions stay inside `[0, max]`; corrections never propose
//!   values outside that range.
//! * Only the flush routine writes the visual tree; everything else reads.

pub mod blocks;
pub mod composite;
pub mod scheduler;
pub mod scroll;
pub mod surface;
pub mod tiles;
pub mod visual;

pub use scheduler::{DirtyFlags, UpdateMode, UpdateScheduler};
pub use surface::{
    AutoscrollOptions, FrameContext, MapMeasurer, NodeMeasurer, PixelPosition, RenderSurface,
};
