//! Geometry primitives shared across the rendering core.
//!
//! Three concerns live here:
//! * `point`: row/column coordinates and normalized ranges. The same types
//!   serve buffer space and screen space; which space a value inhabits is a
//!   property of the API that produced it, never of the type.
//! * `width`: grapheme-cluster pixel measurement. All column↔x decisions
//!   flow through this module so the midpoint tie-break rule is applied
//!   uniformly by hit testing, cursor placement, and highlight geometry.
//! * `metrics`: the measurement store caching font metrics and client
//!   dimensions, invalidated wholesale on style change and refreshed lazily.
//!
//! Invariants:
//! * `Range::start <= Range::end` always (orientation is tracked by callers).
//! * No caller measures text outside `width::x_for_column` /
//!   `width::column_for_x` / `width::line_width_px`.
//! * A detached `MeasurementStore` answers `metrics() == None` rather than
//!   guessing; pixel-dependent operations defer until attachment.

pub mod metrics;
pub mod point;
pub mod width;

pub use metrics::{FontMetrics, MeasurementStore, MetricsSource};
pub use point::{Point, Range};
pub use width::{cluster_class, column_for_x, line_width_px, x_for_column, CharClass};
