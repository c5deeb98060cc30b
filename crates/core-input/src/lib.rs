//! Pointer input mapping and selection gestures.
//!
//! This crate turns viewport-space pointer events into screen positions and
//! selection updates. It owns no render state: events resolve through a
//! [`core_render::RenderSurface`]'s pixel conversion (midpoint rule, block
//! geometry, scroll offsets all included), and the gesture handler tracks
//! selections in screen coordinates while driving drag autoscroll through
//! the surface's request API.
//!
//! Editing semantics (what a selection does to text) live with the host;
//! only the geometry of pointing and selecting lives here.

pub mod gesture;
pub mod pointer;

pub use gesture::{line_range_at, word_range_at, GestureHandler, Selection, SelectionMode};
pub use pointer::{screen_position_for_event, Modifiers, PointerEvent};
