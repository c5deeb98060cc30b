//! Markers and decorations.
//!
//! Markers are buffer-coordinate points/ranges owned by the editing session;
//! the rendering core reads their geometry and validity. Decorations attach
//! style or content to a marker (or to every marker in a layer) and are
//! resolved against the visible row range by the compositor in `core-render`.
//!
//! Relationships are relational, not owning: a decoration stores a marker or
//! layer id, and `DecorationSet` maintains the side indexes needed to find
//! decorations from a marker. Destroying a marker cascades to its
//! decorations; operations against stale ids are no-ops.

pub mod decoration;
pub mod marker;

pub use decoration::{
    BlockPosition, Decoration, DecorationId, DecorationKind, DecorationProps, DecorationSet,
    DecorationTarget, LineStyleOptions,
};
pub use marker::{InvalidationPolicy, LayerId, Marker, MarkerId, MarkerSet};
