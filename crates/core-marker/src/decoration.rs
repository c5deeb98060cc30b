//! Decoration model: a closed variant set resolved by the compositor.
//!
//! Decorations are data only. Their visual effect is computed per flush from
//! current marker geometry/validity plus these properties; no variant holds
//! render state across flushes. Kind-specific options live on the variant,
//! shared styling (class, inline style) on `DecorationProps`.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use crate::marker::{LayerId, MarkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecorationId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPosition {
    /// Rendered immediately above the line for the anchor row.
    Before,
    /// Rendered immediately below the line for the anchor row.
    After,
}

/// Options shared by line, line-number, and custom gutter decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyleOptions {
    /// Style only the row containing the marker's head.
    pub only_head: bool,
    /// Style only when the marker range is empty.
    pub only_empty: bool,
    /// Style only when the marker range is non-empty.
    pub only_non_empty: bool,
    /// For a non-empty range ending at column 0, exclude that final row.
    pub omit_empty_last_row: bool,
}

impl Default for LineStyleOptions {
    fn default() -> Self {
        Self {
            only_head: false,
            only_empty: false,
            only_non_empty: false,
            omit_empty_last_row: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecorationKind {
    Line(LineStyleOptions),
    LineNumber(LineStyleOptions),
    /// Scoped to a named custom gutter.
    Gutter {
        gutter_name: String,
        options: LineStyleOptions,
    },
    Highlight,
    Overlay {
        /// When true (the default), the overlay is shifted/flipped to stay
        /// inside the viewport.
        avoid_overflow: bool,
    },
    Cursor,
    Text,
    Block {
        position: BlockPosition,
    },
}

/// Styling shared across kinds. `style` is an ordered inline-style map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecorationProps {
    pub class: Option<String>,
    pub style: BTreeMap<String, String>,
}

impl DecorationProps {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            class: Some(name.into()),
            style: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationTarget {
    Marker(MarkerId),
    /// Applies to every marker in the layer; per-marker overrides win.
    Layer(LayerId),
}

#[derive(Debug, Clone)]
pub struct Decoration {
    pub id: DecorationId,
    pub target: DecorationTarget,
    pub kind: DecorationKind,
    pub props: DecorationProps,
    /// Per-marker property overrides for layer decorations.
    pub overrides: HashMap<MarkerId, DecorationProps>,
    /// Set for flash highlights; the compositor drops expired decorations.
    pub expires_at: Option<Instant>,
}

impl Decoration {
    /// Effective properties for a given marker (override or shared).
    pub fn props_for(&self, marker: MarkerId) -> &DecorationProps {
        self.overrides.get(&marker).unwrap_or(&self.props)
    }
}

/// All decorations for one surface, with relational side indexes.
#[derive(Debug, Default)]
pub struct DecorationSet {
    decorations: BTreeMap<DecorationId, Decoration>,
    by_marker: HashMap<MarkerId, Vec<DecorationId>>,
    next_id: u64,
}

impl DecorationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decorate_marker(
        &mut self,
        marker: MarkerId,
        kind: DecorationKind,
        props: DecorationProps,
    ) -> DecorationId {
        let id = self.insert(DecorationTarget::Marker(marker), kind, props);
        self.by_marker.entry(marker).or_default().push(id);
        id
    }

    pub fn decorate_layer(
        &mut self,
        layer: LayerId,
        kind: DecorationKind,
        props: DecorationProps,
    ) -> DecorationId {
        self.insert(DecorationTarget::Layer(layer), kind, props)
    }

    fn insert(
        &mut self,
        target: DecorationTarget,
        kind: DecorationKind,
        props: DecorationProps,
    ) -> DecorationId {
        let id = DecorationId(self.next_id);
        self.next_id += 1;
        self.decorations.insert(
            id,
            Decoration {
                id,
                target,
                kind,
                props,
                overrides: HashMap::new(),
                expires_at: None,
            },
        );
        id
    }

    pub fn get(&self, id: DecorationId) -> Option<&Decoration> {
        self.decorations.get(&id)
    }

    /// Replace shared properties. No-op for stale ids.
    pub fn set_props(&mut self, id: DecorationId, props: DecorationProps) {
        if let Some(d) = self.decorations.get_mut(&id) {
            d.props = props;
        }
    }

    /// Set a per-marker override on a layer decoration. No-op for stale ids.
    pub fn set_override(&mut self, id: DecorationId, marker: MarkerId, props: DecorationProps) {
        if let Some(d) = self.decorations.get_mut(&id) {
            d.overrides.insert(marker, props);
        }
    }

    /// Mark a decoration as expiring (flash). No-op for stale ids.
    pub fn set_expiry(&mut self, id: DecorationId, expires_at: Instant) {
        if let Some(d) = self.decorations.get_mut(&id) {
            d.expires_at = Some(expires_at);
        }
    }

    /// Destroy a decoration. No-op for stale ids.
    pub fn destroy(&mut self, id: DecorationId) {
        if let Some(d) = self.decorations.remove(&id) {
            if let DecorationTarget::Marker(marker) = d.target {
                if let Some(ids) = self.by_marker.get_mut(&marker) {
                    ids.retain(|other| *other != id);
                }
            }
        }
    }

    /// Destroy everything attached to a destroyed marker.
    pub fn destroy_for_marker(&mut self, marker: MarkerId) {
        if let Some(ids) = self.by_marker.remove(&marker) {
            for id in ids {
                self.decorations.remove(&id);
            }
        }
    }

    /// Remove decorations whose expiry has passed. Returns how many were
    /// dropped so the caller can schedule a repaint.
    pub fn remove_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<DecorationId> = self
            .decorations
            .values()
            .filter(|d| d.expires_at.is_some_and(|at| at <= now))
            .map(|d| d.id)
            .collect();
        let count = expired.len();
        for id in expired {
            self.destroy(id);
        }
        count
    }

    pub fn decorations_for_marker(&self, marker: MarkerId) -> impl Iterator<Item = &Decoration> {
        self.by_marker
            .get(&marker)
            .into_iter()
            .flatten()
            .filter_map(|id| self.decorations.get(id))
    }

    /// Deterministic (creation-ordered) iteration over all decorations.
    pub fn iter(&self) -> impl Iterator<Item = &Decoration> {
        self.decorations.values()
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }
}
