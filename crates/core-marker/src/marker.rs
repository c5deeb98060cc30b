//! Buffer-coordinate markers with invalidation policies.
//!
//! A marker tracks a point or range through edits. The rendering core never
//! edits text itself; the buffer owner notifies the marker set of each edit
//! through `splice`, which shifts marker endpoints and applies the marker's
//! invalidation policy. Invalid markers are retained (their owner may
//! revalidate or destroy them) but are excluded from decoration resolution.
//!
//! Policy semantics, from weakest to strongest, for an edit replacing
//! `[start, old_end)`:
//! * `Never`: geometry updates, validity untouched.
//! * `Surround`: invalid when the edit strictly contains the whole marker.
//! * `Overlap`: invalid when a non-empty edit shares positions with the
//!   marker's interior.
//! * `Inside`: additionally invalid for insertions strictly inside the
//!   marker.
//! * `Touch`: invalid for any edit touching the marker, endpoints included.

use std::collections::BTreeMap;
use std::collections::HashMap;

use core_geometry::{Point, Range};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidationPolicy {
    Never,
    #[default]
    Surround,
    Overlap,
    Inside,
    Touch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub id: MarkerId,
    pub layer: LayerId,
    pub range: Range,
    /// Head at `range.start` when reversed, at `range.end` otherwise.
    pub reversed: bool,
    pub valid: bool,
    pub policy: InvalidationPolicy,
}

impl Marker {
    pub fn head(&self) -> Point {
        if self.reversed {
            self.range.start
        } else {
            self.range.end
        }
    }

    pub fn tail(&self) -> Point {
        if self.reversed {
            self.range.end
        } else {
            self.range.start
        }
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// All marker layers for one buffer. Marker ids are unique across layers.
#[derive(Debug, Default)]
pub struct MarkerSet {
    layers: BTreeMap<LayerId, BTreeMap<MarkerId, Marker>>,
    layer_of: HashMap<MarkerId, LayerId>,
    next_layer: u32,
    next_marker: u64,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self) -> LayerId {
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        self.layers.insert(id, BTreeMap::new());
        id
    }

    pub fn create_marker(
        &mut self,
        layer: LayerId,
        range: Range,
        reversed: bool,
        policy: InvalidationPolicy,
    ) -> MarkerId {
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        let marker = Marker {
            id,
            layer,
            range,
            reversed,
            valid: true,
            policy,
        };
        self.layers.entry(layer).or_default().insert(id, marker);
        self.layer_of.insert(id, layer);
        id
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        let layer = self.layer_of.get(&id)?;
        self.layers.get(layer)?.get(&id)
    }

    /// Move a marker. No-op for stale ids. Revalidates the marker (matching
    /// the convention that explicit repositioning asserts fresh intent).
    pub fn set_marker_range(&mut self, id: MarkerId, range: Range, reversed: bool) {
        if let Some(marker) = self.marker_mut(id) {
            marker.range = range;
            marker.reversed = reversed;
            marker.valid = true;
        }
    }

    /// Destroy a marker. No-op for stale ids.
    pub fn destroy_marker(&mut self, id: MarkerId) {
        if let Some(layer) = self.layer_of.remove(&id) {
            if let Some(markers) = self.layers.get_mut(&layer) {
                markers.remove(&id);
            }
        }
    }

    pub fn markers_in_layer(&self, layer: LayerId) -> impl Iterator<Item = &Marker> {
        self.layers.get(&layer).into_iter().flat_map(|m| m.values())
    }

    pub fn marker_count(&self) -> usize {
        self.layer_of.len()
    }

    /// Apply an external edit replacing `[start, start + old_extent)` with
    /// text of extent `new_extent`. Shifts endpoints and applies each
    /// marker's invalidation policy.
    pub fn splice(&mut self, start: Point, old_extent: Point, new_extent: Point) {
        let old_end = Point::traverse(start, old_extent);
        let new_end = Point::traverse(start, new_extent);
        let mut invalidated = 0usize;
        for markers in self.layers.values_mut() {
            for marker in markers.values_mut() {
                if invalidates(marker, start, old_end) && marker.valid {
                    marker.valid = false;
                    invalidated += 1;
                }
                let new_start = splice_point(marker.range.start, start, old_end, new_end);
                let new_range_end = splice_point(marker.range.end, start, old_end, new_end);
                marker.range = Range::new(new_start, new_range_end);
            }
        }
        if invalidated > 0 {
            trace!(invalidated, "splice invalidated markers");
        }
    }

    fn marker_mut(&mut self, id: MarkerId) -> Option<&mut Marker> {
        let layer = self.layer_of.get(&id)?;
        self.layers.get_mut(layer)?.get_mut(&id)
    }
}

/// Translate a single endpoint across an edit.
fn splice_point(p: Point, start: Point, old_end: Point, new_end: Point) -> Point {
    if p <= start {
        p
    } else if p < old_end {
        // Interior of the replaced region collapses to the end of the
        // inserted text.
        new_end
    } else {
        Point::traverse(new_end, p.traversal_from(old_end))
    }
}

fn invalidates(marker: &Marker, start: Point, old_end: Point) -> bool {
    let m = marker.range;
    let non_empty_edit = start < old_end;
    match marker.policy {
        InvalidationPolicy::Never => false,
        InvalidationPolicy::Surround => non_empty_edit && start <= m.start && old_end >= m.end,
        InvalidationPolicy::Overlap => non_empty_edit && start < m.end && old_end > m.start,
        InvalidationPolicy::Inside => start < m.end && old_end > m.start,
        InvalidationPolicy::Touch => start <= m.end && old_end >= m.start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(sr: usize, sc: usize, er: usize, ec: usize) -> Range {
        Range::new(Point::new(sr, sc), Point::new(er, ec))
    }

    fn set_with_marker(policy: InvalidationPolicy) -> (MarkerSet, MarkerId) {
        let mut set = MarkerSet::new();
        let layer = set.add_layer();
        let id = set.create_marker(layer, range(2, 4, 2, 10), false, policy);
        (set, id)
    }

    #[test]
    fn edit_before_marker_shifts_range() {
        let (mut set, id) = set_with_marker(InvalidationPolicy::Touch);
        // Insert one row at the top of the buffer.
        set.splice(Point::zero(), Point::zero(), Point::new(1, 0));
        let m = set.marker(id).unwrap();
        assert_eq!(m.range, range(3, 4, 3, 10));
        assert!(m.valid);
    }

    #[test]
    fn edit_on_same_row_before_marker_shifts_columns() {
        let (mut set, id) = set_with_marker(InvalidationPolicy::Touch);
        set.splice(Point::new(2, 0), Point::new(0, 2), Point::new(0, 5));
        let m = set.marker(id).unwrap();
        assert_eq!(m.range, range(2, 7, 2, 13));
    }

    #[test]
    fn touch_invalidates_on_endpoint_contact() {
        let (mut set, id) = set_with_marker(InvalidationPolicy::Touch);
        set.splice(Point::new(2, 10), Point::new(0, 2), Point::new(0, 0));
        assert!(!set.marker(id).unwrap().valid);
    }

    #[test]
    fn overlap_ignores_endpoint_contact() {
        let (mut set, id) = set_with_marker(InvalidationPolicy::Overlap);
        set.splice(Point::new(2, 10), Point::new(0, 2), Point::new(0, 0));
        assert!(set.marker(id).unwrap().valid);
        set.splice(Point::new(2, 8), Point::new(0, 3), Point::new(0, 0));
        assert!(!set.marker(id).unwrap().valid);
    }

    #[test]
    fn inside_invalidates_on_interior_insertion() {
        let (mut set, id) = set_with_marker(InvalidationPolicy::Inside);
        set.splice(Point::new(2, 6), Point::zero(), Point::new(0, 3));
        assert!(!set.marker(id).unwrap().valid);

        let (mut set, id) = set_with_marker(InvalidationPolicy::Overlap);
        set.splice(Point::new(2, 6), Point::zero(), Point::new(0, 3));
        assert!(set.marker(id).unwrap().valid, "empty edit never overlaps");
    }

    #[test]
    fn surround_requires_full_containment() {
        let (mut set, id) = set_with_marker(InvalidationPolicy::Surround);
        set.splice(Point::new(2, 5), Point::new(0, 2), Point::new(0, 2));
        assert!(set.marker(id).unwrap().valid);
        set.splice(Point::new(2, 0), Point::new(0, 20), Point::new(0, 1));
        assert!(!set.marker(id).unwrap().valid);
    }

    #[test]
    fn interior_endpoints_collapse_to_edit_end() {
        let (mut set, id) = set_with_marker(InvalidationPolicy::Never);
        set.splice(Point::new(2, 0), Point::new(0, 6), Point::new(0, 1));
        let m = set.marker(id).unwrap();
        // Start column 4 was interior; end column 10 shifts by the delta.
        assert_eq!(m.range, range(2, 1, 2, 5));
        assert!(m.valid);
    }

    #[test]
    fn stale_ids_are_noops() {
        let (mut set, id) = set_with_marker(InvalidationPolicy::Never);
        set.destroy_marker(id);
        assert!(set.marker(id).is_none());
        set.set_marker_range(id, range(0, 0, 0, 1), false);
        set.destroy_marker(id);
        assert_eq!(set.marker_count(), 0);
    }
}
