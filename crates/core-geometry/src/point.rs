//! Row/column coordinates and ranges.
//!
//! `Point` orders row-major (row first, then column) so range normalization
//! and containment checks fall out of derived `Ord`. A `Range` is always
//! stored normalized; selection/marker orientation ("reversed") is a flag on
//! the owning structure, not an unordered pair here.

/// A row/column coordinate. Rows and columns are zero-based; columns count
/// characters (not bytes, not pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    pub const fn zero() -> Self {
        Self { row: 0, column: 0 }
    }

    /// Component-wise translation used by marker splice arithmetic: offsets
    /// `self` (expressed relative to `base`) to be relative to origin.
    pub fn traverse(base: Point, extent: Point) -> Point {
        if extent.row == 0 {
            Point::new(base.row, base.column + extent.column)
        } else {
            Point::new(base.row + extent.row, extent.column)
        }
    }

    /// Inverse of `traverse`: the extent from `base` to `self`. Requires
    /// `base <= self`.
    pub fn traversal_from(self, base: Point) -> Point {
        debug_assert!(base <= self, "traversal_from requires base <= self");
        if self.row == base.row {
            Point::new(0, self.column - base.column)
        } else {
            Point::new(self.row - base.row, self.column)
        }
    }
}

/// A normalized (start <= end) range of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Point,
    pub end: Point,
}

impl Range {
    /// Build a normalized range from two endpoints in either order.
    pub fn new(a: Point, b: Point) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn point(p: Point) -> Self {
        Self { start: p, end: p }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, p: Point) -> bool {
        self.start <= p && p < self.end
    }

    /// Inclusive containment, used by "click inside an existing selection"
    /// checks where the end boundary counts.
    pub fn contains_inclusive(&self, p: Point) -> bool {
        self.start <= p && p <= self.end
    }

    /// Whether this range touches any row in `[first, last]` (inclusive).
    pub fn intersects_row_range(&self, first: usize, last: usize) -> bool {
        self.start.row <= last && self.end.row >= first
    }

    pub fn intersects(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Smallest range covering both inputs.
    pub fn union(&self, other: &Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
