//! Block-decoration height bookkeeping.
//!
//! Block decorations occupy vertical space between lines and are the only
//! reason row→pixel mapping is not uniform. The index holds the blocks
//! anchored inside the current retained tile window (blocks outside the
//! window are excluded from all height calculations until they scroll back
//! in), with heights taken from the surface's measured-height cache.
//!
//! Attribution rules:
//! * a `Before` block at row r sits above line r: it counts toward the tile
//!   containing r and toward the top offset of line r itself;
//! * an `After` block at row r sits below line r: it counts toward the tile
//!   containing r but only offsets lines strictly below r.

use std::ops::Range as RowRange;

use core_marker::{BlockPosition, DecorationId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockEntry {
    pub decoration: DecorationId,
    pub row: usize,
    pub position: BlockPosition,
    pub height_px: f64,
}

/// Blocks currently inside the retained window, ordered by row.
#[derive(Debug, Clone, Default)]
pub struct BlockHeightIndex {
    entries: Vec<BlockEntry>,
}

impl BlockHeightIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index contents. Entries may arrive in any order; heights
    /// must be non-negative (a negative height indicates a reconciliation
    /// bug upstream and is fatal).
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = BlockEntry>) {
        self.entries.clear();
        self.entries.extend(entries);
        for entry in &self.entries {
            assert!(
                entry.height_px >= 0.0,
                "negative block height for {:?}",
                entry.decoration
            );
        }
        self.entries.sort_by_key(|e| e.row);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    pub fn entries_at_row(&self, row: usize) -> impl Iterator<Item = &BlockEntry> {
        self.entries.iter().filter(move |e| e.row == row)
    }

    /// Total block height attributed to rows in `rows` (both positions
    /// attribute to their anchor row's tile).
    pub fn height_in_rows(&self, rows: RowRange<usize>) -> f64 {
        self.entries
            .iter()
            .filter(|e| rows.contains(&e.row))
            .map(|e| e.height_px)
            .sum()
    }

    /// Block height stacked above the top edge of line `row`: every block
    /// anchored at earlier rows plus `Before` blocks at `row` itself.
    pub fn height_above_row(&self, row: usize) -> f64 {
        self.entries
            .iter()
            .filter(|e| {
                e.row < row || (e.row == row && e.position == BlockPosition::Before)
            })
            .map(|e| e.height_px)
            .sum()
    }

    pub fn total_height(&self) -> f64 {
        self.entries.iter().map(|e| e.height_px).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, row: usize, position: BlockPosition, height: f64) -> BlockEntry {
        BlockEntry {
            decoration: DecorationId(id),
            row,
            position,
            height_px: height,
        }
    }

    #[test]
    fn before_and_after_attribution() {
        let mut index = BlockHeightIndex::new();
        index.rebuild([
            entry(0, 4, BlockPosition::Before, 33.0),
            entry(1, 4, BlockPosition::After, 10.0),
            entry(2, 7, BlockPosition::Before, 5.0),
        ]);

        // Both blocks at row 4 belong to any range containing row 4.
        assert_eq!(index.height_in_rows(3..6), 43.0);
        assert_eq!(index.height_in_rows(6..9), 5.0);
        assert_eq!(index.height_in_rows(5..7), 0.0);

        // Line 4's top is pushed down by the Before block only.
        assert_eq!(index.height_above_row(4), 33.0);
        // Line 5 sits below both blocks at row 4.
        assert_eq!(index.height_above_row(5), 43.0);
        assert_eq!(index.height_above_row(0), 0.0);
        assert_eq!(index.total_height(), 48.0);
    }

    #[test]
    #[should_panic(expected = "negative block height")]
    fn negative_height_is_fatal() {
        let mut index = BlockHeightIndex::new();
        index.rebuild([entry(0, 1, BlockPosition::Before, -1.0)]);
    }
}
