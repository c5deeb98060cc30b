//! Tile management: recyclable fixed-size row groups.
//!
//! The rendered row range is covered by tiles whose start rows are multiples
//! of `rows_per_tile`. Tiles own retained visual containers identified by a
//! `TileNodeId` that survives relabeling: when the window shifts, a tile
//! that left the needed set is relabeled to a newly needed start row instead
//! of being destroyed, so the retained-node count stays stable during steady
//! scrolling.
//!
//! Invariants:
//! * Tiles are ordered by `start_row` and disjoint.
//! * `top_px` equals the exact cumulative height of all preceding content:
//!   uniform line heights outside the window (off-window blocks are excluded
//!   from geometry) plus measured per-tile heights inside it.
//! * Tile heights are never negative; a negative height is fatal.
//! * A zero-row document reconciles to a single empty tile, not an error.

use std::collections::HashMap;
use std::ops::Range as RowRange;

use tracing::trace;

use crate::blocks::BlockHeightIndex;

/// Identity of a retained tile container, stable across relabeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileNodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub node: TileNodeId,
    pub start_row: usize,
    pub row_count: usize,
    pub top_px: f64,
    pub height_px: f64,
}

impl Tile {
    pub fn rows(&self) -> RowRange<usize> {
        self.start_row..self.start_row + self.row_count
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileMetricsSnapshot {
    /// Containers created because no reusable tile existed.
    pub created: u64,
    /// Containers relabeled to a different start row.
    pub recycled: u64,
    /// Containers dropped because the needed set shrank.
    pub dropped: u64,
}

/// Unlabeled containers kept around between reconciliations so that the
/// needed-set size oscillating by one (the usual case while scrolling) never
/// destroys and recreates nodes.
const MAX_SPARE_TILES: usize = 2;

#[derive(Debug, Default)]
pub struct TileManager {
    rows_per_tile: usize,
    tiles: Vec<Tile>,
    free: Vec<TileNodeId>,
    next_node: u64,
    metrics: TileMetricsSnapshot,
}

impl TileManager {
    pub fn new(rows_per_tile: usize) -> Self {
        assert!(rows_per_tile > 0, "rows_per_tile must be positive");
        Self {
            rows_per_tile,
            tiles: Vec::new(),
            free: Vec::new(),
            next_node: 0,
            metrics: TileMetricsSnapshot::default(),
        }
    }

    pub fn rows_per_tile(&self) -> usize {
        self.rows_per_tile
    }

    /// Changing tile size invalidates every container.
    pub fn set_rows_per_tile(&mut self, rows_per_tile: usize) {
        assert!(rows_per_tile > 0, "rows_per_tile must be positive");
        if rows_per_tile != self.rows_per_tile {
            self.metrics.dropped += (self.tiles.len() + self.free.len()) as u64;
            self.rows_per_tile = rows_per_tile;
            self.tiles.clear();
            self.free.clear();
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile_for_row(&self, row: usize) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.rows().contains(&row))
    }

    /// The contiguous row range covered by the current tile set.
    pub fn rendered_rows(&self) -> RowRange<usize> {
        match (self.tiles.first(), self.tiles.last()) {
            (Some(first), Some(last)) => first.start_row..last.start_row + last.row_count,
            _ => 0..0,
        }
    }

    pub fn metrics(&self) -> TileMetricsSnapshot {
        self.metrics
    }

    /// Reconcile the tile set against a visible row range. `visible` is
    /// clamped to `total_rows`; `blocks` supplies the non-uniform height
    /// contributions for rows inside the window.
    pub fn reconcile(
        &mut self,
        visible: RowRange<usize>,
        total_rows: usize,
        line_height_px: f64,
        blocks: &BlockHeightIndex,
    ) {
        let starts = self.needed_starts(visible, total_rows);

        // Index existing containers by their current start row, then hand
        // containers back out: exact matches keep their label, the rest are
        // relabeled in order, and only a shortfall creates new nodes.
        let mut by_start: HashMap<usize, TileNodeId> =
            self.tiles.iter().map(|t| (t.start_row, t.node)).collect();
        let mut spare: Vec<TileNodeId> = std::mem::take(&mut self.free);
        for tile in &self.tiles {
            if !starts.contains(&tile.start_row) {
                by_start.remove(&tile.start_row);
                spare.push(tile.node);
            }
        }

        let mut next = Vec::with_capacity(starts.len());
        // Off-window rows have uniform height: the first tile's top is exact
        // because every block above the window is excluded from geometry.
        let mut top_px = starts.first().copied().unwrap_or(0) as f64 * line_height_px;
        for start_row in starts {
            let node = if let Some(node) = by_start.remove(&start_row) {
                node
            } else if let Some(node) = spare.pop() {
                self.metrics.recycled += 1;
                node
            } else {
                self.metrics.created += 1;
                let node = TileNodeId(self.next_node);
                self.next_node += 1;
                node
            };
            let row_count = self.rows_per_tile.min(total_rows - start_row);
            let rows = start_row..start_row + row_count;
            let height_px =
                row_count as f64 * line_height_px + blocks.height_in_rows(rows);
            assert!(height_px >= 0.0, "negative tile height at row {start_row}");
            next.push(Tile {
                node,
                start_row,
                row_count,
                top_px,
                height_px,
            });
            top_px += height_px;
        }
        if spare.len() > MAX_SPARE_TILES {
            self.metrics.dropped += (spare.len() - MAX_SPARE_TILES) as u64;
            spare.truncate(MAX_SPARE_TILES);
        }
        self.free = spare;
        trace!(
            tiles = next.len(),
            recycled = self.metrics.recycled,
            "reconciled tile set"
        );
        self.tiles = next;
    }

    fn needed_starts(&self, visible: RowRange<usize>, total_rows: usize) -> Vec<usize> {
        if total_rows == 0 {
            // Fully collapsed content still renders one empty tile.
            return vec![0];
        }
        let start = visible.start.min(total_rows - 1);
        let end = visible.end.clamp(start + 1, total_rows);
        let first = start / self.rows_per_tile * self.rows_per_tile;
        let last = (end - 1) / self.rows_per_tile * self.rows_per_tile;
        (first..=last).step_by(self.rows_per_tile).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconcile(manager: &mut TileManager, visible: RowRange<usize>, total: usize) {
        manager.reconcile(visible, total, 10.0, &BlockHeightIndex::new());
    }

    #[test]
    fn minimal_cover_aligned_to_tile_boundaries() {
        let mut manager = TileManager::new(3);
        reconcile(&mut manager, 5..14, 20);
        let starts: Vec<_> = manager.tiles().iter().map(|t| t.start_row).collect();
        assert_eq!(starts, vec![3, 6, 9, 12]);
        assert_eq!(manager.rendered_rows(), 3..15);
    }

    #[test]
    fn tops_accumulate_and_last_tile_is_partial() {
        let mut manager = TileManager::new(3);
        reconcile(&mut manager, 10..14, 14);
        let tiles = manager.tiles();
        assert_eq!(tiles[0].start_row, 9);
        assert_eq!(tiles[0].top_px, 90.0);
        assert_eq!(tiles[1].top_px, 120.0);
        assert_eq!(tiles[1].row_count, 2, "row 12..14 only");
        assert_eq!(tiles[1].height_px, 20.0);
    }

    #[test]
    fn steady_scroll_recycles_instead_of_creating() {
        let mut manager = TileManager::new(3);
        // Warm up across one tile boundary so the maximal cover (4 tiles)
        // has been seen once.
        reconcile(&mut manager, 0..9, 100);
        reconcile(&mut manager, 1..10, 100);
        let created = manager.metrics().created;
        assert_eq!(created, 4);

        for first in 2..40usize {
            reconcile(&mut manager, first..first + 9, 100);
        }
        assert_eq!(manager.metrics().created, created, "no new containers");
        assert_eq!(manager.metrics().dropped, 0, "no containers destroyed");
        assert!(manager.metrics().recycled > 0);
    }

    #[test]
    fn tile_set_changes_only_at_tile_boundaries() {
        let mut manager = TileManager::new(4);
        reconcile(&mut manager, 3..12, 100);
        let before: Vec<_> = manager.tiles().to_vec();
        // Shifting within the same tile cover leaves the set untouched.
        reconcile(&mut manager, 3..12, 100);
        assert_eq!(before, manager.tiles());
    }

    #[test]
    fn zero_rows_yields_single_empty_tile() {
        let mut manager = TileManager::new(3);
        reconcile(&mut manager, 0..10, 0);
        assert_eq!(manager.tiles().len(), 1);
        let tile = &manager.tiles()[0];
        assert_eq!(tile.row_count, 0);
        assert_eq!(tile.height_px, 0.0);
    }

    #[test]
    fn block_heights_fold_into_owning_tile() {
        let mut manager = TileManager::new(3);
        let mut blocks = BlockHeightIndex::new();
        blocks.rebuild([crate::blocks::BlockEntry {
            decoration: core_marker::DecorationId(0),
            row: 4,
            position: core_marker::BlockPosition::Before,
            height_px: 33.0,
        }]);
        manager.reconcile(0..9, 14, 10.0, &blocks);
        let tiles = manager.tiles();
        assert_eq!(tiles[0].height_px, 30.0);
        assert_eq!(tiles[1].height_px, 63.0, "tile of rows 3..6 absorbs block");
        assert_eq!(tiles[2].top_px, 93.0);
    }
}
