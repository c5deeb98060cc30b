//! The retained visual tree.
//!
//! The tree is the renderer's output: a value-level description of every
//! node the host should have on screen. It is written exactly once per
//! flush via `commit`; all other components only read it. Node *identity*
//! continuity is what the host cares about (it maps identities to real
//! platform nodes), so the tree tracks reuse: a line whose `ScreenLineId`
//! is unchanged inside the same tile container keeps its node, and the
//! reuse counters let tests assert churn stays bounded.

use std::collections::HashMap;

use core_geometry::Point;
use core_marker::{BlockPosition, DecorationId};
use core_model::ScreenLineId;

use crate::tiles::TileNodeId;

/// One styled run of text within a line node. Runs tile the line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanView {
    pub text: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineView {
    pub id: ScreenLineId,
    pub screen_row: usize,
    pub top_px: f64,
    pub spans: Vec<SpanView>,
    /// Classes contributed by line decorations.
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockView {
    pub decoration: DecorationId,
    pub screen_row: usize,
    pub position: BlockPosition,
    pub top_px: f64,
    pub height_px: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub node: TileNodeId,
    pub start_row: usize,
    pub top_px: f64,
    pub height_px: f64,
    pub lines: Vec<LineView>,
    pub blocks: Vec<BlockView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GutterItemView {
    pub screen_row: usize,
    pub top_px: f64,
    /// Line-number label; `None` for soft-wrap continuations and custom
    /// gutter rows without content.
    pub label: Option<String>,
    pub classes: Vec<String>,
    pub foldable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GutterView {
    pub name: String,
    pub priority: i32,
    pub items: Vec<GutterItemView>,
}

/// A highlight rectangle. `width_px: None` extends to the right edge of the
/// text area.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionView {
    pub top_px: f64,
    pub left_px: f64,
    pub height_px: f64,
    pub width_px: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightView {
    pub decoration: DecorationId,
    pub class: Option<String>,
    pub regions: Vec<RegionView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub decoration: DecorationId,
    pub class: Option<String>,
    pub left_px: f64,
    pub top_px: f64,
    /// True when the overlay was flipped above its anchor row.
    pub flipped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CursorView {
    pub position: Point,
    pub left_px: f64,
    pub top_px: f64,
    pub width_px: f64,
    pub height_px: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeMetricsSnapshot {
    pub commits: u64,
    pub lines_reused: u64,
    pub lines_rebuilt: u64,
}

/// The complete retained tree for one surface.
#[derive(Debug, Default)]
pub struct VisualTree {
    tiles: Vec<TileView>,
    gutters: Vec<GutterView>,
    highlights: Vec<HighlightView>,
    overlays: Vec<OverlayView>,
    cursors: Vec<CursorView>,
    metrics: TreeMetricsSnapshot,
}

impl VisualTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tree contents. Called exactly once per flush.
    pub fn commit(
        &mut self,
        tiles: Vec<TileView>,
        gutters: Vec<GutterView>,
        highlights: Vec<HighlightView>,
        overlays: Vec<OverlayView>,
        cursors: Vec<CursorView>,
    ) {
        // Line-node reuse accounting: a line id still present in the same
        // container keeps its platform node.
        let mut previous: HashMap<(TileNodeId, ScreenLineId), ()> = HashMap::new();
        for tile in &self.tiles {
            for line in &tile.lines {
                previous.insert((tile.node, line.id), ());
            }
        }
        for tile in &tiles {
            for line in &tile.lines {
                if previous.contains_key(&(tile.node, line.id)) {
                    self.metrics.lines_reused += 1;
                } else {
                    self.metrics.lines_rebuilt += 1;
                }
            }
        }

        self.tiles = tiles;
        self.gutters = gutters;
        self.highlights = highlights;
        self.overlays = overlays;
        self.cursors = cursors;
        self.metrics.commits += 1;
    }

    pub fn clear(&mut self) {
        self.commit(Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());
    }

    pub fn tiles(&self) -> &[TileView] {
        &self.tiles
    }

    pub fn gutters(&self) -> &[GutterView] {
        &self.gutters
    }

    pub fn highlights(&self) -> &[HighlightView] {
        &self.highlights
    }

    pub fn overlays(&self) -> &[OverlayView] {
        &self.overlays
    }

    pub fn cursors(&self) -> &[CursorView] {
        &self.cursors
    }

    pub fn metrics(&self) -> TreeMetricsSnapshot {
        self.metrics
    }

    pub fn line_for_row(&self, screen_row: usize) -> Option<&LineView> {
        self.tiles
            .iter()
            .flat_map(|t| t.lines.iter())
            .find(|l| l.screen_row == screen_row)
    }

    pub fn line_number_for_row(&self, screen_row: usize) -> Option<&GutterItemView> {
        self.gutters
            .iter()
            .find(|g| g.name == "line-number")
            .and_then(|g| g.items.iter().find(|i| i.screen_row == screen_row))
    }

    /// Plain text of a rendered row (joined spans), for assertions and
    /// host-side accessibility queries.
    pub fn row_text(&self, screen_row: usize) -> Option<String> {
        self.line_for_row(screen_row)
            .map(|l| l.spans.iter().map(|s| s.text.as_str()).collect())
    }
}
