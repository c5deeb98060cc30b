//! The render surface: flush orchestration and the host-facing API.
//!
//! `RenderSurface` owns every piece of render state (measurements, scroll,
//! tiles, block heights, decorations, the retained tree, the scheduler) but
//! none of the text state. Text, layout, markers, and host measurement hooks
//! arrive per call through [`FrameContext`], so the host keeps ownership and
//! can mutate them freely between flushes.
//!
//! A flush runs in three phases:
//! 1. derive: refresh metrics if stale, attach scroll, resolve decorations,
//!    rebuild block geometry, recompute scroll bounds, reconcile tiles;
//! 2. commit: write the visual tree exactly once;
//! 3. measure: read host measurements (block heights, overlay sizes) against
//!    the committed tree and apply any pending autoscroll. Differences
//!    schedule a single correction flush through the scheduler.

use std::collections::HashMap;
use std::ops::Range as RowRange;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use core_config::{Config, ConfigContext, PlatformTraits};
use core_geometry::{
    column_for_x, x_for_column, FontMetrics, MeasurementStore, MetricsSource, Point, Range,
};
use core_marker::{
    BlockPosition, DecorationId, DecorationKind, DecorationProps, LayerId, MarkerId, MarkerSet,
};
use core_model::LayoutOracle;

use crate::blocks::{BlockEntry, BlockHeightIndex};
use crate::composite::{self, CompositorInput, RenderedDecorations};
use crate::scheduler::{DirtyFlags, UpdateMode, UpdateScheduler};
use crate::scroll::ScrollController;
use crate::tiles::TileManager;
use crate::visual::{
    BlockView, CursorView, GutterItemView, GutterView, HighlightView, LineView, OverlayView,
    RegionView, SpanView, TileView, VisualTree,
};

/// Host measurement hook. Consulted after each commit for the dimensions of
/// content the core cannot measure itself.
pub trait NodeMeasurer {
    /// Measured height of a block decoration's rendered content.
    fn block_height_px(&self, decoration: DecorationId) -> f64;

    /// Measured (width, height) of an overlay, when known.
    fn overlay_size_px(&self, _decoration: DecorationId) -> Option<(f64, f64)> {
        None
    }
}

/// Measurer for hosts without block or overlay content.
impl NodeMeasurer for () {
    fn block_height_px(&self, _decoration: DecorationId) -> f64 {
        0.0
    }
}

/// Table-backed measurer for tests and simple hosts.
#[derive(Debug, Default)]
pub struct MapMeasurer {
    block_heights: HashMap<DecorationId, f64>,
    overlay_sizes: HashMap<DecorationId, (f64, f64)>,
}

impl MapMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block_height(&mut self, decoration: DecorationId, height_px: f64) {
        self.block_heights.insert(decoration, height_px);
    }

    pub fn remove_block(&mut self, decoration: DecorationId) {
        self.block_heights.remove(&decoration);
    }

    pub fn set_overlay_size(&mut self, decoration: DecorationId, size_px: (f64, f64)) {
        self.overlay_sizes.insert(decoration, size_px);
    }
}

impl NodeMeasurer for MapMeasurer {
    fn block_height_px(&self, decoration: DecorationId) -> f64 {
        self.block_heights.get(&decoration).copied().unwrap_or(0.0)
    }

    fn overlay_size_px(&self, decoration: DecorationId) -> Option<(f64, f64)> {
        self.overlay_sizes.get(&decoration).copied()
    }
}

/// Everything external a flush needs, borrowed for the duration of one call.
pub struct FrameContext<'a> {
    pub oracle: &'a dyn LayoutOracle,
    pub markers: &'a MarkerSet,
    /// Absent while the surface is outside a live layout context; pixel
    /// output is withheld (the tree stays empty) until it returns.
    pub metrics_source: Option<&'a dyn MetricsSource>,
    pub measurer: &'a dyn NodeMeasurer,
}

/// A content-space pixel position (unaffected by the current scroll).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPosition {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoscrollOptions {
    /// Center the target instead of applying margins.
    pub center: bool,
    /// Prioritize keeping the range start visible for oversized targets.
    pub reversed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GutterRegistration {
    name: String,
    priority: i32,
}

pub const LINE_NUMBER_GUTTER: &str = "line-number";

/// Extra padding columns around line-number labels.
const GUTTER_PADDING_COLUMNS: usize = 2;
/// Minimum label width in digits, so short files do not get a one-digit
/// gutter that jumps at line 10.
const MIN_LINE_NUMBER_DIGITS: usize = 2;

pub struct RenderSurface {
    config: Config,
    platform: PlatformTraits,
    measurements: MeasurementStore,
    scroll: ScrollController,
    tiles: TileManager,
    blocks: BlockHeightIndex,
    decorations: core_marker::DecorationSet,
    tree: VisualTree,
    scheduler: UpdateScheduler,
    gutters: Vec<GutterRegistration>,
    /// Measured dimensions from previous flushes, keyed by decoration.
    measured_block_heights: HashMap<DecorationId, f64>,
    measured_overlay_sizes: HashMap<DecorationId, (f64, f64)>,
    pending_autoscroll: Option<(Range, AutoscrollOptions)>,
    visible_rows: RowRange<usize>,
    visible: bool,
}

impl RenderSurface {
    pub fn new(config: Config, platform: PlatformTraits) -> Self {
        let mode = if config.file.render.synchronous {
            UpdateMode::Synchronous
        } else {
            UpdateMode::Batched
        };
        let mut gutters = Vec::new();
        if config.file.gutter.line_numbers {
            gutters.push(GutterRegistration {
                name: LINE_NUMBER_GUTTER.to_string(),
                priority: 0,
            });
        }
        Self {
            tiles: TileManager::new(config.file.render.rows_per_tile),
            scheduler: UpdateScheduler::new(mode),
            config,
            platform,
            measurements: MeasurementStore::new(),
            scroll: ScrollController::new(),
            blocks: BlockHeightIndex::new(),
            decorations: core_marker::DecorationSet::new(),
            tree: VisualTree::new(),
            gutters,
            measured_block_heights: HashMap::new(),
            measured_overlay_sizes: HashMap::new(),
            pending_autoscroll: None,
            visible_rows: 0..0,
            visible: true,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn platform(&self) -> PlatformTraits {
        self.platform
    }

    pub fn tree(&self) -> &VisualTree {
        &self.tree
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    pub fn tile_metrics(&self) -> crate::tiles::TileMetricsSnapshot {
        self.tiles.metrics()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Screen rows intersecting the viewport as of the last flush.
    pub fn visible_row_range(&self) -> RowRange<usize> {
        self.visible_rows.clone()
    }

    /// Screen rows covered by retained tiles (a superset of the visible
    /// range, aligned to tile boundaries).
    pub fn rendered_row_range(&self) -> RowRange<usize> {
        self.tiles.rendered_rows()
    }

    /// Columns intersecting the viewport under the current horizontal
    /// scroll, in base character widths. Empty while detached.
    pub fn visible_column_range(&self) -> RowRange<usize> {
        let first = self.scroll.left_column().floor() as usize;
        let Some(metrics) = self.measurements.metrics() else {
            return first..first;
        };
        let columns =
            (self.measurements.text_width_px() / metrics.default_char_width_px).ceil() as usize;
        first..first + columns
    }

    pub fn scroll_top_px(&self) -> f64 {
        self.scroll.top_px()
    }

    pub fn scroll_left_px(&self) -> f64 {
        self.scroll.left_px()
    }

    pub fn scroll_top_row(&self) -> f64 {
        self.scroll.top_row()
    }

    pub fn scroll_left_column(&self) -> f64 {
        self.scroll.left_column()
    }

    pub fn gutter_width_px(&self) -> f64 {
        self.measurements.gutter_width_px()
    }

    // --- commands -------------------------------------------------------

    /// Drive pending work: collect expired flash decorations, then run the
    /// coalesced flush plus at most one correction.
    pub fn tick(&mut self, ctx: &FrameContext<'_>) {
        if self.decorations.remove_expired(Instant::now()) > 0 {
            let _ = self.scheduler.mark(DirtyFlags::DECORATIONS);
        }
        while self.visible && self.scheduler.needs_flush() {
            self.flush(ctx);
        }
    }

    /// The layout oracle's output changed (edit, wrap change, fold toggle).
    pub fn notify_layout_changed(&mut self, ctx: &FrameContext<'_>) {
        self.schedule(DirtyFlags::CONTENT, ctx);
    }

    /// Marker geometry or validity changed outside the decoration API.
    pub fn notify_markers_changed(&mut self, ctx: &FrameContext<'_>) {
        self.schedule(DirtyFlags::DECORATIONS, ctx);
    }

    pub fn set_scroll_top_px(&mut self, px: f64, ctx: &FrameContext<'_>) -> bool {
        let moved = self.scroll.set_top_px(px);
        if moved {
            self.schedule(DirtyFlags::SCROLL, ctx);
        }
        moved
    }

    pub fn set_scroll_left_px(&mut self, px: f64, ctx: &FrameContext<'_>) -> bool {
        let moved = self.scroll.set_left_px(px);
        if moved {
            self.schedule(DirtyFlags::SCROLL, ctx);
        }
        moved
    }

    /// Logical scroll setters work even before metrics arrive.
    pub fn set_scroll_top_row(&mut self, row: f64, ctx: &FrameContext<'_>) -> bool {
        let moved = self.scroll.set_top_row(row);
        if moved {
            self.schedule(DirtyFlags::SCROLL, ctx);
        }
        moved
    }

    pub fn set_scroll_left_column(&mut self, column: f64, ctx: &FrameContext<'_>) -> bool {
        let moved = self.scroll.set_left_column(column);
        if moved {
            self.schedule(DirtyFlags::SCROLL, ctx);
        }
        moved
    }

    /// Translate a wheel event into scrolling. Returns true when the
    /// position moved (hosts let the event propagate otherwise).
    pub fn handle_wheel(
        &mut self,
        delta_x: f64,
        delta_y: f64,
        shift: bool,
        ctx: &FrameContext<'_>,
    ) -> bool {
        let moved = self.scroll.wheel(
            delta_x,
            delta_y,
            shift,
            self.config.file.scroll.sensitivity,
            self.platform.shift_swaps_wheel_axes,
        );
        if moved {
            self.schedule(DirtyFlags::SCROLL, ctx);
        }
        moved
    }

    /// Resize the scroll container. Ignored while hidden (hidden surfaces
    /// report zero dimensions that must not clobber real ones).
    pub fn set_size(&mut self, width_px: f64, height_px: f64, ctx: &FrameContext<'_>) {
        if !self.visible {
            return;
        }
        if width_px != self.measurements.client_width_px() {
            // Block content reflows with the text width.
            self.measured_block_heights.clear();
        }
        self.measurements.set_client_size(width_px, height_px);
        self.schedule(DirtyFlags::RESIZE, ctx);
    }

    /// Hide or restore the surface. Restoring revalidates everything.
    pub fn set_visible(&mut self, visible: bool, ctx: &FrameContext<'_>) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.schedule(DirtyFlags::all(), ctx);
        }
    }

    /// Font or stylesheet changed: every cached measurement is suspect.
    pub fn invalidate_style(&mut self, ctx: &FrameContext<'_>) {
        self.measurements.invalidate();
        self.measured_block_heights.clear();
        self.measured_overlay_sizes.clear();
        self.schedule(DirtyFlags::STYLE, ctx);
    }

    /// Re-measure one block (or all of them) on the next flush.
    pub fn invalidate_block_dimensions(
        &mut self,
        decoration: Option<DecorationId>,
        ctx: &FrameContext<'_>,
    ) {
        match decoration {
            Some(id) => {
                self.measured_block_heights.remove(&id);
            }
            None => self.measured_block_heights.clear(),
        }
        self.schedule(DirtyFlags::CONTENT, ctx);
    }

    /// Bring a screen range into view on the next flush; applied after the
    /// tree commit so it sees fresh geometry.
    pub fn request_autoscroll(
        &mut self,
        screen_range: Range,
        options: AutoscrollOptions,
        ctx: &FrameContext<'_>,
    ) {
        self.pending_autoscroll = Some((screen_range, options));
        self.schedule(DirtyFlags::SCROLL, ctx);
    }

    pub fn decorate_marker(
        &mut self,
        marker: MarkerId,
        kind: DecorationKind,
        props: DecorationProps,
        ctx: &FrameContext<'_>,
    ) -> DecorationId {
        let id = self.decorations.decorate_marker(marker, kind, props);
        self.schedule(DirtyFlags::DECORATIONS, ctx);
        id
    }

    pub fn decorate_layer(
        &mut self,
        layer: LayerId,
        kind: DecorationKind,
        props: DecorationProps,
        ctx: &FrameContext<'_>,
    ) -> DecorationId {
        let id = self.decorations.decorate_layer(layer, kind, props);
        self.schedule(DirtyFlags::DECORATIONS, ctx);
        id
    }

    pub fn set_decoration_props(
        &mut self,
        id: DecorationId,
        props: DecorationProps,
        ctx: &FrameContext<'_>,
    ) {
        self.decorations.set_props(id, props);
        self.schedule(DirtyFlags::DECORATIONS, ctx);
    }

    pub fn set_decoration_override(
        &mut self,
        id: DecorationId,
        marker: MarkerId,
        props: DecorationProps,
        ctx: &FrameContext<'_>,
    ) {
        self.decorations.set_override(id, marker, props);
        self.schedule(DirtyFlags::DECORATIONS, ctx);
    }

    pub fn destroy_decoration(&mut self, id: DecorationId, ctx: &FrameContext<'_>) {
        self.decorations.destroy(id);
        self.measured_block_heights.remove(&id);
        self.measured_overlay_sizes.remove(&id);
        self.schedule(DirtyFlags::DECORATIONS, ctx);
    }

    pub fn destroy_decorations_for_marker(&mut self, marker: MarkerId, ctx: &FrameContext<'_>) {
        self.decorations.destroy_for_marker(marker);
        self.schedule(DirtyFlags::DECORATIONS, ctx);
    }

    /// Temporary highlight that removes itself after `duration`.
    pub fn flash_highlight(
        &mut self,
        marker: MarkerId,
        class: impl Into<String>,
        duration: Duration,
        ctx: &FrameContext<'_>,
    ) -> DecorationId {
        let id = self.decorations.decorate_marker(
            marker,
            DecorationKind::Highlight,
            DecorationProps::class(class),
        );
        self.decorations.set_expiry(id, Instant::now() + duration);
        self.schedule(DirtyFlags::DECORATIONS, ctx);
        id
    }

    pub fn add_gutter(&mut self, name: impl Into<String>, priority: i32, ctx: &FrameContext<'_>) {
        let name = name.into();
        if self.gutters.iter().any(|g| g.name == name) {
            return;
        }
        self.gutters.push(GutterRegistration { name, priority });
        self.gutters.sort_by_key(|g| g.priority);
        self.schedule(DirtyFlags::DECORATIONS | DirtyFlags::RESIZE, ctx);
    }

    pub fn remove_gutter(&mut self, name: &str, ctx: &FrameContext<'_>) {
        self.gutters.retain(|g| g.name != name);
        self.schedule(DirtyFlags::DECORATIONS | DirtyFlags::RESIZE, ctx);
    }

    // --- queries --------------------------------------------------------

    /// Content-space pixel position of a screen position. Works for rows
    /// outside the rendered window (geometry above/below the window is
    /// uniform by construction). `None` while detached.
    pub fn pixel_position_for_screen_position(
        &self,
        position: Point,
        ctx: &FrameContext<'_>,
    ) -> Option<PixelPosition> {
        let metrics = *self.measurements.metrics_lossy()?;
        let text = ctx
            .oracle
            .screen_line(position.row)
            .map(|l| l.text.clone())
            .unwrap_or_default();
        Some(PixelPosition {
            left: x_for_column(&text, position.column, &metrics),
            top: self.top_for_row(position.row, metrics.line_height_px),
        })
    }

    /// Inverse of `pixel_position_for_screen_position` under the midpoint
    /// rule. Rows clamp into the document; columns clamp onto the row.
    pub fn screen_position_for_pixel_position(
        &self,
        position: PixelPosition,
        ctx: &FrameContext<'_>,
    ) -> Option<Point> {
        let metrics = *self.measurements.metrics_lossy()?;
        let total = ctx.oracle.screen_line_count();
        if total == 0 {
            return Some(Point::zero());
        }
        let row = self
            .row_at_pixel(position.top, metrics.line_height_px, total)
            .min(total - 1);
        let text = ctx
            .oracle
            .screen_line(row)
            .map(|l| l.text.clone())
            .unwrap_or_default();
        Some(Point::new(row, column_for_x(&text, position.left, &metrics)))
    }

    /// Content-space top edge of a screen row, including block decorations
    /// stacked above it inside the rendered window.
    pub fn top_for_row(&self, row: usize, line_height_px: f64) -> f64 {
        row as f64 * line_height_px + self.blocks.height_above_row(row)
    }

    // --- flush ----------------------------------------------------------

    fn schedule(&mut self, flags: DirtyFlags, ctx: &FrameContext<'_>) {
        if self.scheduler.mark(flags) && self.visible {
            // Inline flush plus its correction, if one was requested.
            while self.scheduler.needs_flush() {
                self.flush(ctx);
            }
        }
    }

    fn flush(&mut self, ctx: &FrameContext<'_>) {
        let (flags, correction) = self.scheduler.begin_flush();
        trace!(?flags, correction, "flush");

        // Phase 1: metrics. Without a source there is nothing to render.
        if self.measurements.needs_refresh() {
            match ctx.metrics_source {
                Some(source) => self.measurements.refresh(source.font_metrics()),
                None => {
                    self.measurements.detach();
                    self.scroll.detach();
                    self.tree.clear();
                    self.scheduler.end_flush();
                    return;
                }
            }
        }
        let metrics = match self.measurements.metrics() {
            Some(m) => *m,
            None => {
                self.scheduler.end_flush();
                return;
            }
        };
        let line_height = metrics.line_height_px;
        let total_rows = ctx.oracle.screen_line_count();

        self.measurements
            .set_gutter_width_px(self.gutter_width_px_for(ctx, &metrics));
        self.scroll.attach(line_height, metrics.default_char_width_px);
        self.config.apply_context(ConfigContext::new(
            (self.measurements.client_height_px() / line_height) as usize,
            (self.measurements.text_width_px() / metrics.default_char_width_px) as usize,
        ));

        // Resolve decorations over the tile cover of the visible range; if
        // rebuilding block geometry moves the window, resolve once more so
        // the output matches the rows actually rendered.
        let mut visible = self.compute_visible_rows(line_height, total_rows);
        let mut window = self.tile_cover(visible.clone(), total_rows);
        let mut resolved = self.resolve_decorations(ctx, window.clone());
        self.rebuild_block_index(&resolved);
        self.update_scroll_bounds(ctx, &metrics, total_rows);
        visible = self.compute_visible_rows(line_height, total_rows);
        let rewindowed = self.tile_cover(visible.clone(), total_rows);
        if rewindowed != window {
            window = rewindowed;
            resolved = self.resolve_decorations(ctx, window.clone());
            self.rebuild_block_index(&resolved);
        }
        self.visible_rows = visible.clone();

        self.tiles
            .reconcile(visible, total_rows, line_height, &self.blocks);

        // Phase 2: single commit.
        let tiles = self.build_tiles(ctx, &resolved, line_height);
        let gutters = self.build_gutters(ctx, &resolved, line_height);
        let highlights = self.build_highlights(ctx, &resolved, &metrics);
        let overlays = self.build_overlays(ctx, &resolved, &metrics);
        let cursors = self.build_cursors(ctx, &resolved, &metrics);
        self.tree.commit(tiles, gutters, highlights, overlays, cursors);

        // Phase 3: measurement reads against the committed tree.
        let mut dirty = DirtyFlags::empty();
        for block in &resolved.blocks {
            let measured = ctx.measurer.block_height_px(block.decoration);
            let known = self
                .measured_block_heights
                .get(&block.decoration)
                .copied()
                .unwrap_or(0.0);
            if measured != known {
                self.measured_block_heights.insert(block.decoration, measured);
                dirty |= DirtyFlags::CONTENT;
            }
        }
        for overlay in &resolved.overlays {
            if let Some(size) = ctx.measurer.overlay_size_px(overlay.decoration) {
                if self.measured_overlay_sizes.get(&overlay.decoration) != Some(&size) {
                    self.measured_overlay_sizes.insert(overlay.decoration, size);
                    dirty |= DirtyFlags::DECORATIONS;
                }
            }
        }
        if let Some((range, options)) = self.pending_autoscroll.take() {
            if self.apply_autoscroll(ctx, range, options, &metrics) {
                dirty |= DirtyFlags::SCROLL;
            }
        }
        if !dirty.is_empty() {
            self.scheduler.request_correction(dirty);
        }
        self.scheduler.end_flush();
        debug!(
            visible = ?self.visible_rows,
            tiles = self.tree.tiles().len(),
            "flush complete"
        );
    }

    fn gutter_width_px_for(&self, ctx: &FrameContext<'_>, metrics: &FontMetrics) -> f64 {
        let mut columns = 0usize;
        for gutter in &self.gutters {
            if gutter.name == LINE_NUMBER_GUTTER {
                let total = ctx.oracle.screen_line_count();
                let last_line = match total.checked_sub(1).and_then(|r| ctx.oracle.screen_line(r))
                {
                    Some(line) => line.buffer_row + 1,
                    None => 1,
                };
                columns += digits(last_line).max(MIN_LINE_NUMBER_DIGITS) + GUTTER_PADDING_COLUMNS;
            } else {
                // Custom gutters render icon-sized content.
                columns += GUTTER_PADDING_COLUMNS;
            }
        }
        columns as f64 * metrics.default_char_width_px
    }

    fn compute_visible_rows(&self, line_height: f64, total_rows: usize) -> RowRange<usize> {
        if total_rows == 0 {
            return 0..0;
        }
        let top = self.scroll.top_px();
        let bottom = top + self.measurements.client_height_px();
        let first = self.row_at_pixel(top, line_height, total_rows);
        // The bottom boundary is exclusive: a row whose top edge sits exactly
        // at it shows zero pixels and is not visible.
        let mut last = self.row_at_pixel(bottom, line_height, total_rows);
        if last > first && self.top_for_row(last, line_height) >= bottom {
            last -= 1;
        }
        first..(last + 1).min(total_rows)
    }

    fn tile_cover(&self, rows: RowRange<usize>, total_rows: usize) -> RowRange<usize> {
        if total_rows == 0 || rows.is_empty() {
            return 0..0;
        }
        let per = self.tiles.rows_per_tile();
        let first = rows.start / per * per;
        let last = ((rows.end - 1) / per + 1) * per;
        first..last.min(total_rows)
    }

    fn tile_row_ranges(&self, window: RowRange<usize>) -> Vec<RowRange<usize>> {
        let per = self.tiles.rows_per_tile();
        let mut ranges = Vec::new();
        let mut start = window.start;
        while start < window.end {
            let end = (start / per * per + per).min(window.end);
            ranges.push(start..end);
            start = end;
        }
        ranges
    }

    fn resolve_decorations(
        &self,
        ctx: &FrameContext<'_>,
        window: RowRange<usize>,
    ) -> RenderedDecorations {
        let tile_rows = self.tile_row_ranges(window.clone());
        composite::resolve(&CompositorInput {
            oracle: ctx.oracle,
            markers: ctx.markers,
            decorations: &self.decorations,
            rows: window,
            tile_rows: &tile_rows,
            now: Instant::now(),
            show_cursor_on_selection: self.config.file.cursor.show_on_selection,
        })
    }

    fn rebuild_block_index(&mut self, resolved: &RenderedDecorations) {
        let heights = &self.measured_block_heights;
        self.blocks.rebuild(resolved.blocks.iter().map(|b| BlockEntry {
            decoration: b.decoration,
            row: b.row,
            position: b.position,
            height_px: heights.get(&b.decoration).copied().unwrap_or(0.0),
        }));
    }

    fn update_scroll_bounds(
        &mut self,
        ctx: &FrameContext<'_>,
        metrics: &FontMetrics,
        total_rows: usize,
    ) {
        let content_height =
            total_rows as f64 * metrics.line_height_px + self.blocks.total_height();
        let content_width =
            ctx.oracle.longest_screen_line_length() as f64 * metrics.default_char_width_px;
        let max_top = (content_height - self.measurements.client_height_px()).max(0.0);
        let max_left = (content_width - self.measurements.text_width_px()).max(0.0);
        self.scroll.set_max_scroll(max_top, max_left);
    }

    fn row_at_pixel(&self, y: f64, line_height: f64, total_rows: usize) -> usize {
        if total_rows == 0 {
            return 0;
        }
        let y = y.max(0.0);
        if self.blocks.is_empty() {
            return ((y / line_height) as usize).min(total_rows - 1);
        }
        // Row tops are monotone, so binary-search the greatest row whose top
        // edge is at or above y. Pixels inside a Before block resolve to the
        // row above the block.
        let (mut lo, mut hi) = (0usize, total_rows - 1);
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.top_for_row(mid, line_height) <= y {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }

    fn build_tiles(
        &self,
        ctx: &FrameContext<'_>,
        resolved: &RenderedDecorations,
        line_height: f64,
    ) -> Vec<TileView> {
        self.tiles
            .tiles()
            .iter()
            .map(|tile| {
                let mut lines = Vec::with_capacity(tile.row_count);
                for row in tile.rows() {
                    let Some(line) = ctx.oracle.screen_line(row) else {
                        continue;
                    };
                    let spans = match resolved.text_spans.get(&row) {
                        Some(specs) => {
                            let mut chars = line.text.chars();
                            specs
                                .iter()
                                .map(|spec| SpanView {
                                    text: chars.by_ref().take(spec.length).collect(),
                                    classes: spec.classes.clone(),
                                })
                                .collect()
                        }
                        None => Vec::new(),
                    };
                    lines.push(LineView {
                        id: line.id,
                        screen_row: row,
                        top_px: self.top_for_row(row, line_height) - tile.top_px,
                        spans,
                        classes: resolved
                            .line_classes
                            .get(&row)
                            .cloned()
                            .unwrap_or_default(),
                    });
                }
                let blocks = self.build_tile_blocks(tile.rows(), tile.top_px, line_height);
                TileView {
                    node: tile.node,
                    start_row: tile.start_row,
                    top_px: tile.top_px,
                    height_px: tile.height_px,
                    lines,
                    blocks,
                }
            })
            .collect()
    }

    /// Block views for one tile, stacked in index order around their anchor
    /// lines, with tops relative to the tile.
    fn build_tile_blocks(
        &self,
        rows: RowRange<usize>,
        tile_top: f64,
        line_height: f64,
    ) -> Vec<BlockView> {
        let mut views = Vec::new();
        for row in rows {
            let line_top = self.top_for_row(row, line_height);
            let before_total: f64 = self
                .blocks
                .entries_at_row(row)
                .filter(|e| e.position == BlockPosition::Before)
                .map(|e| e.height_px)
                .sum();
            let mut before_offset = line_top - before_total;
            let mut after_offset = line_top + line_height;
            for entry in self.blocks.entries_at_row(row) {
                let top = match entry.position {
                    BlockPosition::Before => {
                        let top = before_offset;
                        before_offset += entry.height_px;
                        top
                    }
                    BlockPosition::After => {
                        let top = after_offset;
                        after_offset += entry.height_px;
                        top
                    }
                };
                views.push(BlockView {
                    decoration: entry.decoration,
                    screen_row: row,
                    position: entry.position,
                    top_px: top - tile_top,
                    height_px: entry.height_px,
                });
            }
        }
        views
    }

    fn build_gutters(
        &self,
        ctx: &FrameContext<'_>,
        resolved: &RenderedDecorations,
        line_height: f64,
    ) -> Vec<GutterView> {
        let window = self.tiles.rendered_rows();
        self.gutters
            .iter()
            .map(|gutter| {
                let mut items = Vec::new();
                if gutter.name == LINE_NUMBER_GUTTER {
                    for row in window.clone() {
                        let Some(line) = ctx.oracle.screen_line(row) else {
                            continue;
                        };
                        items.push(GutterItemView {
                            screen_row: row,
                            top_px: self.top_for_row(row, line_height),
                            label: (!line.soft_wrapped)
                                .then(|| (line.buffer_row + 1).to_string()),
                            classes: resolved
                                .line_number_classes
                                .get(&row)
                                .cloned()
                                .unwrap_or_default(),
                            foldable: !line.soft_wrapped && ctx.oracle.is_foldable(line.buffer_row),
                        });
                    }
                } else if let Some(rows) = resolved.gutter_classes.get(&gutter.name) {
                    for (&row, classes) in rows {
                        if !window.contains(&row) {
                            continue;
                        }
                        items.push(GutterItemView {
                            screen_row: row,
                            top_px: self.top_for_row(row, line_height),
                            label: None,
                            classes: classes.clone(),
                            foldable: false,
                        });
                    }
                }
                GutterView {
                    name: gutter.name.clone(),
                    priority: gutter.priority,
                    items,
                }
            })
            .collect()
    }

    fn build_highlights(
        &self,
        ctx: &FrameContext<'_>,
        resolved: &RenderedDecorations,
        metrics: &FontMetrics,
    ) -> Vec<HighlightView> {
        resolved
            .highlights
            .iter()
            .map(|spec| HighlightView {
                decoration: spec.decoration,
                class: spec.class.clone(),
                regions: spec
                    .regions
                    .iter()
                    .map(|region| {
                        let top = self.top_for_row(region.start_row, metrics.line_height_px);
                        let bottom = self.top_for_row(region.end_row, metrics.line_height_px)
                            + metrics.line_height_px;
                        let left = region
                            .start_column
                            .map(|column| {
                                let text = ctx
                                    .oracle
                                    .screen_line(region.start_row)
                                    .map(|l| l.text.clone())
                                    .unwrap_or_default();
                                x_for_column(&text, column, metrics)
                            })
                            .unwrap_or(0.0);
                        let width = region.end_column.map(|column| {
                            let text = ctx
                                .oracle
                                .screen_line(region.end_row)
                                .map(|l| l.text.clone())
                                .unwrap_or_default();
                            (x_for_column(&text, column, metrics) - left).max(0.0)
                        });
                        RegionView {
                            top_px: top,
                            left_px: left,
                            height_px: bottom - top,
                            width_px: width,
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    fn build_overlays(
        &self,
        ctx: &FrameContext<'_>,
        resolved: &RenderedDecorations,
        metrics: &FontMetrics,
    ) -> Vec<OverlayView> {
        resolved
            .overlays
            .iter()
            .map(|spec| {
                let text = ctx
                    .oracle
                    .screen_line(spec.anchor.row)
                    .map(|l| l.text.clone())
                    .unwrap_or_default();
                let anchor_left = x_for_column(&text, spec.anchor.column, metrics);
                let anchor_top = self.top_for_row(spec.anchor.row, metrics.line_height_px);
                // Default placement: below the anchor line.
                let mut left = anchor_left;
                let mut top = anchor_top + metrics.line_height_px;
                let mut flipped = false;
                if spec.avoid_overflow {
                    if let Some(&(width, height)) =
                        self.measured_overlay_sizes.get(&spec.decoration)
                    {
                        let view_top = self.scroll.top_px();
                        let view_bottom = view_top + self.measurements.client_height_px();
                        let view_left = self.scroll.left_px();
                        let view_right = view_left + self.measurements.text_width_px();
                        if top + height > view_bottom && anchor_top - height >= view_top {
                            top = anchor_top - height;
                            flipped = true;
                        }
                        if left + width > view_right {
                            left = view_right - width;
                        }
                        // An anchor scrolled out past the left edge still
                        // pins the overlay inside the viewport.
                        left = left.max(view_left);
                    }
                }
                OverlayView {
                    decoration: spec.decoration,
                    class: spec.class.clone(),
                    left_px: left,
                    top_px: top,
                    flipped,
                }
            })
            .collect()
    }

    fn build_cursors(
        &self,
        ctx: &FrameContext<'_>,
        resolved: &RenderedDecorations,
        metrics: &FontMetrics,
    ) -> Vec<CursorView> {
        resolved
            .cursors
            .iter()
            .map(|spec| {
                let text = ctx
                    .oracle
                    .screen_line(spec.position.row)
                    .map(|l| l.text.clone())
                    .unwrap_or_default();
                let left = x_for_column(&text, spec.position.column, metrics);
                let next = x_for_column(&text, spec.position.column + 1, metrics);
                let width = if next > left {
                    next - left
                } else {
                    metrics.default_char_width_px
                };
                CursorView {
                    position: spec.position,
                    left_px: left,
                    top_px: self.top_for_row(spec.position.row, metrics.line_height_px),
                    width_px: width,
                    height_px: metrics.line_height_px,
                }
            })
            .collect()
    }

    fn apply_autoscroll(
        &mut self,
        ctx: &FrameContext<'_>,
        range: Range,
        options: AutoscrollOptions,
        metrics: &FontMetrics,
    ) -> bool {
        let line_height = metrics.line_height_px;
        let target_top = self.top_for_row(range.start.row, line_height);
        let target_bottom = self.top_for_row(range.end.row, line_height) + line_height;
        let vertical_margin = self.config.effective_vertical_margin as f64 * line_height;
        let moved_v = self.scroll.autoscroll_vertically(
            target_top,
            target_bottom,
            vertical_margin,
            self.measurements.client_height_px(),
            options.reversed,
            options.center,
        );

        let x_of = |point: Point| {
            let text = ctx
                .oracle
                .screen_line(point.row)
                .map(|l| l.text.clone())
                .unwrap_or_default();
            x_for_column(&text, point.column, metrics)
        };
        let start_x = x_of(range.start);
        let end_x = x_of(range.end);
        let horizontal_margin =
            self.config.effective_horizontal_margin as f64 * metrics.default_char_width_px;
        let moved_h = self.scroll.autoscroll_horizontally(
            start_x.min(end_x),
            start_x.max(end_x),
            horizontal_margin,
            self.measurements.text_width_px(),
            options.reversed,
        );
        moved_v || moved_h
    }
}

fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}
