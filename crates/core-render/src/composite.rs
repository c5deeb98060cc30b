//! Decoration compositing.
//!
//! `resolve` is a pure function from marker/decoration state plus the
//! rendered row window to a value-level description of every decoration
//! effect. The surface converts these logical specs to pixel geometry when
//! it builds the visual tree; nothing here touches metrics, so resolving
//! the same state twice yields an equal result.
//!
//! Invalid markers and expired flash decorations contribute nothing.

use std::collections::BTreeMap;
use std::ops::Range as RowRange;
use std::time::Instant;

use core_geometry::{Point, Range};
use core_marker::{
    BlockPosition, Decoration, DecorationId, DecorationKind, DecorationSet, DecorationTarget,
    LineStyleOptions, Marker, MarkerId, MarkerSet,
};
use core_model::LayoutOracle;

/// One styled run of a rendered row. Runs tile the row text exactly; lengths
/// are in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanSpec {
    pub length: usize,
    pub classes: Vec<String>,
}

/// A highlight rectangle in screen coordinates, before pixel conversion.
/// `start_column: None` means the left edge of the text area and
/// `end_column: None` the right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    /// Inclusive row range covered by this region.
    pub start_row: usize,
    pub end_row: usize,
    pub start_column: Option<usize>,
    pub end_column: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpec {
    pub decoration: DecorationId,
    pub class: Option<String>,
    pub regions: Vec<RegionSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSpec {
    pub marker: MarkerId,
    /// Head position in screen coordinates.
    pub position: Point,
    pub class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySpec {
    pub decoration: DecorationId,
    pub class: Option<String>,
    /// Anchor (marker head) in screen coordinates.
    pub anchor: Point,
    pub avoid_overflow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    pub decoration: DecorationId,
    pub marker: MarkerId,
    pub row: usize,
    pub position: BlockPosition,
}

/// Everything the compositor resolved for one window, in screen coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDecorations {
    pub line_classes: BTreeMap<usize, Vec<String>>,
    pub line_number_classes: BTreeMap<usize, Vec<String>>,
    /// Per custom gutter name, per screen row.
    pub gutter_classes: BTreeMap<String, BTreeMap<usize, Vec<String>>>,
    /// Complete span tiling for each rendered row (token spans merged with
    /// text decorations). Rows past the end of the document are absent.
    pub text_spans: BTreeMap<usize, Vec<SpanSpec>>,
    pub highlights: Vec<HighlightSpec>,
    pub cursors: Vec<CursorSpec>,
    pub overlays: Vec<OverlaySpec>,
    pub blocks: Vec<BlockSpec>,
}

pub struct CompositorInput<'a> {
    pub oracle: &'a dyn LayoutOracle,
    pub markers: &'a MarkerSet,
    pub decorations: &'a DecorationSet,
    /// Rendered screen-row window (the tile cover, not just the viewport).
    pub rows: RowRange<usize>,
    /// Tile row ranges partitioning `rows`; highlight regions split at
    /// these boundaries so each region lives inside one tile container.
    pub tile_rows: &'a [RowRange<usize>],
    pub now: Instant,
    pub show_cursor_on_selection: bool,
}

/// Text-decoration interval on a single row, kept until the span sweep.
#[derive(Debug, Clone)]
struct TextInterval {
    start_column: usize,
    end_column: usize,
    class: String,
}

pub fn resolve(input: &CompositorInput<'_>) -> RenderedDecorations {
    let mut out = RenderedDecorations::default();
    let mut text_intervals: BTreeMap<usize, Vec<TextInterval>> = BTreeMap::new();

    for decoration in input.decorations.iter() {
        if decoration.expires_at.is_some_and(|at| at <= input.now) {
            continue;
        }
        for marker in target_markers(input.markers, decoration) {
            if !marker.valid {
                continue;
            }
            let screen = screen_range(input.oracle, marker);
            let head = input.oracle.screen_position_for_buffer_position(marker.head());
            let class = decoration.props_for(marker.id).class.clone();

            match &decoration.kind {
                DecorationKind::Line(options) => {
                    apply_line_classes(
                        &mut out.line_classes,
                        marker,
                        screen,
                        head,
                        *options,
                        &input.rows,
                        class.as_deref(),
                    );
                }
                DecorationKind::LineNumber(options) => {
                    apply_line_classes(
                        &mut out.line_number_classes,
                        marker,
                        screen,
                        head,
                        *options,
                        &input.rows,
                        class.as_deref(),
                    );
                }
                DecorationKind::Gutter {
                    gutter_name,
                    options,
                } => {
                    let rows = out.gutter_classes.entry(gutter_name.clone()).or_default();
                    apply_line_classes(
                        rows,
                        marker,
                        screen,
                        head,
                        *options,
                        &input.rows,
                        class.as_deref(),
                    );
                }
                DecorationKind::Highlight => {
                    if screen.is_empty() {
                        continue;
                    }
                    let regions = highlight_regions(screen, input.tile_rows);
                    if !regions.is_empty() {
                        out.highlights.push(HighlightSpec {
                            decoration: decoration.id,
                            class: class.clone(),
                            regions,
                        });
                    }
                }
                DecorationKind::Overlay { avoid_overflow } => {
                    if input.rows.contains(&head.row) {
                        out.overlays.push(OverlaySpec {
                            decoration: decoration.id,
                            class: class.clone(),
                            anchor: head,
                            avoid_overflow: *avoid_overflow,
                        });
                    }
                }
                DecorationKind::Cursor => {
                    if !marker.is_empty() && !input.show_cursor_on_selection {
                        continue;
                    }
                    if input.rows.contains(&head.row) {
                        out.cursors.push(CursorSpec {
                            marker: marker.id,
                            position: head,
                            class: class.clone(),
                        });
                    }
                }
                DecorationKind::Text => {
                    if let Some(name) = &class {
                        collect_text_intervals(
                            &mut text_intervals,
                            input.oracle,
                            screen,
                            &input.rows,
                            name,
                        );
                    }
                }
                DecorationKind::Block { position } => {
                    let row = match position {
                        BlockPosition::Before => screen.start.row,
                        BlockPosition::After => screen.end.row,
                    };
                    if input.rows.contains(&row) {
                        out.blocks.push(BlockSpec {
                            decoration: decoration.id,
                            marker: marker.id,
                            row,
                            position: *position,
                        });
                    }
                }
            }
        }
    }

    for row in input.rows.clone() {
        let Some(line) = input.oracle.screen_line(row) else {
            continue;
        };
        let intervals = text_intervals.remove(&row).unwrap_or_default();
        out.text_spans.insert(row, sweep_spans(&line, &intervals));
    }

    out
}

fn target_markers<'m>(
    markers: &'m MarkerSet,
    decoration: &Decoration,
) -> Vec<&'m Marker> {
    match decoration.target {
        DecorationTarget::Marker(id) => markers.marker(id).into_iter().collect(),
        DecorationTarget::Layer(layer) => markers.markers_in_layer(layer).collect(),
    }
}

fn screen_range(oracle: &dyn LayoutOracle, marker: &Marker) -> Range {
    Range::new(
        oracle.screen_position_for_buffer_position(marker.range.start),
        oracle.screen_position_for_buffer_position(marker.range.end),
    )
}

/// Rows a line-style decoration applies to, honoring its options, clipped
/// to the window.
fn apply_line_classes(
    classes: &mut BTreeMap<usize, Vec<String>>,
    marker: &Marker,
    screen: Range,
    head: Point,
    options: LineStyleOptions,
    window: &RowRange<usize>,
    class: Option<&str>,
) {
    let Some(class) = class else {
        return;
    };
    if options.only_empty && !marker.is_empty() {
        return;
    }
    if options.only_non_empty && marker.is_empty() {
        return;
    }
    let (first, mut last) = if options.only_head {
        (head.row, head.row)
    } else {
        (screen.start.row, screen.end.row)
    };
    if options.omit_empty_last_row
        && !options.only_head
        && !marker.is_empty()
        && screen.end.column == 0
        && screen.end.row > screen.start.row
    {
        last = screen.end.row - 1;
    }
    for row in first..=last {
        if !window.contains(&row) {
            continue;
        }
        let entry = classes.entry(row).or_default();
        if !entry.iter().any(|c| c == class) {
            entry.push(class.to_string());
        }
    }
}

/// Split a non-empty screen range into per-tile regions. Within one tile the
/// intersection produces one region when it fits on a single row, otherwise
/// a region for the first row, one spanning block for any interior rows, and
/// a region for the last row.
fn highlight_regions(screen: Range, tile_rows: &[RowRange<usize>]) -> Vec<RegionSpec> {
    let mut regions = Vec::new();
    for tile in tile_rows {
        if tile.is_empty() {
            continue;
        }
        let first = screen.start.row.max(tile.start);
        let last = screen.end.row.min(tile.end - 1);
        if first > last {
            continue;
        }
        // Column bounds apply only on the rows where the range starts/ends;
        // a continuation into or out of the tile reaches the text edge.
        let start_column = (first == screen.start.row).then_some(screen.start.column);
        let end_column = (last == screen.end.row).then_some(screen.end.column);
        // A multi-row range ending at column 0 paints nothing on its last
        // row, regardless of which tile that row landed in.
        let trailing_empty = end_column == Some(0) && screen.end.row > screen.start.row;
        if trailing_empty && last == first {
            // This tile holds only the unpainted trailing row.
            continue;
        }
        let last_painted = if trailing_empty { last - 1 } else { last };

        if first == last_painted {
            regions.push(RegionSpec {
                start_row: first,
                end_row: first,
                start_column,
                end_column: if trailing_empty { None } else { end_column },
            });
            continue;
        }
        regions.push(RegionSpec {
            start_row: first,
            end_row: first,
            start_column,
            end_column: None,
        });
        if last_painted - first > 1 {
            regions.push(RegionSpec {
                start_row: first + 1,
                end_row: last_painted - 1,
                start_column: None,
                end_column: None,
            });
        }
        regions.push(RegionSpec {
            start_row: last_painted,
            end_row: last_painted,
            start_column: None,
            end_column: if trailing_empty { None } else { end_column },
        });
    }
    regions
}

fn collect_text_intervals(
    intervals: &mut BTreeMap<usize, Vec<TextInterval>>,
    oracle: &dyn LayoutOracle,
    screen: Range,
    window: &RowRange<usize>,
    class: &str,
) {
    for row in screen.start.row..=screen.end.row {
        if !window.contains(&row) {
            continue;
        }
        let Some(line) = oracle.screen_line(row) else {
            continue;
        };
        let start_column = if row == screen.start.row {
            screen.start.column
        } else {
            0
        };
        let end_column = if row == screen.end.row {
            screen.end.column.min(line.len())
        } else {
            line.len()
        };
        if start_column >= end_column {
            continue;
        }
        intervals.entry(row).or_default().push(TextInterval {
            start_column,
            end_column,
            class: class.to_string(),
        });
    }
}

/// Boundary sweep merging token spans with text-decoration intervals into a
/// single tiling of the row. Never emits zero-length spans.
fn sweep_spans(line: &core_model::ScreenLine, intervals: &[TextInterval]) -> Vec<SpanSpec> {
    let len = line.len();
    if len == 0 {
        return Vec::new();
    }
    let mut boundaries = vec![0, len];
    let mut offset = 0;
    for token in &line.token_spans {
        offset += token.length;
        if offset < len {
            boundaries.push(offset);
        }
    }
    for interval in intervals {
        boundaries.push(interval.start_column.min(len));
        boundaries.push(interval.end_column.min(len));
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut spans = Vec::with_capacity(boundaries.len() - 1);
    for pair in boundaries.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if start == end {
            continue;
        }
        let mut classes = Vec::new();
        if let Some(token_class) = token_class_at(line, start) {
            classes.push(token_class.to_string());
        }
        for interval in intervals {
            if interval.start_column <= start && end <= interval.end_column {
                if !classes.iter().any(|c| c == &interval.class) {
                    classes.push(interval.class.clone());
                }
            }
        }
        spans.push(SpanSpec {
            length: end - start,
            classes,
        });
    }
    spans
}

fn token_class_at(line: &core_model::ScreenLine, column: usize) -> Option<&str> {
    let mut offset = 0;
    for token in &line.token_spans {
        if column < offset + token.length {
            return token.class.as_deref();
        }
        offset += token.length;
    }
    None
}
