//! Selection gestures: click, double/triple click, shift extension, drag.
//!
//! Selections live in screen coordinates (the same space the pointer maps
//! into). Each selection remembers the unit its initiating gesture selected
//! (the anchor): a caret for single clicks, a word for double clicks, a
//! line for triple clicks. Extension (shift-click or drag) always covers
//! the union of the anchor and the unit under the pointer, reorienting the
//! selection when the pointer crosses the anchor. Overlapping selections
//! merge when the gesture ends, never mid-drag.

use core_geometry::{Point, Range};
use core_model::LayoutOracle;
use core_render::{AutoscrollOptions, FrameContext, RenderSurface};
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use crate::pointer::{screen_position_for_event, PointerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Character,
    Word,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub range: Range,
    /// Head at `range.start` when reversed.
    pub reversed: bool,
    pub mode: SelectionMode,
    /// The unit selected by the initiating gesture; extension never shrinks
    /// below it.
    anchor: Range,
}

impl Selection {
    pub fn caret(position: Point) -> Self {
        Self {
            range: Range::point(position),
            reversed: false,
            mode: SelectionMode::Character,
            anchor: Range::point(position),
        }
    }

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

    /// Extend toward `position` in this selection's mode.
    fn extend_to(&mut self, oracle: &dyn LayoutOracle, position: Point) {
        match self.mode {
            SelectionMode::Character => {
                self.reversed = position < self.anchor.start;
                self.range = Range::new(self.anchor.start, position);
            }
            SelectionMode::Word => {
                let unit = word_range_at(oracle, position);
                self.reversed = unit.start < self.anchor.start;
                self.range = self.anchor.union(&unit);
            }
            SelectionMode::Line => {
                let unit = line_range_at(oracle, position.row);
                self.reversed = unit.start < self.anchor.start;
                self.range = self.anchor.union(&unit);
            }
        }
    }
}

/// The word (or run of whitespace/punctuation) containing `position`.
pub fn word_range_at(oracle: &dyn LayoutOracle, position: Point) -> Range {
    let Some(line) = oracle.screen_line(position.row) else {
        return Range::point(position);
    };
    let mut column = 0usize;
    for word in line.text.split_word_bounds() {
        let length = word.chars().count();
        if position.column < column + length {
            return Range::new(
                Point::new(position.row, column),
                Point::new(position.row, column + length),
            );
        }
        column += length;
    }
    // Past the end of the line: an empty range at EOL.
    Range::point(Point::new(position.row, column))
}

/// The full screen row, including its trailing newline position when a next
/// row exists.
pub fn line_range_at(oracle: &dyn LayoutOracle, row: usize) -> Range {
    let start = Point::new(row, 0);
    if row + 1 < oracle.screen_line_count() {
        return Range::new(start, Point::new(row + 1, 0));
    }
    let end_column = oracle.screen_line(row).map(|l| l.len()).unwrap_or(0);
    Range::new(start, Point::new(row, end_column))
}

/// Pointer-driven selection state machine for one surface.
#[derive(Debug)]
pub struct GestureHandler {
    selections: Vec<Selection>,
    dragging: bool,
}

impl Default for GestureHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureHandler {
    pub fn new() -> Self {
        Self {
            selections: vec![Selection::caret(Point::zero())],
            dragging: false,
        }
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// The most recently created or extended selection.
    pub fn last_selection(&self) -> &Selection {
        self.selections.last().expect("at least one selection")
    }

    pub fn pointer_pressed(
        &mut self,
        surface: &mut RenderSurface,
        event: &PointerEvent,
        ctx: &FrameContext<'_>,
    ) {
        let Some(position) = screen_position_for_event(surface, event, ctx) else {
            return;
        };
        let add = event.modifiers.adds_caret(surface.platform());

        if event.modifiers.shift && !add {
            // Extension keeps the last selection's mode and anchor.
            if let Some(selection) = self.selections.last_mut() {
                selection.extend_to(ctx.oracle, position);
            }
            self.dragging = true;
            return;
        }

        let selection = match click_mode(event.click_count) {
            SelectionMode::Character => Selection::caret(position),
            SelectionMode::Word => {
                let anchor = word_range_at(ctx.oracle, position);
                Selection {
                    range: anchor,
                    reversed: false,
                    mode: SelectionMode::Word,
                    anchor,
                }
            }
            SelectionMode::Line => {
                let anchor = line_range_at(ctx.oracle, position.row);
                Selection {
                    range: anchor,
                    reversed: false,
                    mode: SelectionMode::Line,
                    anchor,
                }
            }
        };

        if add {
            // Clicking inside an existing selection removes it instead,
            // unless it is the only one left.
            if let Some(index) = self
                .selections
                .iter()
                .position(|s| !s.is_empty() && s.range.contains_inclusive(position))
            {
                if self.selections.len() > 1 {
                    self.selections.remove(index);
                }
                self.dragging = false;
                return;
            }
            self.selections.push(selection);
        } else {
            self.selections = vec![selection];
        }
        self.dragging = true;
        trace!(?position, count = event.click_count, "pointer pressed");
    }

    pub fn pointer_dragged(
        &mut self,
        surface: &mut RenderSurface,
        event: &PointerEvent,
        ctx: &FrameContext<'_>,
    ) {
        if !self.dragging {
            return;
        }
        let Some(position) = screen_position_for_event(surface, event, ctx) else {
            return;
        };
        if let Some(selection) = self.selections.last_mut() {
            selection.extend_to(ctx.oracle, position);
            // Keep the head in view while dragging past the edges; the
            // controller clamps the result to the scroll bounds.
            surface.request_autoscroll(
                Range::point(selection.head()),
                AutoscrollOptions::default(),
                ctx,
            );
        }
    }

    /// End the gesture and merge selections that came to overlap during it.
    pub fn pointer_released(&mut self) {
        self.dragging = false;
        self.merge_intersecting();
    }

    fn merge_intersecting(&mut self) {
        self.selections.sort_by_key(|s| (s.range.start, s.range.end));
        let mut merged: Vec<Selection> = Vec::with_capacity(self.selections.len());
        for selection in self.selections.drain(..) {
            match merged.last_mut() {
                Some(last) if touches(&last.range, &selection.range) => {
                    last.range = last.range.union(&selection.range);
                    last.anchor = last.anchor.union(&selection.anchor);
                }
                _ => merged.push(selection),
            }
        }
        self.selections = merged;
    }
}

/// Whether two normalized ranges overlap, or touch with at least one caret.
fn touches(a: &Range, b: &Range) -> bool {
    if a.intersects(b) {
        return true;
    }
    (a.is_empty() || b.is_empty()) && (a.contains_inclusive(b.start) || b.contains_inclusive(a.start))
}

fn click_mode(click_count: u8) -> SelectionMode {
    match (click_count.max(1) - 1) % 3 {
        0 => SelectionMode::Character,
        1 => SelectionMode::Word,
        _ => SelectionMode::Line,
    }
}
