//! The layout oracle trait: the seam between this rendering core and the
//! external wrap/fold engine.
//!
//! The oracle answers in screen space (post-wrap, post-fold) and translates
//! between buffer and screen coordinates. All row/column queries clamp to
//! the nearest valid position rather than failing; only `screen_line` is
//! optional, and only for rows past the end of the document.

use std::ops::Range as RowRange;
use std::sync::Arc;

use core_geometry::Point;

use crate::screen_line::ScreenLine;

pub trait LayoutOracle {
    /// Total number of screen rows in the current layout.
    fn screen_line_count(&self) -> usize;

    /// The screen line at `screen_row`, or `None` past the end.
    fn screen_line(&self, screen_row: usize) -> Option<Arc<ScreenLine>>;

    /// Ordered screen lines for a half-open row range. Rows past the end are
    /// simply absent from the result.
    fn screen_lines(&self, rows: RowRange<usize>) -> Vec<Arc<ScreenLine>> {
        rows.filter_map(|row| self.screen_line(row)).collect()
    }

    /// Translate a buffer position into screen space, clamping out-of-range
    /// input to the nearest valid position.
    fn screen_position_for_buffer_position(&self, position: Point) -> Point;

    /// Translate a screen position into buffer space, clamping out-of-range
    /// input to the nearest valid position.
    fn buffer_position_for_screen_position(&self, position: Point) -> Point;

    /// Whether `buffer_row` starts a collapsible region.
    fn is_foldable(&self, buffer_row: usize) -> bool;

    /// The last screen row displaying content from `buffer_row` (its final
    /// soft-wrap segment).
    fn last_screen_row_for_buffer_row(&self, buffer_row: usize) -> usize;

    /// Character length of the longest screen line; drives horizontal scroll
    /// bounds.
    fn longest_screen_line_length(&self) -> usize;

    /// Clamp a screen position onto an existing row and column.
    fn clamp_screen_position(&self, position: Point) -> Point {
        let count = self.screen_line_count();
        if count == 0 {
            return Point::zero();
        }
        let row = position.row.min(count - 1);
        let column = match self.screen_line(row) {
            Some(line) => position.column.min(line.len()),
            None => 0,
        };
        Point::new(row, column)
    }
}
