//! Deterministic in-memory layout oracle for tests.
//!
//! `TestLayout` wraps a plain `Vec<String>` document with an optional
//! character-based soft-wrap width. It is not a production layout engine
//! (wrapping splits at exact column boundaries with no word awareness), but
//! it exercises everything the renderer cares about: multi-segment rows,
//! stable identities, buffer↔screen translation, and foldability.

use std::ops::Range as RowRange;
use std::sync::Arc;

use core_geometry::Point;

use crate::oracle::LayoutOracle;
use crate::screen_line::ScreenLine;

#[derive(Debug, Clone)]
pub struct TestLayout {
    buffer_lines: Vec<String>,
    wrap_width: Option<usize>,
    screen_lines: Vec<Arc<ScreenLine>>,
    /// First screen row of each buffer row.
    first_screen_row: Vec<usize>,
}

impl TestLayout {
    pub fn new(buffer_lines: Vec<String>) -> Self {
        let mut layout = Self {
            buffer_lines,
            wrap_width: None,
            screen_lines: Vec::new(),
            first_screen_row: Vec::new(),
        };
        layout.rebuild();
        layout
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(str::to_string).collect())
    }

    /// A document of `count` rows labeled by index ("line 0", "line 1", ...).
    pub fn with_numbered_lines(count: usize) -> Self {
        Self::new((0..count).map(|i| format!("line {i}")).collect())
    }

    pub fn set_soft_wrap_width(&mut self, width: Option<usize>) {
        assert!(width != Some(0), "soft wrap width must be positive");
        self.wrap_width = width;
        self.rebuild();
    }

    /// Replace one buffer line (simulates an external edit).
    pub fn set_line(&mut self, buffer_row: usize, text: impl Into<String>) {
        self.buffer_lines[buffer_row] = text.into();
        self.rebuild();
    }

    pub fn buffer_line(&self, buffer_row: usize) -> Option<&str> {
        self.buffer_lines.get(buffer_row).map(String::as_str)
    }

    fn rebuild(&mut self) {
        self.screen_lines.clear();
        self.first_screen_row.clear();
        for (buffer_row, text) in self.buffer_lines.iter().enumerate() {
            self.first_screen_row.push(self.screen_lines.len());
            for (i, segment) in wrap_segments(text, self.wrap_width).into_iter().enumerate() {
                let screen_row = self.screen_lines.len();
                self.screen_lines.push(Arc::new(ScreenLine::new(
                    screen_row,
                    buffer_row,
                    segment,
                    i > 0,
                    Vec::new(),
                )));
            }
        }
    }

    fn segments_for_buffer_row(&self, buffer_row: usize) -> usize {
        let first = self.first_screen_row[buffer_row];
        let next = self
            .first_screen_row
            .get(buffer_row + 1)
            .copied()
            .unwrap_or(self.screen_lines.len());
        next - first
    }

    fn indent(&self, buffer_row: usize) -> usize {
        self.buffer_lines[buffer_row]
            .chars()
            .take_while(|c| c.is_whitespace())
            .count()
    }
}

fn wrap_segments(text: &str, wrap_width: Option<usize>) -> Vec<String> {
    let Some(width) = wrap_width else {
        return vec![text.to_string()];
    };
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= width {
        return vec![text.to_string()];
    }
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

impl LayoutOracle for TestLayout {
    fn screen_line_count(&self) -> usize {
        self.screen_lines.len()
    }

    fn screen_line(&self, screen_row: usize) -> Option<Arc<ScreenLine>> {
        self.screen_lines.get(screen_row).cloned()
    }

    fn screen_lines(&self, rows: RowRange<usize>) -> Vec<Arc<ScreenLine>> {
        let end = rows.end.min(self.screen_lines.len());
        let start = rows.start.min(end);
        self.screen_lines[start..end].to_vec()
    }

    fn screen_position_for_buffer_position(&self, position: Point) -> Point {
        if self.buffer_lines.is_empty() {
            return Point::zero();
        }
        let row = position.row.min(self.buffer_lines.len() - 1);
        let len = self.buffer_lines[row].chars().count();
        let column = position.column.min(len);
        let first = self.first_screen_row[row];
        match self.wrap_width {
            None => Point::new(first, column),
            Some(width) => {
                let last_segment = self.segments_for_buffer_row(row) - 1;
                let segment = (column / width).min(last_segment);
                Point::new(first + segment, column - segment * width)
            }
        }
    }

    fn buffer_position_for_screen_position(&self, position: Point) -> Point {
        if self.screen_lines.is_empty() {
            return Point::zero();
        }
        let clamped = self.clamp_screen_position(position);
        let line = &self.screen_lines[clamped.row];
        let segment = clamped.row - self.first_screen_row[line.buffer_row];
        let base = segment * self.wrap_width.unwrap_or(0);
        Point::new(line.buffer_row, base + clamped.column)
    }

    fn is_foldable(&self, buffer_row: usize) -> bool {
        let Some(next) = buffer_row.checked_add(1) else {
            return false;
        };
        if next >= self.buffer_lines.len() {
            return false;
        }
        if self.buffer_lines[next].trim().is_empty() {
            return false;
        }
        self.indent(next) > self.indent(buffer_row)
    }

    fn last_screen_row_for_buffer_row(&self, buffer_row: usize) -> usize {
        if self.buffer_lines.is_empty() {
            return 0;
        }
        let row = buffer_row.min(self.buffer_lines.len() - 1);
        self.first_screen_row[row] + self.segments_for_buffer_row(row) - 1
    }

    fn longest_screen_line_length(&self) -> usize {
        self.screen_lines
            .iter()
            .map(|line| line.len())
            .max()
            .unwrap_or(0)
    }
}
