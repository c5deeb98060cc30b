//! Grapheme-cluster pixel measurement.
//!
//! Each grapheme cluster is classified once and billed one of the measured
//! character-class widths from `FontMetrics`. Classification is intentionally
//! coarse (default, half-width, double-width, combining), matching the
//! classes the host measures from its actual font. A cluster whose base is a
//! combining mark (a degenerate cluster with no base character) has zero
//! width and never receives its own column boundary.
//!
//! Midpoint rule (the documented tie-break for pixel→column mapping): a
//! query x resolves to the cluster's start column when x falls strictly left
//! of the cluster's horizontal midpoint, otherwise to the column immediately
//! after the cluster. Combining marks never split a cluster: a column that
//! addresses the interior of a multi-char cluster snaps to the cluster start
//! when converted to pixels.
//!
//! Invariants:
//! * `column_for_x(text, x_for_column(text, c)) == c` for every cluster
//!   boundary column `c`.
//! * Widths are non-negative; zero-width clusters contribute no columns to
//!   midpoint arithmetic.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use crate::metrics::FontMetrics;

/// Width class of a single grapheme cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Default,
    HalfWidth,
    DoubleWidth,
    /// Cluster consisting solely of combining marks (no base).
    Combining,
}

fn is_halfwidth_form(c: char) -> bool {
    // Halfwidth katakana and halfwidth hangul jamo forms.
    ('\u{FF61}'..='\u{FFDC}').contains(&c)
}

/// Classify a grapheme cluster by its base character.
pub fn cluster_class(egc: &str) -> CharClass {
    let Some(base) = egc.chars().next() else {
        return CharClass::Combining;
    };
    match base.width() {
        Some(0) | None => CharClass::Combining,
        Some(2) => CharClass::DoubleWidth,
        _ if is_halfwidth_form(base) => CharClass::HalfWidth,
        _ => CharClass::Default,
    }
}

/// Pixel width of one grapheme cluster under the given metrics.
pub fn cluster_width_px(egc: &str, metrics: &FontMetrics) -> f64 {
    match cluster_class(egc) {
        CharClass::Default => metrics.default_char_width_px,
        CharClass::HalfWidth => metrics.half_width_char_width_px,
        CharClass::DoubleWidth => metrics.double_width_char_width_px,
        CharClass::Combining => 0.0,
    }
}

/// Total pixel width of a line of text.
pub fn line_width_px(text: &str, metrics: &FontMetrics) -> f64 {
    text.graphemes(true)
        .map(|egc| cluster_width_px(egc, metrics))
        .sum()
}

/// Left pixel edge of `column` within `text`. Columns count characters;
/// columns interior to a cluster snap to the cluster's start. Columns past
/// the end of the line extend at the default character width, so cursor and
/// autoscroll geometry stay meaningful beyond EOL.
pub fn x_for_column(text: &str, column: usize, metrics: &FontMetrics) -> f64 {
    let mut x = 0.0;
    let mut col = 0usize;
    for egc in text.graphemes(true) {
        let chars = egc.chars().count();
        if col + chars > column {
            // Interior of a cluster: snap to its start.
            return x;
        }
        col += chars;
        x += cluster_width_px(egc, metrics);
        if col == column {
            return x;
        }
    }
    x + (column - col) as f64 * metrics.default_char_width_px
}

/// Inverse of `x_for_column` under the midpoint rule. Results clamp into
/// `[0, char count]`; an x past the end of the line lands on the last column.
pub fn column_for_x(text: &str, x: f64, metrics: &FontMetrics) -> usize {
    if x <= 0.0 {
        return 0;
    }
    let mut left = 0.0;
    let mut col = 0usize;
    for egc in text.graphemes(true) {
        let w = cluster_width_px(egc, metrics);
        let chars = egc.chars().count();
        if x < left + w / 2.0 {
            return col;
        }
        if x < left + w {
            return col + chars;
        }
        left += w;
        col += chars;
    }
    col
}
