//! Scroll position and autoscroll geometry.
//!
//! The controller holds the scroll position in two forms: pixels and a
//! logical projection (fractional rows/columns of the base metrics). While
//! detached (no font metrics available) only the logical form is
//! authoritative and pixel setters are refused; the first `attach` computes
//! the pixel form from the logical form exactly once. Attached, the two
//! forms are kept consistent: setting either recomputes the other, and a
//! metrics change re-derives pixels from the logical form so the same
//! content stays in view.
//!
//! All mutations clamp into `[0, max]`. Max values are pushed in by the
//! surface whenever content size, metrics, or viewport size change.

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
struct AttachedMetrics {
    line_height_px: f64,
    base_char_width_px: f64,
}

#[derive(Debug, Default)]
pub struct ScrollController {
    attached: Option<AttachedMetrics>,
    top_px: f64,
    left_px: f64,
    /// Logical projection; authoritative while detached.
    top_row: f64,
    left_column: f64,
    max_top_px: f64,
    max_left_px: f64,
}

impl ScrollController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Provide (or update) metrics. Pixel form is re-derived from the
    /// logical form so a font-size change keeps the same rows in view.
    pub fn attach(&mut self, line_height_px: f64, base_char_width_px: f64) {
        assert!(line_height_px > 0.0, "line height must be positive");
        assert!(base_char_width_px > 0.0, "char width must be positive");
        let metrics = AttachedMetrics {
            line_height_px,
            base_char_width_px,
        };
        if self.attached == Some(metrics) {
            return;
        }
        self.attached = Some(metrics);
        self.top_px = (self.top_row * line_height_px).clamp(0.0, self.max_top_px);
        self.left_px = (self.left_column * base_char_width_px).clamp(0.0, self.max_left_px);
        self.sync_logical();
        trace!(top_px = self.top_px, left_px = self.left_px, "scroll attached");
    }

    pub fn detach(&mut self) {
        self.attached = None;
    }

    /// Update scroll bounds and re-clamp. Returns true when clamping moved
    /// the position.
    pub fn set_max_scroll(&mut self, max_top_px: f64, max_left_px: f64) -> bool {
        assert!(max_top_px >= 0.0 && max_left_px >= 0.0, "negative scroll bound");
        self.max_top_px = max_top_px;
        self.max_left_px = max_left_px;
        let clamped_top = self.top_px.clamp(0.0, max_top_px);
        let clamped_left = self.left_px.clamp(0.0, max_left_px);
        let changed = clamped_top != self.top_px || clamped_left != self.left_px;
        self.top_px = clamped_top;
        self.left_px = clamped_left;
        if changed {
            self.sync_logical();
        }
        changed
    }

    pub fn max_top_px(&self) -> f64 {
        self.max_top_px
    }

    pub fn max_left_px(&self) -> f64 {
        self.max_left_px
    }

    pub fn top_px(&self) -> f64 {
        self.top_px
    }

    pub fn left_px(&self) -> f64 {
        self.left_px
    }

    pub fn top_row(&self) -> f64 {
        self.top_row
    }

    pub fn left_column(&self) -> f64 {
        self.left_column
    }

    /// Pixel setter. Refused (returns false) while detached.
    pub fn set_top_px(&mut self, px: f64) -> bool {
        if self.attached.is_none() {
            return false;
        }
        let clamped = px.clamp(0.0, self.max_top_px);
        if clamped == self.top_px {
            return false;
        }
        self.top_px = clamped;
        self.sync_logical();
        true
    }

    /// Pixel setter. Refused (returns false) while detached.
    pub fn set_left_px(&mut self, px: f64) -> bool {
        if self.attached.is_none() {
            return false;
        }
        let clamped = px.clamp(0.0, self.max_left_px);
        if clamped == self.left_px {
            return false;
        }
        self.left_px = clamped;
        self.sync_logical();
        true
    }

    /// Logical setter; works detached (pixel form materializes on attach).
    pub fn set_top_row(&mut self, row: f64) -> bool {
        let row = row.max(0.0);
        match self.attached {
            Some(m) => self.set_top_px(row * m.line_height_px),
            None => {
                let changed = row != self.top_row;
                self.top_row = row;
                changed
            }
        }
    }

    /// Logical setter; works detached.
    pub fn set_left_column(&mut self, column: f64) -> bool {
        let column = column.max(0.0);
        match self.attached {
            Some(m) => self.set_left_px(column * m.base_char_width_px),
            None => {
                let changed = column != self.left_column;
                self.left_column = column;
                changed
            }
        }
    }

    /// Apply a wheel event. Deltas are scaled by `sensitivity`; when
    /// `shift` is held and the platform does not already swap axes at the
    /// OS level, deltaX/deltaY are exchanged.
    pub fn wheel(
        &mut self,
        delta_x: f64,
        delta_y: f64,
        shift: bool,
        sensitivity: f64,
        platform_swaps_on_shift: bool,
    ) -> bool {
        let (dx, dy) = if shift && platform_swaps_on_shift {
            (delta_y, delta_x)
        } else {
            (delta_x, delta_y)
        };
        let moved_v = self.set_top_px(self.top_px + dy * sensitivity);
        let moved_h = self.set_left_px(self.left_px + dx * sensitivity);
        moved_v || moved_h
    }

    /// Minimal vertical adjustment bringing `[target_top, target_bottom]`
    /// within `margin_px` of both edges. The effective margin is clamped to
    /// half the viewport so opposing margins never overlap. With `center`,
    /// the target midpoint is centered instead. When the target is taller
    /// than the viewport, the priority endpoint (start, or end when
    /// `reversed`) wins.
    pub fn autoscroll_vertically(
        &mut self,
        target_top: f64,
        target_bottom: f64,
        margin_px: f64,
        client_height_px: f64,
        reversed: bool,
        center: bool,
    ) -> bool {
        if self.attached.is_none() || client_height_px <= 0.0 {
            return false;
        }
        if center {
            let midpoint = (target_top + target_bottom) / 2.0;
            return self.set_top_px(midpoint - client_height_px / 2.0);
        }
        let margin = margin_px.min(client_height_px / 2.0).max(0.0);
        let desired_top = target_top - margin;
        let desired_bottom = target_bottom + margin;
        let mut top = self.top_px;
        // Priority endpoint applied last so it wins for oversized targets.
        if reversed {
            if desired_bottom > top + client_height_px {
                top = desired_bottom - client_height_px;
            }
            if desired_top < top {
                top = desired_top;
            }
        } else {
            if desired_top < top {
                top = desired_top;
            }
            if desired_bottom > top + client_height_px {
                top = desired_bottom - client_height_px;
            }
        }
        self.set_top_px(top)
    }

    /// Horizontal analogue of `autoscroll_vertically`; margins arrive in
    /// pixels (the surface converts base-character-width units).
    pub fn autoscroll_horizontally(
        &mut self,
        target_left: f64,
        target_right: f64,
        margin_px: f64,
        client_width_px: f64,
        reversed: bool,
    ) -> bool {
        if self.attached.is_none() || client_width_px <= 0.0 {
            return false;
        }
        let margin = margin_px.min(client_width_px / 2.0).max(0.0);
        let desired_left = target_left - margin;
        let desired_right = target_right + margin;
        let mut left = self.left_px;
        if reversed {
            if desired_right > left + client_width_px {
                left = desired_right - client_width_px;
            }
            if desired_left < left {
                left = desired_left;
            }
        } else {
            if desired_left < left {
                left = desired_left;
            }
            if desired_right > left + client_width_px {
                left = desired_right - client_width_px;
            }
        }
        self.set_left_px(left)
    }

    fn sync_logical(&mut self) {
        if let Some(m) = self.attached {
            self.top_row = self.top_px / m.line_height_px;
            self.left_column = self.left_px / m.base_char_width_px;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached() -> ScrollController {
        let mut s = ScrollController::new();
        s.attach(10.0, 8.0);
        let _ = s.set_max_scroll(1000.0, 500.0);
        s
    }

    #[test]
    fn detached_holds_logical_until_attach() {
        let mut s = ScrollController::new();
        assert!(!s.set_top_px(50.0), "pixel setter refused while detached");
        assert!(s.set_top_row(12.5));
        assert_eq!(s.top_row(), 12.5);
        assert_eq!(s.top_px(), 0.0);

        let _ = s.set_max_scroll(1000.0, 0.0);
        s.attach(10.0, 8.0);
        assert_eq!(s.top_px(), 125.0);
        assert_eq!(s.top_row(), 12.5);
    }

    #[test]
    fn forms_stay_consistent_after_attach() {
        let mut s = attached();
        assert!(s.set_top_px(35.0));
        assert_eq!(s.top_row(), 3.5);
        assert!(s.set_top_row(7.0));
        assert_eq!(s.top_px(), 70.0);
    }

    #[test]
    fn metrics_change_preserves_logical_position() {
        let mut s = attached();
        let _ = s.set_top_px(100.0); // row 10
        s.attach(20.0, 8.0);
        assert_eq!(s.top_row(), 10.0);
        assert_eq!(s.top_px(), 200.0);
    }

    #[test]
    fn mutations_clamp_to_bounds() {
        let mut s = attached();
        assert!(s.set_top_px(5000.0));
        assert_eq!(s.top_px(), 1000.0);
        assert!(s.set_top_px(-20.0));
        assert_eq!(s.top_px(), 0.0);

        let _ = s.set_top_px(900.0);
        assert!(s.set_max_scroll(300.0, 500.0), "shrinking bounds re-clamps");
        assert_eq!(s.top_px(), 300.0);
    }

    #[test]
    fn wheel_scales_and_swaps_axes() {
        let mut s = attached();
        assert!(s.wheel(0.0, 100.0, false, 0.5, true));
        assert_eq!(s.top_px(), 50.0);
        assert_eq!(s.left_px(), 0.0);

        // Shift swaps on platforms that do not swap natively.
        assert!(s.wheel(0.0, 100.0, true, 0.5, true));
        assert_eq!(s.left_px(), 50.0);
        assert_eq!(s.top_px(), 50.0);

        // Platforms that swap natively receive pre-swapped deltas.
        assert!(s.wheel(60.0, 0.0, true, 0.5, false));
        assert_eq!(s.left_px(), 80.0);
    }

    #[test]
    fn autoscroll_is_minimal_and_idempotent() {
        let mut s = attached();
        // Viewport 100px tall at top; target rows near 300px.
        let moved = s.autoscroll_vertically(300.0, 310.0, 20.0, 100.0, false, false);
        assert!(moved);
        // Bottom correction: top = 310 + 20 - 100.
        assert_eq!(s.top_px(), 230.0);
        let moved_again = s.autoscroll_vertically(300.0, 310.0, 20.0, 100.0, false, false);
        assert!(!moved_again, "second call must not move");
        assert_eq!(s.top_px(), 230.0);
    }

    #[test]
    fn autoscroll_margin_clamps_to_half_viewport() {
        let mut s = attached();
        // Margin 80 on a 100px viewport behaves as 50.
        let _ = s.autoscroll_vertically(200.0, 210.0, 80.0, 100.0, false, false);
        assert_eq!(s.top_px(), 210.0 + 50.0 - 100.0);
    }

    #[test]
    fn autoscroll_center_centers_midpoint() {
        let mut s = attached();
        let _ = s.autoscroll_vertically(300.0, 320.0, 20.0, 100.0, false, true);
        assert_eq!(s.top_px(), 310.0 - 50.0);
    }

    #[test]
    fn oversized_target_prefers_priority_endpoint() {
        let mut s = attached();
        // Target spans 400..700 in a 100px viewport.
        let _ = s.autoscroll_vertically(400.0, 700.0, 0.0, 100.0, false, false);
        assert_eq!(s.top_px(), 600.0, "end visible for forward selection");
        let _ = s.autoscroll_vertically(400.0, 700.0, 0.0, 100.0, true, false);
        assert_eq!(s.top_px(), 400.0, "start visible for reversed selection");
    }
}
