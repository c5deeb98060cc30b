//! Pointer event mapping: viewport pixels to screen positions.
//!
//! Events arrive in viewport coordinates (origin at the surface's top-left
//! corner, gutter included). Mapping subtracts the gutter, adds the current
//! scroll offsets, and resolves through the surface's pixel conversion, so
//! the midpoint rule and block-decoration geometry apply to hit testing
//! exactly as they do to cursor placement.

use core_config::PlatformTraits;
use core_geometry::Point;
use core_render::{FrameContext, PixelPosition, RenderSurface};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Self::NONE
    };

    /// Whether this chord adds a caret instead of replacing the selection.
    /// The key differs by platform (cmd on macOS, ctrl elsewhere).
    pub fn adds_caret(&self, platform: PlatformTraits) -> bool {
        if platform.add_caret_with_meta {
            self.meta
        } else {
            self.ctrl
        }
    }
}

/// One pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub modifiers: Modifiers,
    /// 1 for single click, 2 for double, 3 for triple. Drag events reuse
    /// the count of the initiating press.
    pub click_count: u8,
}

/// Map an event to the screen position under the pointer, clamped into the
/// document. `None` while the surface has never been measured.
pub fn screen_position_for_event(
    surface: &RenderSurface,
    event: &PointerEvent,
    ctx: &FrameContext<'_>,
) -> Option<Point> {
    let content = PixelPosition {
        left: event.x - surface.gutter_width_px() + surface.scroll_left_px(),
        top: event.y + surface.scroll_top_px(),
    };
    let position = surface.screen_position_for_pixel_position(content, ctx)?;
    Some(ctx.oracle.clamp_screen_position(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_caret_key_follows_platform() {
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert!(ctrl.adds_caret(PlatformTraits::linux()));
        assert!(!meta.adds_caret(PlatformTraits::linux()));
        assert!(meta.adds_caret(PlatformTraits::macos()));
        assert!(!ctrl.adds_caret(PlatformTraits::macos()));
    }
}
