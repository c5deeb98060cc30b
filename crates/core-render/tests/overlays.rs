//! Overlay placement: default anchoring, vertical flip, and edge clamping.

mod common;

use common::{range, surface, World, CHAR_WIDTH, LINE_HEIGHT};
use core_marker::{DecorationKind, DecorationProps};

fn overlay_kind() -> DecorationKind {
    DecorationKind::Overlay {
        avoid_overflow: true,
    }
}

#[test]
fn overlay_renders_below_its_anchor_by_default() {
    let mut world = World::new(14);
    let mut s = surface(3);
    let marker = world.marker(range(2, 3, 2, 3));
    let overlay = s.decorate_marker(
        marker,
        overlay_kind(),
        DecorationProps::class("autocomplete"),
        &world.ctx(),
    );
    world.measurer.set_overlay_size(overlay, (50.0, 30.0));
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    s.tick(&world.ctx());

    let views = s.tree().overlays();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].left_px, 3.0 * CHAR_WIDTH);
    assert_eq!(views[0].top_px, 3.0 * LINE_HEIGHT);
    assert!(!views[0].flipped);
}

#[test]
fn overlay_flips_above_when_it_would_overflow_the_bottom() {
    let mut world = World::new(14);
    let mut s = surface(3);
    let marker = world.marker(range(7, 0, 7, 0));
    let overlay = s.decorate_marker(
        marker,
        overlay_kind(),
        DecorationProps::class("autocomplete"),
        &world.ctx(),
    );
    world.measurer.set_overlay_size(overlay, (50.0, 30.0));
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    s.tick(&world.ctx());

    let views = s.tree().overlays();
    assert_eq!(views.len(), 1);
    // Below the anchor it would span [80, 110) in a 90px viewport.
    assert_eq!(views[0].top_px, 7.0 * LINE_HEIGHT - 30.0);
    assert!(views[0].flipped);
}

#[test]
fn overlay_stays_inside_the_viewport_when_its_anchor_scrolls_out_left() {
    let mut world = World::new(14);
    world.oracle.set_line(1, "x".repeat(100));
    let mut s = surface(3);
    let marker = world.marker(range(1, 2, 1, 2));
    let overlay = s.decorate_marker(
        marker,
        overlay_kind(),
        DecorationProps::class("autocomplete"),
        &world.ctx(),
    );
    world.measurer.set_overlay_size(overlay, (50.0, 30.0));
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    s.tick(&world.ctx());
    assert_eq!(s.tree().overlays()[0].left_px, 2.0 * CHAR_WIDTH);

    // Scroll the anchor column out past the left edge; the overlay pins to
    // the viewport's left boundary instead of following it off screen.
    s.set_scroll_left_px(200.0, &world.ctx());
    s.tick(&world.ctx());
    let views = s.tree().overlays();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].left_px, 200.0);
}
