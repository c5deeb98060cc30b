//! Autoscroll through the surface: margins, centering, idempotence.

mod common;

use common::{range, surface, World, CHAR_WIDTH, LINE_HEIGHT};
use core_render::AutoscrollOptions;

/// 100 rows, 9-row viewport, default margins (2 rows / 6 columns).
fn setup() -> (World, core_render::RenderSurface) {
    let world = World::new(100);
    let mut s = surface(3);
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    s.tick(&world.ctx());
    (world, s)
}

#[test]
fn autoscroll_applies_the_minimal_correction_and_is_idempotent() {
    let (world, mut s) = setup();
    s.request_autoscroll(
        range(50, 0, 50, 0),
        AutoscrollOptions::default(),
        &world.ctx(),
    );
    s.tick(&world.ctx());
    // Bottom edge: row 50 bottom (510) + 2-row margin - 90px viewport.
    assert_eq!(s.scroll_top_px(), 510.0 + 2.0 * LINE_HEIGHT - 90.0);

    let before = s.scroll_top_px();
    s.request_autoscroll(
        range(50, 0, 50, 0),
        AutoscrollOptions::default(),
        &world.ctx(),
    );
    s.tick(&world.ctx());
    assert_eq!(s.scroll_top_px(), before, "target already in view");
}

#[test]
fn autoscroll_upward_honors_the_top_margin() {
    let (world, mut s) = setup();
    s.set_scroll_top_px(500.0, &world.ctx());
    s.request_autoscroll(
        range(20, 0, 20, 0),
        AutoscrollOptions::default(),
        &world.ctx(),
    );
    s.tick(&world.ctx());
    assert_eq!(s.scroll_top_px(), 200.0 - 2.0 * LINE_HEIGHT);
}

#[test]
fn center_option_centers_the_target() {
    let (world, mut s) = setup();
    s.request_autoscroll(
        range(50, 0, 50, 0),
        AutoscrollOptions {
            center: true,
            ..AutoscrollOptions::default()
        },
        &world.ctx(),
    );
    s.tick(&world.ctx());
    // Row midpoint 505 centered in the 90px viewport.
    assert_eq!(s.scroll_top_px(), 505.0 - 45.0);
}

#[test]
fn oversized_target_keeps_the_priority_endpoint_visible() {
    let (world, mut s) = setup();
    s.request_autoscroll(
        range(40, 0, 70, 0),
        AutoscrollOptions::default(),
        &world.ctx(),
    );
    s.tick(&world.ctx());
    // Forward selection: the end wins.
    let end_bottom = 71.0 * LINE_HEIGHT;
    assert!(s.scroll_top_px() + 90.0 >= end_bottom);
    assert!(s.scroll_top_px() <= end_bottom);

    s.request_autoscroll(
        range(40, 0, 70, 0),
        AutoscrollOptions {
            reversed: true,
            ..AutoscrollOptions::default()
        },
        &world.ctx(),
    );
    s.tick(&world.ctx());
    let start_top = 40.0 * LINE_HEIGHT;
    assert!(s.scroll_top_px() <= start_top);
    assert!(s.scroll_top_px() + 90.0 > start_top);
}

#[test]
fn configured_margins_clamp_to_half_the_viewport() {
    let world = World::new(100);
    let mut config = core_config::Config::default();
    config.file.render.rows_per_tile = 3;
    config.file.scroll.margin.vertical = 100;
    let mut s = core_render::RenderSurface::new(config, core_config::PlatformTraits::linux());
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    s.tick(&world.ctx());

    s.request_autoscroll(
        range(50, 0, 50, 0),
        AutoscrollOptions::default(),
        &world.ctx(),
    );
    s.tick(&world.ctx());
    // Margin clamps to 4 rows (half of 9, rounded down), not 100.
    assert_eq!(s.scroll_top_px(), 510.0 + 4.0 * LINE_HEIGHT - 90.0);
}

#[test]
fn horizontal_autoscroll_follows_long_lines() {
    let mut world = World::new(100);
    world
        .oracle
        .set_line(10, "x".repeat(200));
    let mut s = surface(3);
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    s.tick(&world.ctx());
    assert_eq!(s.scroll_left_px(), 0.0);

    s.request_autoscroll(
        range(10, 150, 10, 150),
        AutoscrollOptions::default(),
        &world.ctx(),
    );
    s.tick(&world.ctx());
    let text_width = 400.0 - s.gutter_width_px();
    let expected = 150.0 * CHAR_WIDTH + 6.0 * CHAR_WIDTH - text_width;
    assert_eq!(s.scroll_left_px(), expected);

    // Scrolling back to column zero returns to the left edge.
    s.request_autoscroll(
        range(10, 0, 10, 0),
        AutoscrollOptions::default(),
        &world.ctx(),
    );
    s.tick(&world.ctx());
    assert_eq!(s.scroll_left_px(), 0.0);
}

#[test]
fn wheel_scrolling_uses_configured_sensitivity() {
    let world = World::new(100);
    let mut config = core_config::Config::default();
    config.file.render.rows_per_tile = 3;
    config.file.scroll.sensitivity = 0.5;
    let mut s = core_render::RenderSurface::new(config, core_config::PlatformTraits::linux());
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    s.tick(&world.ctx());

    assert!(s.handle_wheel(0.0, 100.0, false, &world.ctx()));
    s.tick(&world.ctx());
    assert_eq!(s.scroll_top_px(), 50.0);

    // Shift redirects the same gesture horizontally on this platform.
    let mut world_wide = World::new(100);
    world_wide.oracle.set_line(0, "y".repeat(200));
    s.notify_layout_changed(&world_wide.ctx());
    s.tick(&world_wide.ctx());
    assert!(s.handle_wheel(0.0, 100.0, true, &world_wide.ctx()));
    assert_eq!(s.scroll_left_px(), 50.0);
    assert_eq!(s.scroll_top_px(), 50.0);
}
