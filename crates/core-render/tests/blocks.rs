//! Block decorations: measurement corrections and non-uniform geometry.

mod common;

use common::{range, surface, World, LINE_HEIGHT};
use core_geometry::Point;
use core_marker::{BlockPosition, DecorationKind, DecorationProps};
use core_render::PixelPosition;

#[test]
fn measured_block_height_folds_into_geometry_via_one_correction() {
    let mut world = World::new(14);
    let mut s = surface(3);
    s.set_size(400.0, 12.0 * LINE_HEIGHT, &world.ctx());
    s.tick(&world.ctx());

    let marker = world.marker(range(4, 0, 4, 0));
    let block = s.decorate_marker(
        marker,
        DecorationKind::Block {
            position: BlockPosition::Before,
        },
        DecorationProps::default(),
        &world.ctx(),
    );
    world.measurer.set_block_height(block, 33.0);
    let flushes_before = s.scheduler().metrics().flushes;
    s.tick(&world.ctx());

    // The flush that discovered the new measurement scheduled exactly one
    // correction.
    let metrics = s.scheduler().metrics();
    assert_eq!(metrics.flushes - flushes_before, 2);
    assert_eq!(metrics.dropped_corrections, 0);

    // The tile owning row 4 absorbed the block; later tiles shifted down.
    let tiles = s.tree().tiles();
    assert_eq!(tiles[1].start_row, 3);
    assert_eq!(tiles[1].height_px, 3.0 * LINE_HEIGHT + 33.0);
    assert_eq!(tiles[2].top_px, 6.0 * LINE_HEIGHT + 33.0);

    // Line 4 itself moved below the block; line 3 did not.
    let line3 = s.tree().line_for_row(3).unwrap().top_px + tiles[1].top_px;
    let line4 = s.tree().line_for_row(4).unwrap().top_px + tiles[1].top_px;
    assert_eq!(line3, 3.0 * LINE_HEIGHT);
    assert_eq!(line4, 4.0 * LINE_HEIGHT + 33.0);

    // The block view sits in the gap.
    let views: Vec<_> = tiles[1].blocks.iter().collect();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].top_px + tiles[1].top_px, 4.0 * LINE_HEIGHT);
    assert_eq!(views[0].height_px, 33.0);
}

#[test]
fn destroying_the_block_restores_uniform_geometry() {
    let mut world = World::new(14);
    let mut s = surface(3);
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    let marker = world.marker(range(4, 0, 4, 0));
    let block = s.decorate_marker(
        marker,
        DecorationKind::Block {
            position: BlockPosition::Before,
        },
        DecorationProps::default(),
        &world.ctx(),
    );
    world.measurer.set_block_height(block, 33.0);
    s.tick(&world.ctx());
    let shifted = s
        .pixel_position_for_screen_position(Point::new(5, 0), &world.ctx())
        .unwrap();
    assert_eq!(shifted.top, 5.0 * LINE_HEIGHT + 33.0);

    s.destroy_decoration(block, &world.ctx());
    s.tick(&world.ctx());
    let restored = s
        .pixel_position_for_screen_position(Point::new(5, 0), &world.ctx())
        .unwrap();
    assert_eq!(restored.top, 5.0 * LINE_HEIGHT);
}

#[test]
fn after_blocks_offset_only_rows_below_their_anchor() {
    let mut world = World::new(14);
    let mut s = surface(3);
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    let marker = world.marker(range(4, 0, 4, 0));
    let block = s.decorate_marker(
        marker,
        DecorationKind::Block {
            position: BlockPosition::After,
        },
        DecorationProps::default(),
        &world.ctx(),
    );
    world.measurer.set_block_height(block, 20.0);
    s.tick(&world.ctx());

    let row4 = s
        .pixel_position_for_screen_position(Point::new(4, 0), &world.ctx())
        .unwrap();
    let row5 = s
        .pixel_position_for_screen_position(Point::new(5, 0), &world.ctx())
        .unwrap();
    assert_eq!(row4.top, 4.0 * LINE_HEIGHT, "anchor row unmoved");
    assert_eq!(row5.top, 5.0 * LINE_HEIGHT + 20.0);
}

#[test]
fn pixels_inside_a_block_resolve_to_the_row_above() {
    let mut world = World::new(14);
    let mut s = surface(3);
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    let marker = world.marker(range(4, 0, 4, 0));
    let block = s.decorate_marker(
        marker,
        DecorationKind::Block {
            position: BlockPosition::Before,
        },
        DecorationProps::default(),
        &world.ctx(),
    );
    world.measurer.set_block_height(block, 33.0);
    s.tick(&world.ctx());

    // The block occupies [40, 73); a point inside it maps to row 3.
    let hit = s
        .screen_position_for_pixel_position(
            PixelPosition {
                left: 0.0,
                top: 4.0 * LINE_HEIGHT + 15.0,
            },
            &world.ctx(),
        )
        .unwrap();
    assert_eq!(hit.row, 3);
}

#[test]
fn off_window_blocks_are_excluded_until_scrolled_in() {
    let mut world = World::new(200);
    let mut s = surface(3);
    s.set_size(400.0, 9.0 * LINE_HEIGHT, &world.ctx());
    let marker = world.marker(range(100, 0, 100, 0));
    let block = s.decorate_marker(
        marker,
        DecorationKind::Block {
            position: BlockPosition::Before,
        },
        DecorationProps::default(),
        &world.ctx(),
    );
    world.measurer.set_block_height(block, 33.0);
    s.tick(&world.ctx());

    // Outside the rendered window the block contributes nothing, so the
    // first tile's top stays exact under uniform geometry.
    let early = s
        .pixel_position_for_screen_position(Point::new(50, 0), &world.ctx())
        .unwrap();
    assert_eq!(early.top, 50.0 * LINE_HEIGHT);

    s.set_scroll_top_px(100.0 * LINE_HEIGHT, &world.ctx());
    s.tick(&world.ctx());
    let row101 = s
        .pixel_position_for_screen_position(Point::new(101, 0), &world.ctx())
        .unwrap();
    assert_eq!(row101.top, 101.0 * LINE_HEIGHT + 33.0);
}
