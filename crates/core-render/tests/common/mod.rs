//! Shared harness for render surface integration tests.
#![allow(dead_code)]

use core_config::{Config, PlatformTraits};
use core_geometry::{FontMetrics, MetricsSource, Point, Range};
use core_marker::{InvalidationPolicy, LayerId, MarkerId, MarkerSet};
use core_model::fixture::TestLayout;
use core_render::{FrameContext, MapMeasurer, RenderSurface};

pub const LINE_HEIGHT: f64 = 10.0;
pub const CHAR_WIDTH: f64 = 8.0;

pub struct FixedMetrics;

impl MetricsSource for FixedMetrics {
    fn font_metrics(&self) -> FontMetrics {
        FontMetrics {
            line_height_px: LINE_HEIGHT,
            default_char_width_px: CHAR_WIDTH,
            double_width_char_width_px: 2.0 * CHAR_WIDTH,
            half_width_char_width_px: CHAR_WIDTH / 2.0,
        }
    }
}

/// External state a flush borrows: layout, markers, and measurement hooks.
/// Kept apart from the surface so tests can hold a `FrameContext` while
/// calling `&mut` surface methods.
pub struct World {
    pub oracle: TestLayout,
    pub markers: MarkerSet,
    pub layer: LayerId,
    pub metrics: FixedMetrics,
    pub measurer: MapMeasurer,
}

impl World {
    pub fn new(rows: usize) -> Self {
        let mut markers = MarkerSet::new();
        let layer = markers.add_layer();
        Self {
            oracle: TestLayout::with_numbered_lines(rows),
            markers,
            layer,
            metrics: FixedMetrics,
            measurer: MapMeasurer::new(),
        }
    }

    pub fn ctx(&self) -> FrameContext<'_> {
        FrameContext {
            oracle: &self.oracle,
            markers: &self.markers,
            metrics_source: Some(&self.metrics),
            measurer: &self.measurer,
        }
    }

    pub fn marker(&mut self, range: Range) -> MarkerId {
        self.markers
            .create_marker(self.layer, range, false, InvalidationPolicy::Never)
    }
}

pub fn surface(rows_per_tile: usize) -> RenderSurface {
    init_tracing();
    let mut config = Config::default();
    config.file.render.rows_per_tile = rows_per_tile;
    RenderSurface::new(config, PlatformTraits::linux())
}

/// Route trace output through the test harness when `RUST_LOG` asks for it.
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn range(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Range {
    Range::new(Point::new(start_row, start_col), Point::new(end_row, end_col))
}
