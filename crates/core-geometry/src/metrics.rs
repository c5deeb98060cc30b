//! Measurement store: cached font metrics and container dimensions.
//!
//! The store is the single source of truth for pixel arithmetic. It holds
//! whatever the host last measured and two bits of lifecycle state:
//! * detached: no metrics at all (surface not in a live layout context);
//! * stale: metrics exist but a style change invalidated them wholesale.
//!
//! Refreshing is the caller's job: the render surface consults its
//! `MetricsSource` when it observes `needs_refresh()` and feeds the result
//! back with `refresh`. The store itself never reaches out, which keeps it
//! trivially testable and free of trait objects.

/// Font-derived measurements, captured together so one style change
/// invalidates them as a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub line_height_px: f64,
    pub default_char_width_px: f64,
    pub double_width_char_width_px: f64,
    pub half_width_char_width_px: f64,
}

/// Host-side measurement provider. Consulted during flush when the store is
/// stale or newly attached; implementations measure against the live font.
pub trait MetricsSource {
    fn font_metrics(&self) -> FontMetrics;
}

/// Cache of font metrics plus client (scroll container) dimensions and the
/// current gutter width.
#[derive(Debug, Clone, Default)]
pub struct MeasurementStore {
    metrics: Option<FontMetrics>,
    stale: bool,
    client_width_px: f64,
    client_height_px: f64,
    gutter_width_px: f64,
}

impl MeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current metrics, or `None` while detached or stale. Callers that can
    /// tolerate staleness (e.g. best-effort queries between flushes) may use
    /// `metrics_lossy` instead.
    pub fn metrics(&self) -> Option<&FontMetrics> {
        if self.stale {
            return None;
        }
        self.metrics.as_ref()
    }

    /// Last known metrics even if stale. Never invents values.
    pub fn metrics_lossy(&self) -> Option<&FontMetrics> {
        self.metrics.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.metrics.is_some()
    }

    /// True when the next flush should re-measure against the source.
    pub fn needs_refresh(&self) -> bool {
        self.stale || self.metrics.is_none()
    }

    /// Wholesale invalidation on font/style change. Cached values are kept
    /// for lossy reads until the next `refresh`.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Install freshly measured metrics. Clears staleness and attaches.
    pub fn refresh(&mut self, metrics: FontMetrics) {
        self.metrics = Some(metrics);
        self.stale = false;
    }

    /// Drop metrics entirely (surface removed from the layout context).
    pub fn detach(&mut self) {
        self.metrics = None;
        self.stale = false;
    }

    pub fn set_client_size(&mut self, width_px: f64, height_px: f64) {
        self.client_width_px = width_px;
        self.client_height_px = height_px;
    }

    pub fn client_width_px(&self) -> f64 {
        self.client_width_px
    }

    pub fn client_height_px(&self) -> f64 {
        self.client_height_px
    }

    pub fn set_gutter_width_px(&mut self, width_px: f64) {
        self.gutter_width_px = width_px;
    }

    pub fn gutter_width_px(&self) -> f64 {
        self.gutter_width_px
    }

    /// Width available to text (client width minus gutter).
    pub fn text_width_px(&self) -> f64 {
        (self.client_width_px - self.gutter_width_px).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> FontMetrics {
        FontMetrics {
            line_height_px: 12.0,
            default_char_width_px: 7.0,
            double_width_char_width_px: 14.0,
            half_width_char_width_px: 4.0,
        }
    }

    #[test]
    fn detached_store_reports_nothing() {
        let store = MeasurementStore::new();
        assert!(!store.is_attached());
        assert!(store.metrics().is_none());
        assert!(store.needs_refresh());
    }

    #[test]
    fn invalidation_hides_metrics_until_refresh() {
        let mut store = MeasurementStore::new();
        store.refresh(metrics());
        assert!(store.metrics().is_some());

        store.invalidate();
        assert!(store.metrics().is_none(), "stale metrics must not be read");
        assert!(store.metrics_lossy().is_some(), "lossy read still allowed");
        assert!(store.needs_refresh());

        store.refresh(metrics());
        assert!(store.metrics().is_some());
        assert!(!store.needs_refresh());
    }

    #[test]
    fn text_width_subtracts_gutter() {
        let mut store = MeasurementStore::new();
        store.set_client_size(800.0, 600.0);
        store.set_gutter_width_px(48.0);
        assert_eq!(store.text_width_px(), 752.0);
    }
}
