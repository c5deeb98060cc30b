//! Update scheduling: one coalesced flush per driver tick.
//!
//! Producers mark fine-grained dirty flags as state mutates; the flags
//! coalesce into a single pending flush. In batched mode the flush waits for
//! the external driver's tick (the animation-frame equivalent); synchronous
//! mode tells the surface to run the same flush inline after each mutation.
//!
//! Correction contract: measurement reads performed at the end of a flush
//! (block heights, overlay sizes, autoscroll against fresh geometry) may
//! require state changes. Those changes schedule exactly one follow-up
//! flush. A flush that *is* a correction may not schedule another: a
//! correction requiring its own correction indicates a reconciliation bug,
//! so the request is dropped and logged rather than looping.

use bitflags::bitflags;
use tracing::{debug, warn};

bitflags! {
    /// What changed since the last flush.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DirtyFlags: u32 {
        /// Screen content changed (edits, fold/wrap changes, block heights).
        const CONTENT = 1 << 0;
        /// Scroll position changed.
        const SCROLL = 1 << 1;
        /// Decorations or marker state changed.
        const DECORATIONS = 1 << 2;
        /// Font/style invalidation: re-measure before any pixel math.
        const STYLE = 1 << 3;
        /// Client dimensions changed.
        const RESIZE = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Flush on the next driver tick.
    #[default]
    Batched,
    /// Flush inline as soon as state is marked dirty.
    Synchronous,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerMetricsSnapshot {
    pub marks: u64,
    pub flushes: u64,
    pub corrections: u64,
    pub dropped_corrections: u64,
}

#[derive(Debug, Default)]
pub struct UpdateScheduler {
    mode: UpdateMode,
    dirty: DirtyFlags,
    /// Set while running a flush that was scheduled as a correction.
    in_correction: bool,
    correction_requested: bool,
    metrics: SchedulerMetricsSnapshot,
}

impl UpdateScheduler {
    pub fn new(mode: UpdateMode) -> Self {
        Self {
            mode,
            dirty: DirtyFlags::empty(),
            in_correction: false,
            correction_requested: false,
            metrics: SchedulerMetricsSnapshot::default(),
        }
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: UpdateMode) {
        self.mode = mode;
    }

    /// Record a mutation. Returns true when the caller should flush right
    /// now (synchronous mode only).
    #[must_use]
    pub fn mark(&mut self, flags: DirtyFlags) -> bool {
        self.metrics.marks += 1;
        self.dirty |= flags;
        self.mode == UpdateMode::Synchronous
    }

    pub fn needs_flush(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Take the coalesced dirty set at the start of a flush. Returns the
    /// flags plus whether this flush runs as a correction.
    pub fn begin_flush(&mut self) -> (DirtyFlags, bool) {
        let flags = self.dirty;
        self.dirty = DirtyFlags::empty();
        self.in_correction = self.correction_requested;
        self.correction_requested = false;
        self.metrics.flushes += 1;
        if self.in_correction {
            self.metrics.corrections += 1;
        }
        debug!(?flags, correction = self.in_correction, "begin flush");
        (flags, self.in_correction)
    }

    /// Request a follow-up flush from inside the measurement phase. Allowed
    /// once per ordinary flush; dropped (with a warning) during a
    /// correction flush.
    pub fn request_correction(&mut self, flags: DirtyFlags) -> bool {
        if self.in_correction {
            self.metrics.dropped_corrections += 1;
            warn!(?flags, "correction requested during correction flush; dropped");
            return false;
        }
        self.dirty |= flags;
        self.correction_requested = true;
        true
    }

    /// Mark the end of the running flush.
    pub fn end_flush(&mut self) {
        self.in_correction = false;
    }

    pub fn metrics(&self) -> SchedulerMetricsSnapshot {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_coalesce_into_one_flush() {
        let mut s = UpdateScheduler::new(UpdateMode::Batched);
        assert!(!s.mark(DirtyFlags::SCROLL));
        assert!(!s.mark(DirtyFlags::CONTENT));
        assert!(!s.mark(DirtyFlags::SCROLL));
        assert!(s.needs_flush());

        let (flags, correction) = s.begin_flush();
        assert_eq!(flags, DirtyFlags::SCROLL | DirtyFlags::CONTENT);
        assert!(!correction);
        s.end_flush();
        assert!(!s.needs_flush());
    }

    #[test]
    fn synchronous_mode_flushes_inline() {
        let mut s = UpdateScheduler::new(UpdateMode::Synchronous);
        assert!(s.mark(DirtyFlags::DECORATIONS));
    }

    #[test]
    fn default_scheduler_starts_clean() {
        let s = UpdateScheduler::default();
        assert_eq!(s.mode(), UpdateMode::Batched);
        assert_eq!(DirtyFlags::default(), DirtyFlags::empty());
        assert!(!s.needs_flush());
    }

    #[test]
    fn corrections_never_chain() {
        let mut s = UpdateScheduler::new(UpdateMode::Batched);
        let _ = s.mark(DirtyFlags::CONTENT);
        let (_, correction) = s.begin_flush();
        assert!(!correction);
        assert!(s.request_correction(DirtyFlags::SCROLL));
        s.end_flush();

        // The follow-up flush runs as a correction...
        let (flags, correction) = s.begin_flush();
        assert_eq!(flags, DirtyFlags::SCROLL);
        assert!(correction);
        // ...and may not schedule another.
        assert!(!s.request_correction(DirtyFlags::SCROLL));
        s.end_flush();
        assert!(!s.needs_flush());
        assert_eq!(s.metrics().dropped_corrections, 1);
    }
}
