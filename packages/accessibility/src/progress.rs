//! Progress reporting for long-running grid computations.
//!
//! The engine reports through [`ProgressCallback`] so callers can plug in
//! `indicatif` bars, log-only reporting, or nothing at all. Rows complete
//! on rayon worker threads, so implementations must be `Send + Sync`.

use std::sync::Arc;

/// Receives progress of grid computations.
///
/// Units are distance-matrix rows or population cells (one per grid cell),
/// or categories when driving a batch. `inc` is called from rayon workers
/// as each cell completes.
pub trait ProgressCallback: Send + Sync {
    /// Number of grid cells (or categories) expected.
    fn set_total(&self, total: u64);

    /// Set the current position (absolute, not delta).
    fn set_position(&self, pos: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Current stage or category name.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);

    /// Mark progress as complete and remove the progress indicator.
    fn finish_and_clear(&self);
}

/// Discards progress; used by tests and library callers without a terminal.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// A [`NullProgress`] behind the shared callback type.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
