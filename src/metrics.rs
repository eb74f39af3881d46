//! Counters and timings for a single render run.

use indexmap::IndexMap;
use std::time::Duration;

/// Metrics collected while gathering and rendering.
///
/// Owned by the caller and passed into each run, which resets it first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metrics {
    pub templates_gathered: usize,
    pub templates_processed: usize,
    pub errors: usize,
    pub gather_duration: Duration,
    pub total_render_duration: Duration,
    /// Render time of each template, keyed by template name, in render order.
    pub render_duration: IndexMap<String, Duration>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
