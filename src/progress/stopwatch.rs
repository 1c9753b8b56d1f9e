//! Elapsed-time tracking for resource rows.
//!
//! Uses `tokio::time::Instant` so paused-clock tests can drive it.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopWatch {
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
}

impl StopWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing. No-op while running, and also once stopped:
    /// a stopped watch must be [`reset`](Self::reset) before it can run again.
    pub fn start(&mut self) {
        if self.started_at.is_some() {
            return;
        }
        self.started_at = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.stopped_at = Some(Instant::now());
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.stopped_at = None;
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.stopped_at.is_none()
    }

    pub fn elapsed(&self) -> Duration {
        match (self.started_at, self.stopped_at) {
            (Some(start), Some(stop)) => stop.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }
}
