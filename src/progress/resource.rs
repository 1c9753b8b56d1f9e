//! Renderer for a single stack resource.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use super::done::{DoneLatch, DoneSignal};
use super::stopwatch::StopWatch;
use super::style::{elapsed_cell, failure_text, status_cell};
use super::{DynamicRenderer, RenderOptions, Renderer};
use crate::stack::event::{StackEvent, StatusCode};
use crate::util::{single_line, wrap_chars};

/// Spaces between a row's padding and its failure reasons.
const REASON_INDENT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub status: StatusCode,
    pub reason: String,
}

/// Every status a resource has reported, oldest first. Always begins with a
/// `NotStarted` sentinel, so it is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusHistory {
    entries: Vec<StatusEntry>,
}

impl Default for StatusHistory {
    fn default() -> Self {
        Self {
            entries: vec![StatusEntry {
                status: StatusCode::NotStarted,
                reason: String::new(),
            }],
        }
    }
}

impl StatusHistory {
    pub fn latest(&self) -> &StatusEntry {
        // The sentinel is never removed.
        &self.entries[self.entries.len() - 1]
    }

    pub fn push(&mut self, status: StatusCode, reason: impl Into<String>) {
        self.entries.push(StatusEntry {
            status,
            reason: reason.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reasons attached to failure statuses, in arrival order.
    pub fn failure_reasons(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.status.is_failure() && !e.reason.is_empty())
            .map(|e| e.reason.as_str())
    }
}

#[derive(Debug, Default)]
struct ResourceState {
    history: StatusHistory,
    stopwatch: StopWatch,
}

impl ResourceState {
    fn apply(&mut self, status: StatusCode, reason: String) {
        let previous = self.history.latest().status.clone();
        let was_not_started = previous == StatusCode::NotStarted;

        if !previous.is_in_progress() && status.is_in_progress() {
            self.stopwatch.reset();
            self.stopwatch.start();
        } else if status.is_terminal() && was_not_started {
            // Finished before any in-progress event arrived.
            self.stopwatch.start();
            self.stopwatch.stop();
        } else if status.is_terminal() {
            self.stopwatch.stop();
        }
        self.history.push(status, reason);
    }
}

/// Tracks one logical resource by listening to the stack's event stream.
pub struct ResourceComponent {
    description: String,
    opts: RenderOptions,
    state: Arc<Mutex<ResourceState>>,
    done: DoneSignal,
}

impl ResourceComponent {
    /// Starts listening on `events` right away. Must be called inside a tokio runtime.
    pub fn new(
        logical_id: impl Into<String>,
        description: impl Into<String>,
        events: mpsc::UnboundedReceiver<StackEvent>,
        opts: RenderOptions,
    ) -> Self {
        let logical_id = logical_id.into();
        let state = Arc::new(Mutex::new(ResourceState::default()));
        let (latch, done) = DoneLatch::new();

        tokio::spawn(Self::listen(logical_id, Arc::clone(&state), events, latch));

        Self {
            description: single_line(&description.into()),
            opts,
            state,
            done,
        }
    }

    async fn listen(
        logical_id: String,
        state: Arc<Mutex<ResourceState>>,
        mut events: mpsc::UnboundedReceiver<StackEvent>,
        latch: DoneLatch,
    ) {
        while let Some(event) = events.recv().await {
            if event.logical_id != logical_id {
                continue;
            }
            debug!(logical_id = %logical_id, status = %event.status, "Resource status changed");
            lock(&state).apply(event.status, event.status_reason);
        }
        debug!(logical_id = %logical_id, "Resource stream closed");
        latch.fire();
    }

    pub fn latest_status(&self) -> StatusCode {
        lock(&self.state).history.latest().status.clone()
    }

    pub fn elapsed(&self) -> Duration {
        lock(&self.state).stopwatch.elapsed()
    }

    pub fn history(&self) -> StatusHistory {
        lock(&self.state).history.clone()
    }
}

fn lock(state: &Mutex<ResourceState>) -> MutexGuard<'_, ResourceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Renderer for ResourceComponent {
    fn render(&self, out: &mut dyn Write) -> io::Result<usize> {
        let (status, elapsed, started, reasons) = {
            let state = lock(&self.state);
            (
                state.history.latest().status.clone(),
                state.stopwatch.elapsed(),
                state.stopwatch.is_started(),
                state
                    .history
                    .failure_reasons()
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
            )
        };

        let pad = self.opts.pad();
        let timer = if started { elapsed_cell(elapsed) } else { String::new() };
        writeln!(
            out,
            "{}- {}\t{}\t{}",
            pad,
            self.description,
            status_cell(&status, elapsed, self.opts.color),
            timer
        )?;

        let mut lines = 1;
        let reason_pad = " ".repeat(self.opts.padding + REASON_INDENT);
        for reason in &reasons {
            for chunk in wrap_chars(reason, self.opts.wrap_width) {
                writeln!(out, "{}{}", reason_pad, failure_text(&chunk, self.opts.color))?;
                lines += 1;
            }
        }
        Ok(lines)
    }
}

impl DynamicRenderer for ResourceComponent {
    fn done(&self) -> DoneSignal {
        self.done.clone()
    }
}
