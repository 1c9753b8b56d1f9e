//! Renderer for a service's rolling update, nested under its stack resource.

use std::collections::{HashSet, VecDeque};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use super::done::{DoneLatch, DoneSignal};
use super::style::failure_text;
use super::text::TableComponent;
use super::{DynamicRenderer, RenderOptions, Renderer};
use crate::stack::rollout::{Deployment, ServiceSnapshot};
use crate::util::wrap_chars;

/// How many of the most recent failure messages stay on screen.
const MAX_FAILURE_MESSAGES: usize = 5;

#[derive(Debug, Default)]
struct UpdateState {
    deployments: Option<Vec<Deployment>>,
    /// Most recent unique failure messages, oldest first, at most
    /// [`MAX_FAILURE_MESSAGES`] long.
    failures: VecDeque<String>,
    seen: HashSet<String>,
}

impl UpdateState {
    fn apply(&mut self, snapshot: ServiceSnapshot) {
        self.deployments = Some(snapshot.deployments);
        for message in snapshot.failure_messages {
            if !self.seen.insert(message.clone()) {
                continue;
            }
            if self.failures.len() == MAX_FAILURE_MESSAGES {
                self.failures.pop_front();
            }
            self.failures.push_back(message);
        }
    }
}

pub struct RollingUpdateComponent {
    opts: RenderOptions,
    state: Arc<Mutex<UpdateState>>,
    done: DoneSignal,
}

impl RollingUpdateComponent {
    /// Starts listening on `snapshots` right away. Must be called inside a tokio runtime.
    pub fn new(
        physical_id: impl Into<String>,
        snapshots: mpsc::UnboundedReceiver<ServiceSnapshot>,
        opts: RenderOptions,
    ) -> Self {
        let state = Arc::new(Mutex::new(UpdateState::default()));
        let (latch, done) = DoneLatch::new();
        tokio::spawn(Self::listen(
            physical_id.into(),
            Arc::clone(&state),
            snapshots,
            latch,
        ));
        Self { opts, state, done }
    }

    async fn listen(
        physical_id: String,
        state: Arc<Mutex<UpdateState>>,
        mut snapshots: mpsc::UnboundedReceiver<ServiceSnapshot>,
        latch: DoneLatch,
    ) {
        while let Some(snapshot) = snapshots.recv().await {
            lock(&state).apply(snapshot);
        }
        debug!(physical_id = %physical_id, "Rolling update stream closed");
        latch.fire();
    }
}

fn lock(state: &Mutex<UpdateState>) -> MutexGuard<'_, UpdateState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn deployment_row(d: &Deployment) -> Vec<String> {
    vec![
        d.status.to_string(),
        d.task_definition.clone(),
        d.rollout_state.to_string(),
        format!("{}/{}", d.running, d.desired),
        d.pending.to_string(),
        d.failed.to_string(),
    ]
}

impl Renderer for RollingUpdateComponent {
    fn render(&self, out: &mut dyn Write) -> io::Result<usize> {
        let (deployments, failures) = {
            let state = lock(&self.state);
            (
                state.deployments.clone(),
                state.failures.iter().cloned().collect::<Vec<_>>(),
            )
        };
        let Some(deployments) = deployments else {
            return Ok(0);
        };

        let header = ["Deployment", "Task definition", "Rollout", "Running", "Pending", "Failed"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows = deployments.iter().map(deployment_row).collect();
        let mut lines = TableComponent::new(header, rows, self.opts).render(out)?;

        if !failures.is_empty() {
            writeln!(out, "{}Latest failures:", self.opts.pad())?;
            lines += 1;
            let pad = self.opts.nested().pad();
            for message in &failures {
                for chunk in wrap_chars(message, self.opts.wrap_width) {
                    writeln!(out, "{}{}", pad, failure_text(&chunk, self.opts.color))?;
                    lines += 1;
                }
            }
        }
        Ok(lines)
    }
}

impl DynamicRenderer for RollingUpdateComponent {
    fn done(&self) -> DoneSignal {
        self.done.clone()
    }
}
