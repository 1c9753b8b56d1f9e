//! Renderer for a service resource plus its nested rolling update.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::done::{wait_all, DoneLatch, DoneSignal};
use super::resource::ResourceComponent;
use super::rollout::RollingUpdateComponent;
use super::{DynamicRenderer, NoopComponent, RenderOptions, Renderer};
use crate::stack::event::StackEvent;
use crate::stack::stream::RolloutStreams;
use crate::stack::tasks::TaskGroup;

struct ServiceState {
    /// The most recently spawned rolling-update renderer.
    current: Arc<dyn DynamicRenderer>,
    /// Done signals of every rolling-update renderer spawned so far.
    spawned: Vec<DoneSignal>,
}

/// Wraps a [`ResourceComponent`] and, once the service starts a create or
/// update, nests a [`RollingUpdateComponent`] under it.
pub struct ServiceDeploymentComponent {
    resource: ResourceComponent,
    state: Arc<Mutex<ServiceState>>,
    done: DoneSignal,
}

/// Everything the listener needs to open a nested rolling-update stream.
struct Spawner {
    logical_id: String,
    rollouts: Arc<dyn RolloutStreams>,
    tasks: TaskGroup,
    opts: RenderOptions,
}

impl ServiceDeploymentComponent {
    /// `resource_events` and `events` must be two subscriptions to the same
    /// stack stream. Must be called inside a tokio runtime.
    pub fn new(
        logical_id: impl Into<String>,
        description: impl Into<String>,
        resource_events: mpsc::UnboundedReceiver<StackEvent>,
        events: mpsc::UnboundedReceiver<StackEvent>,
        rollouts: Arc<dyn RolloutStreams>,
        tasks: TaskGroup,
        opts: RenderOptions,
    ) -> Self {
        let logical_id = logical_id.into();
        let resource = ResourceComponent::new(logical_id.clone(), description, resource_events, opts);
        let state = Arc::new(Mutex::new(ServiceState {
            current: Arc::new(NoopComponent),
            spawned: Vec::new(),
        }));
        let (latch, done) = DoneLatch::new();

        let spawner = Spawner {
            logical_id,
            rollouts,
            tasks,
            opts: opts.nested(),
        };
        tokio::spawn(Self::listen(
            spawner,
            Arc::clone(&state),
            events,
            resource.done(),
            latch,
        ));

        Self {
            resource,
            state,
            done,
        }
    }

    async fn listen(
        spawner: Spawner,
        state: Arc<Mutex<ServiceState>>,
        mut events: mpsc::UnboundedReceiver<StackEvent>,
        mut resource_done: DoneSignal,
        latch: DoneLatch,
    ) {
        // Re-armed by each terminal status so a retried deployment gets its
        // own rolling-update renderer.
        let mut armed = true;
        while let Some(event) = events.recv().await {
            if event.logical_id != spawner.logical_id {
                continue;
            }
            if event.status.is_terminal() {
                armed = true;
                continue;
            }
            if !armed || !event.status.is_upsert_in_progress() {
                continue;
            }
            if event.physical_id.is_empty() {
                // A fresh resource reports create-in-progress once before it
                // has a physical id.
                debug!(logical_id = %spawner.logical_id, "Upsert event without physical id, waiting");
                continue;
            }

            info!(
                logical_id = %spawner.logical_id,
                physical_id = %event.physical_id,
                since = %event.timestamp,
                "Following rolling update"
            );
            let snapshots =
                spawner
                    .rollouts
                    .subscribe(&event.physical_id, event.timestamp, &spawner.tasks);
            let child = Arc::new(RollingUpdateComponent::new(
                event.physical_id.clone(),
                snapshots,
                spawner.opts,
            ));
            {
                let mut guard = lock(&state);
                guard.spawned.push(child.done());
                guard.current = child;
            }
            armed = false;
        }

        // Only this task appends to `spawned`, so the set is final now.
        let spawned = lock(&state).spawned.clone();
        resource_done.wait().await;
        wait_all(spawned).await;
        debug!(logical_id = %spawner.logical_id, "Service deployment finished");
        latch.fire();
    }

    pub fn resource(&self) -> &ResourceComponent {
        &self.resource
    }

    /// Number of rolling-update renderers spawned so far.
    pub fn rollouts_spawned(&self) -> usize {
        lock(&self.state).spawned.len()
    }
}

fn lock(state: &Mutex<ServiceState>) -> MutexGuard<'_, ServiceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Renderer for ServiceDeploymentComponent {
    fn render(&self, out: &mut dyn Write) -> io::Result<usize> {
        let current = Arc::clone(&lock(&self.state).current);
        let lines = self.resource.render(out)?;
        Ok(lines + current.render(out)?)
    }
}

impl DynamicRenderer for ServiceDeploymentComponent {
    fn done(&self) -> DoneSignal {
        self.done.clone()
    }
}
