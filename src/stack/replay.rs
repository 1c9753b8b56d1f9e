//! Replays a recorded deployment as live event streams.
//!
//! A recording is JSON lines: a `deployment` header naming the stack and the
//! resources to display, then `stack_event` and `service_event` records in
//! the order they were observed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::event::StackEvent;
use super::rollout::ServiceSnapshot;
use super::stream::{EventFanout, RolloutStreams};
use super::tasks::TaskGroup;
use crate::error::{Result, StackwatchError};

/// A resource the recording asks us to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub logical_id: String,
    pub description: String,
    /// Follow this resource's rolling update once it starts.
    #[serde(default)]
    pub service: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentHeader {
    pub stack_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record {
    Deployment(DeploymentHeader),
    StackEvent(StackEvent),
    ServiceEvent {
        physical_id: String,
        #[serde(flatten)]
        snapshot: ServiceSnapshot,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayItem {
    Stack(StackEvent),
    Service {
        physical_id: String,
        snapshot: ServiceSnapshot,
    },
}

impl ReplayItem {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ReplayItem::Stack(event) => event.timestamp,
            ReplayItem::Service { snapshot, .. } => snapshot.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub header: DeploymentHeader,
    pub items: Vec<ReplayItem>,
}

impl Recording {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut header = None;
        let mut items = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(line).map_err(|e| StackwatchError::Replay {
                line: line_no,
                message: e.to_string(),
            })?;
            match (record, header.is_some()) {
                (Record::Deployment(h), false) => header = Some(h),
                (Record::Deployment(_), true) => {
                    return Err(StackwatchError::Replay {
                        line: line_no,
                        message: "duplicate deployment header".to_string(),
                    })
                }
                (_, false) => {
                    return Err(StackwatchError::Replay {
                        line: line_no,
                        message: "expected a deployment header first".to_string(),
                    })
                }
                (Record::StackEvent(event), true) => items.push(ReplayItem::Stack(event)),
                (Record::ServiceEvent { physical_id, snapshot }, true) => {
                    items.push(ReplayItem::Service {
                        physical_id,
                        snapshot,
                    })
                }
            }
        }

        let header = header.ok_or_else(|| StackwatchError::Replay {
            line: 0,
            message: "recording is empty".to_string(),
        })?;
        Ok(Self { header, items })
    }
}

#[derive(Default)]
struct RolloutHub {
    streams: HashMap<String, Arc<EventFanout<ServiceSnapshot>>>,
    latest: HashMap<String, ServiceSnapshot>,
    closed: bool,
}

/// Rolling-update streams fed by a [`Replayer`].
#[derive(Default)]
pub struct ReplayRollouts {
    hub: Mutex<RolloutHub>,
}

impl ReplayRollouts {
    pub fn new() -> Self {
        Self::default()
    }

    fn hub(&self) -> MutexGuard<'_, RolloutHub> {
        self.hub.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stream(hub: &mut RolloutHub, physical_id: &str) -> Arc<EventFanout<ServiceSnapshot>> {
        let closed = hub.closed;
        Arc::clone(hub.streams.entry(physical_id.to_string()).or_insert_with(|| {
            let fanout = EventFanout::new();
            if closed {
                fanout.close();
            }
            Arc::new(fanout)
        }))
    }

    pub fn publish(&self, physical_id: &str, snapshot: ServiceSnapshot) {
        let mut hub = self.hub();
        let stream = Self::stream(&mut hub, physical_id);
        hub.latest.insert(physical_id.to_string(), snapshot.clone());
        stream.publish(snapshot);
    }

    /// Ends every rolling-update stream, current and future.
    pub fn close_all(&self) {
        let mut hub = self.hub();
        hub.closed = true;
        for stream in hub.streams.values() {
            stream.close();
        }
    }
}

impl RolloutStreams for ReplayRollouts {
    fn subscribe(
        &self,
        physical_id: &str,
        since: DateTime<Utc>,
        tasks: &TaskGroup,
    ) -> mpsc::UnboundedReceiver<ServiceSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (mut raw, latest) = {
            let mut hub = self.hub();
            let stream = Self::stream(&mut hub, physical_id);
            (stream.subscribe(), hub.latest.get(physical_id).cloned())
        };

        // Like a fresh describe call, start from the current state.
        if let Some(latest) = latest.filter(|s| s.timestamp >= since) {
            let settled = latest.is_settled();
            let _ = tx.send(latest);
            if settled {
                return rx;
            }
        }

        let cancel = tasks.token().clone();
        let physical_id = physical_id.to_string();
        tasks.spawn("rollout-forwarder", async move {
            loop {
                let snapshot = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    next = raw.recv() => match next {
                        Some(snapshot) => snapshot,
                        None => break,
                    },
                };
                if snapshot.timestamp < since {
                    continue;
                }
                let settled = snapshot.is_settled();
                if tx.send(snapshot).is_err() || settled {
                    break;
                }
            }
            debug!(physical_id = %physical_id, "Rolling update stream ended");
            Ok(())
        });
        rx
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayOptions {
    /// Playback speed multiplier; 2.0 plays twice as fast as recorded.
    pub speed: f64,
    /// Upper bound on any single pause between records.
    pub max_delay: Duration,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            max_delay: Duration::from_secs(2),
        }
    }
}

impl ReplayOptions {
    fn delay(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
        let gap = (to - from).to_std().unwrap_or(Duration::ZERO);
        let speed = if self.speed > 0.0 { self.speed } else { 1.0 };
        gap.div_f64(speed).min(self.max_delay)
    }
}

/// Publishes a [`Recording`] to the stack fanout and rolling-update hub.
pub struct Replayer {
    stack_name: String,
    items: Vec<ReplayItem>,
    stack_events: Arc<EventFanout<StackEvent>>,
    rollouts: Arc<ReplayRollouts>,
    opts: ReplayOptions,
}

impl Replayer {
    pub fn new(
        recording: Recording,
        stack_events: Arc<EventFanout<StackEvent>>,
        rollouts: Arc<ReplayRollouts>,
        opts: ReplayOptions,
    ) -> Self {
        Self {
            stack_name: recording.header.stack_name,
            items: recording.items,
            stack_events,
            rollouts,
            opts,
        }
    }

    /// Plays every record, then closes all streams. Stops early once the
    /// stack itself reaches a terminal status or `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut previous: Option<DateTime<Utc>> = None;
        let mut published = 0usize;

        for item in self.items {
            let at = item.timestamp();
            if let Some(prev) = previous {
                let delay = self.opts.delay(prev, at);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                break;
            }
            previous = Some(at);
            published += 1;

            match item {
                ReplayItem::Stack(event) => {
                    let finished = event.logical_id == self.stack_name && event.status.is_terminal();
                    self.stack_events.publish(event);
                    if finished {
                        info!(stack = %self.stack_name, "Stack reached a terminal status");
                        break;
                    }
                }
                ReplayItem::Service {
                    physical_id,
                    snapshot,
                } => self.rollouts.publish(&physical_id, snapshot),
            }
        }

        debug!(published, "Replay finished, closing streams");
        self.stack_events.close();
        self.rollouts.close_all();
        Ok(())
    }
}
