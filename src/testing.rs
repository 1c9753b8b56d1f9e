//! Shared helpers for unit tests.

use std::io::{self, Write};

use chrono::{DateTime, Utc};

use crate::progress::RenderOptions;
use crate::stack::event::{StackEvent, StatusCode};
use crate::stack::rollout::{Deployment, DeploymentStatus, RolloutState, ServiceSnapshot};

pub fn plain_opts() -> RenderOptions {
    RenderOptions {
        color: false,
        ..RenderOptions::default()
    }
}

pub fn event(logical_id: &str, status: StatusCode) -> StackEvent {
    StackEvent {
        logical_id: logical_id.to_string(),
        resource_type: "AWS::ECS::Service".to_string(),
        status,
        status_reason: String::new(),
        physical_id: String::new(),
        timestamp: Utc::now(),
    }
}

pub fn failed_event(logical_id: &str, status: StatusCode, reason: &str) -> StackEvent {
    StackEvent {
        status_reason: reason.to_string(),
        ..event(logical_id, status)
    }
}

pub fn physical_event(
    logical_id: &str,
    status: StatusCode,
    physical_id: &str,
    timestamp: DateTime<Utc>,
) -> StackEvent {
    StackEvent {
        physical_id: physical_id.to_string(),
        timestamp,
        ..event(logical_id, status)
    }
}

pub fn snapshot(primary_running: u32, state: RolloutState) -> ServiceSnapshot {
    ServiceSnapshot {
        timestamp: Utc::now(),
        deployments: vec![Deployment {
            id: "ecs-svc/1".to_string(),
            status: DeploymentStatus::Primary,
            task_definition: "api:7".to_string(),
            desired: 2,
            running: primary_running,
            pending: 2 - primary_running.min(2),
            failed: 0,
            rollout_state: state,
        }],
        failure_messages: vec![],
    }
}

/// Lets spawned listener tasks drain whatever is already queued for them.
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

/// A sink whose every write fails.
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }
}
