//! Snapshots of a running service's rolling update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    #[default]
    Primary,
    Active,
    Inactive,
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentStatus::Primary => write!(f, "PRIMARY"),
            DeploymentStatus::Active => write!(f, "ACTIVE"),
            DeploymentStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RolloutState {
    #[default]
    InProgress,
    Completed,
    Failed,
}

impl RolloutState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RolloutState::Completed | RolloutState::Failed)
    }
}

impl std::fmt::Display for RolloutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RolloutState::InProgress => write!(f, "in progress"),
            RolloutState::Completed => write!(f, "completed"),
            RolloutState::Failed => write!(f, "failed"),
        }
    }
}

/// One deployment (task set) of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    #[serde(default)]
    pub status: DeploymentStatus,
    #[serde(default)]
    pub task_definition: String,
    #[serde(default)]
    pub desired: u32,
    #[serde(default)]
    pub running: u32,
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub rollout_state: RolloutState,
}

/// Point-in-time view of a service while it rolls out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    #[serde(default)]
    pub failure_messages: Vec<String>,
}

impl ServiceSnapshot {
    pub fn primary(&self) -> Option<&Deployment> {
        self.deployments
            .iter()
            .find(|d| d.status == DeploymentStatus::Primary)
    }

    /// The rollout has settled one way or the other.
    pub fn is_settled(&self) -> bool {
        self.primary()
            .map(|d| d.rollout_state.is_terminal())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment(status: DeploymentStatus, state: RolloutState) -> Deployment {
        Deployment {
            id: "ecs-svc/1".to_string(),
            status,
            task_definition: "api:3".to_string(),
            desired: 2,
            running: 1,
            pending: 1,
            failed: 0,
            rollout_state: state,
        }
    }

    #[test]
    fn test_settled_follows_primary() {
        let mut snapshot = ServiceSnapshot {
            timestamp: Utc::now(),
            deployments: vec![
                deployment(DeploymentStatus::Active, RolloutState::Completed),
                deployment(DeploymentStatus::Primary, RolloutState::InProgress),
            ],
            failure_messages: vec![],
        };
        assert!(!snapshot.is_settled());

        snapshot.deployments[1].rollout_state = RolloutState::Failed;
        assert!(snapshot.is_settled());
    }

    #[test]
    fn test_no_primary_is_not_settled() {
        let snapshot = ServiceSnapshot {
            timestamp: Utc::now(),
            deployments: vec![],
            failure_messages: vec![],
        };
        assert!(!snapshot.is_settled());
    }

    #[test]
    fn test_deserialize_screaming_case() {
        let d: Deployment = serde_json::from_str(
            r#"{"id":"d1","status":"ACTIVE","rollout_state":"COMPLETED"}"#,
        )
        .unwrap();
        assert_eq!(d.status, DeploymentStatus::Active);
        assert_eq!(d.rollout_state, RolloutState::Completed);
        assert_eq!(d.desired, 0);
    }
}
