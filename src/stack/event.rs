//! Stack change events and the status vocabulary they carry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle status of one resource within a stack deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StatusCode {
    /// Sentinel for a resource we have not seen any event for yet.
    #[default]
    NotStarted,
    CreateInProgress,
    CreateComplete,
    CreateFailed,
    UpdateInProgress,
    UpdateCompleteCleanupInProgress,
    UpdateComplete,
    UpdateFailed,
    DeleteInProgress,
    DeleteComplete,
    DeleteFailed,
    DeleteSkipped,
    RollbackInProgress,
    RollbackComplete,
    RollbackFailed,
    UpdateRollbackInProgress,
    UpdateRollbackCompleteCleanupInProgress,
    UpdateRollbackComplete,
    UpdateRollbackFailed,
    Unknown(String),
}

impl StatusCode {
    pub fn as_str(&self) -> &str {
        match self {
            StatusCode::NotStarted => "NOT_STARTED",
            StatusCode::CreateInProgress => "CREATE_IN_PROGRESS",
            StatusCode::CreateComplete => "CREATE_COMPLETE",
            StatusCode::CreateFailed => "CREATE_FAILED",
            StatusCode::UpdateInProgress => "UPDATE_IN_PROGRESS",
            StatusCode::UpdateCompleteCleanupInProgress => "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
            StatusCode::UpdateComplete => "UPDATE_COMPLETE",
            StatusCode::UpdateFailed => "UPDATE_FAILED",
            StatusCode::DeleteInProgress => "DELETE_IN_PROGRESS",
            StatusCode::DeleteComplete => "DELETE_COMPLETE",
            StatusCode::DeleteFailed => "DELETE_FAILED",
            StatusCode::DeleteSkipped => "DELETE_SKIPPED",
            StatusCode::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            StatusCode::RollbackComplete => "ROLLBACK_COMPLETE",
            StatusCode::RollbackFailed => "ROLLBACK_FAILED",
            StatusCode::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            StatusCode::UpdateRollbackCompleteCleanupInProgress => {
                "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS"
            }
            StatusCode::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            StatusCode::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            StatusCode::Unknown(raw) => raw,
        }
    }

    /// Any status that is still expected to transition.
    pub fn is_in_progress(&self) -> bool {
        self.as_str().ends_with("_IN_PROGRESS")
    }

    /// A create or update is actively happening, as opposed to a delete or rollback.
    pub fn is_upsert_in_progress(&self) -> bool {
        matches!(
            self,
            StatusCode::CreateInProgress | StatusCode::UpdateInProgress
        )
    }

    /// No further transitions are expected for the current attempt.
    pub fn is_terminal(&self) -> bool {
        match self {
            StatusCode::NotStarted => false,
            StatusCode::Unknown(raw) => {
                raw.ends_with("_COMPLETE") || raw.ends_with("_FAILED") || raw.ends_with("_SKIPPED")
            }
            other => !other.is_in_progress(),
        }
    }

    pub fn is_success(&self) -> bool {
        let raw = self.as_str();
        self.is_terminal()
            && !raw.ends_with("_FAILED")
            && !raw.starts_with("ROLLBACK")
            && !raw.starts_with("UPDATE_ROLLBACK")
    }

    /// Statuses whose reason explains what went wrong.
    pub fn is_failure(&self) -> bool {
        let raw = self.as_str();
        raw.ends_with("_FAILED")
            || matches!(
                self,
                StatusCode::RollbackInProgress | StatusCode::UpdateRollbackInProgress
            )
    }

    /// The deployment attempt ended by reverting to the previous state.
    pub fn is_rolled_back(&self) -> bool {
        matches!(
            self,
            StatusCode::RollbackComplete | StatusCode::UpdateRollbackComplete
        )
    }

    /// Lowercase label shown to users, e.g. `create in progress`.
    pub fn label(&self) -> String {
        self.as_str().to_lowercase().replace('_', " ")
    }
}

impl FromStr for StatusCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NOT_STARTED" => StatusCode::NotStarted,
            "CREATE_IN_PROGRESS" => StatusCode::CreateInProgress,
            "CREATE_COMPLETE" => StatusCode::CreateComplete,
            "CREATE_FAILED" => StatusCode::CreateFailed,
            "UPDATE_IN_PROGRESS" => StatusCode::UpdateInProgress,
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS" => StatusCode::UpdateCompleteCleanupInProgress,
            "UPDATE_COMPLETE" => StatusCode::UpdateComplete,
            "UPDATE_FAILED" => StatusCode::UpdateFailed,
            "DELETE_IN_PROGRESS" => StatusCode::DeleteInProgress,
            "DELETE_COMPLETE" => StatusCode::DeleteComplete,
            "DELETE_FAILED" => StatusCode::DeleteFailed,
            "DELETE_SKIPPED" => StatusCode::DeleteSkipped,
            "ROLLBACK_IN_PROGRESS" => StatusCode::RollbackInProgress,
            "ROLLBACK_COMPLETE" => StatusCode::RollbackComplete,
            "ROLLBACK_FAILED" => StatusCode::RollbackFailed,
            "UPDATE_ROLLBACK_IN_PROGRESS" => StatusCode::UpdateRollbackInProgress,
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS" => {
                StatusCode::UpdateRollbackCompleteCleanupInProgress
            }
            "UPDATE_ROLLBACK_COMPLETE" => StatusCode::UpdateRollbackComplete,
            "UPDATE_ROLLBACK_FAILED" => StatusCode::UpdateRollbackFailed,
            other => StatusCode::Unknown(other.to_string()),
        })
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

/// A single change event emitted while a stack deploys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEvent {
    pub logical_id: String,
    #[serde(default)]
    pub resource_type: String,
    pub status: StatusCode,
    #[serde(default)]
    pub status_reason: String,
    #[serde(default)]
    pub physical_id: String,
    pub timestamp: DateTime<Utc>,
}
