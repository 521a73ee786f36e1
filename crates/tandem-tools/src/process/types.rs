//! Process identifiers, states and update messages.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Identifier of a background process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(Uuid);

impl ProcessId {
    /// Generates a new time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProcessId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for ProcessId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Lifecycle state of a process.
///
/// Transitions only move forward: `pending` to `running`, then to exactly
/// one of `succeeded` or `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProcessState {
    /// Registered, work not started yet.
    #[default]
    Pending,
    /// Work is running.
    Running,
    /// Work finished with a result.
    Succeeded,
    /// Work finished with an error.
    Failed,
}

impl ProcessState {
    /// Whether no further transitions can happen.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `next` is a valid successor of this state.
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}

/// Final payload of a successful process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Message shown to the user.
    pub text: String,
    /// Structured payload.
    #[serde(default)]
    pub data: Value,
}

impl ProcessResult {
    /// Creates a result.
    pub fn new(text: impl Into<String>, data: Value) -> Self {
        Self {
            text: text.into(),
            data,
        }
    }
}

/// Intermediate progress report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessProgress {
    /// Completion estimate, 0 to 100.
    pub percentage: u8,
    /// Short status line.
    pub text: String,
    /// When the report was received.
    pub reported_at: Timestamp,
}

/// Event reported by a running process.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// The work started.
    Started,
    /// The work reported progress.
    Progress {
        /// Completion estimate, clamped to 100.
        percentage: u8,
        /// Short status line.
        text: String,
    },
    /// The work finished successfully.
    Succeeded(ProcessResult),
    /// The work failed.
    Failed(String),
}

/// Message sent from a process task to the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessUpdate {
    /// Process the event belongs to.
    pub id: ProcessId,
    /// What happened.
    pub event: ProcessEvent,
}

/// Point-in-time view of a process, served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSnapshot {
    /// Process id.
    pub id: ProcessId,
    /// Short name, such as "Phone Call".
    pub name: String,
    /// What the process does.
    pub description: String,
    /// Current state.
    pub state: ProcessState,
    /// Progress reports, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progress: Vec<ProcessProgress>,
    /// Result, once succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ProcessResult>,
    /// Failure reason, once failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Registration time.
    pub created_at: Timestamp,
    /// Time of the last applied update.
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        use ProcessState::*;

        assert!(Pending.can_transition_to(Running));
        assert!(Running.can_transition_to(Succeeded));
        assert!(Running.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Succeeded));
        assert!(!Succeeded.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Running));
        assert!(Succeeded.is_terminal() && Failed.is_terminal());
    }

    #[test]
    fn state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ProcessState::Succeeded).unwrap(),
            serde_json::json!("succeeded")
        );
        assert_eq!(ProcessState::Running.as_ref(), "running");
    }
}
