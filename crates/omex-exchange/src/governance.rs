//! Governance engine collaborator.
//!
//! Governance-action processes run entirely inside the governance engine;
//! the exchange layer relays process identifiers and reads back status, it
//! never executes actions itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use omex_core::{ElementId, OmexResult};

/// Status of a governance-action process instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Requested but not yet started.
    Requested,

    /// Running.
    InProgress,

    /// Completed successfully.
    Actioned,

    /// Completed with a failure.
    Failed,

    /// Cancelled before completion.
    Cancelled,
}

impl ProcessStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Requested => "requested",
            ProcessStatus::InProgress => "in_progress",
            ProcessStatus::Actioned => "actioned",
            ProcessStatus::Failed => "failed",
            ProcessStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the process has finished, in any outcome.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessStatus::Actioned | ProcessStatus::Failed | ProcessStatus::Cancelled
        )
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProcessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" => Ok(ProcessStatus::Requested),
            "in_progress" => Ok(ProcessStatus::InProgress),
            "actioned" => Ok(ProcessStatus::Actioned),
            "failed" => Ok(ProcessStatus::Failed),
            "cancelled" => Ok(ProcessStatus::Cancelled),
            _ => Err(format!("Unknown process status: {s}")),
        }
    }
}

/// Identifier-relay interface to the governance engine.
#[async_trait]
pub trait GovernanceEngine: Send + Sync {
    /// Start a governance-action process by its qualified name against the
    /// given action targets. Returns the GUID of the process instance.
    async fn initiate_process(
        &self,
        process_qualified_name: &str,
        action_targets: &[ElementId],
        start_time: Option<DateTime<Utc>>,
    ) -> OmexResult<ElementId>;

    /// Current status of a process instance.
    async fn process_status(&self, process_instance: ElementId) -> OmexResult<ProcessStatus>;

    /// Cancel a process instance that has not finished.
    async fn cancel_process(&self, process_instance: ElementId) -> OmexResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_status_roundtrip() {
        for status in [
            ProcessStatus::Requested,
            ProcessStatus::InProgress,
            ProcessStatus::Actioned,
            ProcessStatus::Failed,
            ProcessStatus::Cancelled,
        ] {
            let parsed: ProcessStatus = status.as_str().parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ProcessStatus::Requested.is_terminal());
        assert!(!ProcessStatus::InProgress.is_terminal());
        assert!(ProcessStatus::Actioned.is_terminal());
        assert!(ProcessStatus::Failed.is_terminal());
        assert!(ProcessStatus::Cancelled.is_terminal());
    }
}
