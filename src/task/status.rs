//! Task lifecycle states and the transition table.
//!
//! # State Machine
//! ```text
//! queued       -> in_progress, failed, archived
//! in_progress  -> needs_input, under_review, failed, queued
//! needs_input  -> in_progress
//! under_review -> approved, in_progress, needs_input
//! approved     -> done, archived
//! done         -> archived
//! archived     -> (none)
//! failed       -> queued
//! ```
//!
//! `archived` is the only terminal state. The table is the single source of
//! truth: `Task::transition` consults it and nothing else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a task in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be executed
    Queued,
    /// An execution run is (or should be) underway
    InProgress,
    /// Paused awaiting a human answer to `pending_question`
    NeedsInput,
    /// Execution produced a result awaiting human review
    UnderReview,
    /// Result accepted by the reviewer
    Approved,
    /// Finished and acknowledged
    Done,
    /// Removed from the working set; no outgoing transitions
    Archived,
    /// Execution failed; retryable back to queued
    Failed,
}

impl TaskStatus {
    /// Targets reachable from this status in one step.
    pub fn allowed_transitions(&self) -> &'static [TaskStatus] {
        use TaskStatus::*;
        match self {
            Queued => &[InProgress, Failed, Archived],
            InProgress => &[NeedsInput, UnderReview, Failed, Queued],
            NeedsInput => &[InProgress],
            UnderReview => &[Approved, InProgress, NeedsInput],
            Approved => &[Done, Archived],
            Done => &[Archived],
            Archived => &[],
            Failed => &[Queued],
        }
    }

    /// Check whether a direct transition to `to` is allowed.
    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Check if this status has no outgoing transitions.
    ///
    /// # Property
    /// `is_terminal() => allowed_transitions().is_empty()`
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::NeedsInput => "needs_input",
            TaskStatus::UnderReview => "under_review",
            TaskStatus::Approved => "approved",
            TaskStatus::Done => "done",
            TaskStatus::Archived => "archived",
            TaskStatus::Failed => "failed",
        }
    }

    /// Parse the snake_case name back into a status.
    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s {
            "queued" => Some(TaskStatus::Queued),
            "in_progress" => Some(TaskStatus::InProgress),
            "needs_input" => Some(TaskStatus::NeedsInput),
            "under_review" => Some(TaskStatus::UnderReview),
            "approved" => Some(TaskStatus::Approved),
            "done" => Some(TaskStatus::Done),
            "archived" => Some(TaskStatus::Archived),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who initiated a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggeredBy {
    User,
    Agent,
}

/// One applied status transition, stamped into a task's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransition {
    pub from: TaskStatus,
    pub to: TaskStatus,
    pub timestamp: DateTime<Utc>,
    pub triggered_by: TriggeredBy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
