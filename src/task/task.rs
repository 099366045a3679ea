//! Core task type: the unit of work the engine executes.
//!
//! # Invariants
//! - `status` changes only through [`Task::transition`], which enforces the
//!   transition table in [`super::status`]
//! - `token_usage` is monotonically non-decreasing while the task is
//!   non-terminal
//! - `pending_question` is cleared whenever the task leaves `needs_input`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{StatusTransition, TaskStatus, TriggeredBy};

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parse from a string UUID (store keys, API paths).
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a task's conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-facing priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much human scrutiny the result should get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDepth {
    Light,
    Standard,
    Deep,
}

impl ReviewDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDepth::Light => "light",
            ReviewDepth::Standard => "standard",
            ReviewDepth::Deep => "deep",
        }
    }
}

impl std::fmt::Display for ReviewDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution mode for a task.
///
/// A closed set: strategy dispatch in the orchestrator is an exhaustive
/// match, so adding a variant is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStrategy {
    /// Tool-call loop against the task's configured model
    Standard,
    /// Single-shot call to a web-search-backed research model
    Perplexity,
    /// One non-streaming request to OpenAI's deep-research endpoint
    OpenaiDeep,
    /// Research model gathers, then the task's model synthesizes
    MultiModel,
}

/// Per-task execution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    /// Provider-qualified model id (OpenRouter format)
    pub model_id: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub research_strategy: ResearchStrategy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            model_id: "anthropic/claude-sonnet-4".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            research_strategy: ResearchStrategy::Standard,
        }
    }
}

/// Cumulative token usage and cost for a task, across all its runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageTotals {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    /// Estimated spend in USD
    pub total_cost: f64,
}

impl TokenUsageTotals {
    /// Fold one exchange's usage into the totals.
    ///
    /// # Postcondition
    /// All three fields are >= their previous values.
    pub fn accumulate(&mut self, prompt_tokens: u64, completion_tokens: u64, cost: f64) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(completion_tokens);
        self.total_cost += cost.max(0.0);
    }
}

/// One answered clarification round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanInput {
    pub id: Uuid,
    /// The question the agent asked (empty if it was never recorded)
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

impl HumanInput {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Keywords that steer a freshly created task toward the research strategy.
const RESEARCH_KEYWORDS: &[&str] = &[
    "research",
    "investigate",
    "find out",
    "compare",
    "analyze",
    "look into",
    "study",
    "explore",
    "review",
    "examine",
    "what is",
    "how does",
    "how well",
    "how effective",
];

/// Pick a default strategy from free text (title + description).
///
/// Substring match on lowercased text; research-flavored wording selects
/// the single-shot research strategy, everything else stays standard.
pub fn detect_research_strategy(text: &str) -> ResearchStrategy {
    let lower = text.to_lowercase();
    if RESEARCH_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        ResearchStrategy::Perplexity
    } else {
        ResearchStrategy::Standard
    }
}

/// A task handed to the engine.
///
/// Created in `queued` with a self-transition seed record in its history.
/// The engine mutates it exclusively through [`Task::transition`] and
/// [`TaskPatch`]; it is never destroyed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Mutate only via [`Task::transition`]
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub review_depth: ReviewDepth,
    #[serde(default)]
    pub tags: Vec<String>,

    pub execution_config: ExecutionConfig,

    pub conversation_id: ConversationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<String>,
    /// Set only while paused for input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_question: Option<String>,
    #[serde(default)]
    pub human_inputs: Vec<HumanInput>,

    pub status_history: Vec<StatusTransition>,
    pub token_usage: TokenUsageTotals,
    pub execution_steps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub retry_count: u32,

    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a task in `queued` with default configuration.
    ///
    /// The research strategy is auto-detected from the title and
    /// description; the history is seeded with a `queued -> queued` record
    /// so every task carries at least one entry.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let title = title.into();
        let description = description.into();
        let now = Utc::now();
        let strategy = detect_research_strategy(&format!("{} {}", title, description));

        Self {
            id: TaskId::new(),
            title,
            description,
            status: TaskStatus::Queued,
            priority: TaskPriority::Medium,
            review_depth: ReviewDepth::Standard,
            tags: Vec::new(),
            execution_config: ExecutionConfig {
                research_strategy: strategy,
                ..ExecutionConfig::default()
            },
            conversation_id: ConversationId::new(),
            result: None,
            result_summary: None,
            pending_question: None,
            human_inputs: Vec::new(),
            status_history: vec![StatusTransition {
                from: TaskStatus::Queued,
                to: TaskStatus::Queued,
                timestamp: now,
                triggered_by: TriggeredBy::User,
                reason: None,
            }],
            token_usage: TokenUsageTotals::default(),
            execution_steps: 0,
            last_error: None,
            retry_count: 0,
            created_at: now,
            modified_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Apply a lifecycle transition.
    ///
    /// The only sanctioned way to change `status`. On success it atomically
    /// sets the new status, appends one history record, refreshes
    /// `modified_at`, stamps `started_at` on the first entry into
    /// `in_progress`, and stamps `completed_at` on entering `done` or
    /// `approved`.
    ///
    /// # Errors
    /// Returns `TaskError::InvalidTransition` without mutating anything if
    /// the table does not allow `status -> to`.
    pub fn transition(
        &mut self,
        to: TaskStatus,
        triggered_by: TriggeredBy,
        reason: Option<String>,
    ) -> Result<(), TaskError> {
        let from = self.status;
        if !from.can_transition_to(to) {
            return Err(TaskError::InvalidTransition { from, to });
        }

        let now = Utc::now();
        self.status = to;
        self.status_history.push(StatusTransition {
            from,
            to,
            timestamp: now,
            triggered_by,
            reason,
        });
        self.modified_at = now;

        if to == TaskStatus::InProgress && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if matches!(to, TaskStatus::Done | TaskStatus::Approved) {
            self.completed_at = Some(now);
        }

        Ok(())
    }

    /// Apply a partial field update, refreshing `modified_at`.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(result) = patch.result {
            self.result = Some(result);
        }
        if let Some(summary) = patch.result_summary {
            self.result_summary = Some(summary);
        }
        if let Some(question) = patch.pending_question {
            self.pending_question = question;
        }
        if let Some(steps) = patch.execution_steps {
            self.execution_steps = steps;
        }
        if let Some(usage) = patch.token_usage {
            self.token_usage = usage;
        }
        if let Some(error) = patch.last_error {
            self.last_error = Some(error);
        }
        if let Some(count) = patch.retry_count {
            self.retry_count = count;
        }
        if let Some(input) = patch.push_human_input {
            self.human_inputs.push(input);
        }
        self.modified_at = Utc::now();
    }
}

/// Partial update to a task's non-status fields.
///
/// `pending_question` is doubly optional: `Some(None)` clears it (leaving
/// `needs_input` requires the question to go away), `Some(Some(q))` sets it,
/// `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub result: Option<String>,
    pub result_summary: Option<String>,
    pub pending_question: Option<Option<String>>,
    pub execution_steps: Option<u32>,
    pub token_usage: Option<TokenUsageTotals>,
    pub last_error: Option<String>,
    pub retry_count: Option<u32>,
    pub push_human_input: Option<HumanInput>,
}

/// Errors from task operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TaskStatus; 8] = [
        TaskStatus::Queued,
        TaskStatus::InProgress,
        TaskStatus::NeedsInput,
        TaskStatus::UnderReview,
        TaskStatus::Approved,
        TaskStatus::Done,
        TaskStatus::Archived,
        TaskStatus::Failed,
    ];

    fn task_in_status(status: TaskStatus) -> Task {
        let mut task = Task::new("test task", "");
        task.status = status;
        task
    }

    #[test]
    fn test_new_task_seeds_history() {
        let task = Task::new("write a haiku", "");
        assert_eq!(task.status, TaskStatus::Queued);
        assert_eq!(task.status_history.len(), 1);
        let seed = &task.status_history[0];
        assert_eq!(seed.from, TaskStatus::Queued);
        assert_eq!(seed.to, TaskStatus::Queued);
        assert_eq!(seed.triggered_by, TriggeredBy::User);
        assert!(seed.reason.is_none());
        assert!(task.started_at.is_none());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_strategy_detection_on_create() {
        let research = Task::new("research the impact of X", "");
        assert_eq!(
            research.execution_config.research_strategy,
            ResearchStrategy::Perplexity
        );

        let plain = Task::new("write a haiku", "");
        assert_eq!(
            plain.execution_config.research_strategy,
            ResearchStrategy::Standard
        );

        // Keywords in the description count too.
        let by_description = Task::new("X", "please compare the two options");
        assert_eq!(
            by_description.execution_config.research_strategy,
            ResearchStrategy::Perplexity
        );
    }

    #[test]
    fn test_all_valid_transitions_append_one_record() {
        for from in ALL {
            for to in from.allowed_transitions() {
                let mut task = task_in_status(from);
                let before = task.status_history.len();
                task.transition(*to, TriggeredBy::Agent, Some("test".into()))
                    .unwrap_or_else(|e| panic!("{} -> {} should be valid: {}", from, to, e));
                assert_eq!(task.status, *to);
                assert_eq!(task.status_history.len(), before + 1);
            }
        }
    }

    #[test]
    fn test_all_invalid_transitions_mutate_nothing() {
        for from in ALL {
            for to in ALL {
                if from.can_transition_to(to) {
                    continue;
                }
                let mut task = task_in_status(from);
                let snapshot = task.clone();
                let err = task.transition(to, TriggeredBy::User, None);
                assert!(err.is_err(), "{} -> {} should be rejected", from, to);
                assert_eq!(task.status, snapshot.status);
                assert_eq!(task.status_history.len(), snapshot.status_history.len());
                assert_eq!(task.modified_at, snapshot.modified_at);
            }
        }
    }

    #[test]
    fn test_started_at_stamped_once() {
        let mut task = Task::new("t", "");
        task.transition(TaskStatus::InProgress, TriggeredBy::Agent, None)
            .unwrap();
        let first_start = task.started_at.expect("started_at set on first entry");

        // Leave and re-enter in_progress; the stamp must not move.
        task.transition(TaskStatus::NeedsInput, TriggeredBy::Agent, None)
            .unwrap();
        task.transition(TaskStatus::InProgress, TriggeredBy::User, None)
            .unwrap();
        assert_eq!(task.started_at, Some(first_start));
    }

    #[test]
    fn test_completed_at_stamped_on_approved_and_done() {
        let mut task = Task::new("t", "");
        task.transition(TaskStatus::InProgress, TriggeredBy::Agent, None)
            .unwrap();
        task.transition(TaskStatus::UnderReview, TriggeredBy::Agent, None)
            .unwrap();
        assert!(task.completed_at.is_none());

        task.transition(TaskStatus::Approved, TriggeredBy::User, None)
            .unwrap();
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn test_usage_accumulates_monotonically() {
        let mut totals = TokenUsageTotals::default();
        totals.accumulate(100, 50, 0.01);
        totals.accumulate(200, 75, 0.02);
        assert_eq!(totals.prompt_tokens, 300);
        assert_eq!(totals.completion_tokens, 125);
        assert!((totals.total_cost - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_patch_clears_pending_question() {
        let mut task = Task::new("t", "");
        task.pending_question = Some("which one?".into());

        task.apply(TaskPatch {
            pending_question: Some(None),
            push_human_input: Some(HumanInput::new("which one?", "the first")),
            ..TaskPatch::default()
        });

        assert!(task.pending_question.is_none());
        assert_eq!(task.human_inputs.len(), 1);
        assert_eq!(task.human_inputs[0].answer, "the first");
    }

    #[test]
    fn test_task_serde_round_trip() {
        let mut task = Task::new("research rust async runtimes", "compare them");
        task.transition(TaskStatus::InProgress, TriggeredBy::Agent, Some("go".into()))
            .unwrap();

        let json = serde_json::to_string(&task).unwrap();
        // Wire format is camelCase like the rest of the store records.
        assert!(json.contains("\"executionConfig\""));
        assert!(json.contains("\"statusHistory\""));

        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, task.id);
        assert_eq!(back.status, TaskStatus::InProgress);
        assert_eq!(back.status_history.len(), 2);
    }
}
