//! Task module - the unit of work and its lifecycle state machine.
//!
//! A task is created `queued`, driven by the execution engine through the
//! transition table in [`status`], and reviewed by a human once it reaches
//! `under_review`. All status changes route through [`Task::transition`].

pub mod status;
pub mod task;

pub use status::{StatusTransition, TaskStatus, TriggeredBy};
pub use task::{
    detect_research_strategy, ConversationId, ExecutionConfig, HumanInput, ResearchStrategy,
    ReviewDepth, Task, TaskError, TaskId, TaskPatch, TaskPriority, TokenUsageTotals,
};
