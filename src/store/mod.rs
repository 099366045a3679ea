//! Task and conversation storage with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for tests and ephemeral use)
//! - `sqlite`: Single-file SQLite database
//!
//! Status changes go through [`TaskStore::transition`] so the lifecycle
//! table is enforced at the storage boundary; field edits go through
//! [`TaskStore::update`], which always stamps `modified_at`.

mod memory;
mod sqlite;

pub use memory::{InMemoryConversationStore, InMemoryTaskStore};
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::conversation::ConversationMessage;
use crate::task::{ConversationId, Task, TaskId, TaskPatch, TaskStatus, TriggeredBy};

/// Shared handle to a task store.
pub type SharedTaskStore = Arc<dyn TaskStore>;

/// Shared handle to a conversation store.
pub type SharedConversationStore = Arc<dyn ConversationStore>;

/// Task store trait - implemented by all storage backends.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Insert a freshly created task. Fails if the id is already present.
    async fn insert(&self, task: Task) -> Result<Task, String>;

    /// Get a single task by ID.
    async fn get(&self, id: TaskId) -> Result<Option<Task>, String>;

    /// List tasks, ordered by modified_at descending.
    async fn list(&self) -> Result<Vec<Task>, String>;

    /// Apply a field patch and return the updated task.
    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, String>;

    /// Drive the task through one lifecycle transition.
    ///
    /// An invalid transition is an error and leaves the stored task
    /// untouched.
    async fn transition(
        &self,
        id: TaskId,
        to: TaskStatus,
        triggered_by: TriggeredBy,
        reason: Option<&str>,
    ) -> Result<Task, String>;
}

/// Conversation store trait - append-only message log per conversation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Append one message to its conversation's log.
    async fn append(&self, message: ConversationMessage) -> Result<(), String>;

    /// Messages for a conversation in chronological order.
    async fn messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMessage>, String>;
}
