//! Live execution status shared between the engine and its callers.
//!
//! Tracks which tasks currently have a run in flight and holds the live
//! streaming transcript for each. Both are process-local views of volatile
//! state and are never persisted.

use crate::task::TaskId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct ExecutionStatusStore {
    active: Arc<RwLock<HashSet<TaskId>>>,
    streaming: Arc<RwLock<HashMap<TaskId, String>>>,
}

impl ExecutionStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mark_active(&self, id: TaskId) {
        self.active.write().await.insert(id);
    }

    pub async fn mark_inactive(&self, id: TaskId) {
        self.active.write().await.remove(&id);
    }

    pub async fn is_executing(&self, id: TaskId) -> bool {
        self.active.read().await.contains(&id)
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// Replace the live transcript for a task.
    pub async fn set_streaming_content(&self, id: TaskId, content: impl Into<String>) {
        self.streaming.write().await.insert(id, content.into());
    }

    /// Append a chunk to the live transcript, creating it if absent.
    pub async fn append_streaming_content(&self, id: TaskId, chunk: &str) {
        self.streaming
            .write()
            .await
            .entry(id)
            .or_default()
            .push_str(chunk);
    }

    pub async fn streaming_content(&self, id: TaskId) -> Option<String> {
        self.streaming.read().await.get(&id).cloned()
    }

    pub async fn clear_streaming_content(&self, id: TaskId) {
        self.streaming.write().await.remove(&id);
    }
}
