//! In-memory stores (non-persistent).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ConversationStore, TaskStore};
use crate::conversation::ConversationMessage;
use crate::task::{ConversationId, Task, TaskId, TaskPatch, TaskStatus, TriggeredBy};

#[derive(Clone)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn insert(&self, task: Task) -> Result<Task, String> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(format!("Task {} already exists", task.id));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, String> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>, String> {
        let mut tasks: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(tasks)
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, String> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| format!("Task {} not found", id))?;
        task.apply(patch);
        Ok(task.clone())
    }

    async fn transition(
        &self,
        id: TaskId,
        to: TaskStatus,
        triggered_by: TriggeredBy,
        reason: Option<&str>,
    ) -> Result<Task, String> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| format!("Task {} not found", id))?;
        task.transition(to, triggered_by, reason.map(str::to_string))
            .map_err(|e| e.to_string())?;
        Ok(task.clone())
    }
}

#[derive(Clone)]
pub struct InMemoryConversationStore {
    messages: Arc<RwLock<HashMap<ConversationId, Vec<ConversationMessage>>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn append(&self, message: ConversationMessage) -> Result<(), String> {
        self.messages
            .write()
            .await
            .entry(message.conversation_id)
            .or_default()
            .push(message);
        Ok(())
    }

    async fn messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMessage>, String> {
        Ok(self
            .messages
            .read()
            .await
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}
