//! SQLite-backed task and conversation persistence.
//!
//! A single [`SqliteStore`] owns one connection behind a tokio mutex and
//! implements both store traits. Every statement runs on the blocking thread
//! pool; read-modify-write operations (`update`, `transition`) hold the
//! connection lock for the whole load/mutate/save cycle so concurrent
//! writers cannot interleave between the load and the save.
//!
//! Structured fields (tags, execution config, human inputs, status history,
//! tool calls) are stored as JSON text columns. Timestamps are RFC 3339
//! strings, which keeps `ORDER BY modified_at` correct as a plain text sort.

use super::{ConversationStore, TaskStore};
use crate::conversation::{ConversationMessage, MessageRole};
use crate::task::{
    ConversationId, ReviewDepth, Task, TaskId, TaskPatch, TaskPriority, TaskStatus,
    TokenUsageTotals, TriggeredBy,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'queued',
    priority TEXT NOT NULL DEFAULT 'medium',
    review_depth TEXT NOT NULL DEFAULT 'standard',
    tags TEXT,
    execution_config TEXT NOT NULL,
    conversation_id TEXT NOT NULL,
    result TEXT,
    result_summary TEXT,
    pending_question TEXT,
    human_inputs TEXT,
    status_history TEXT,
    prompt_tokens INTEGER NOT NULL DEFAULT 0,
    completion_tokens INTEGER NOT NULL DEFAULT 0,
    total_cost REAL NOT NULL DEFAULT 0,
    execution_steps INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    modified_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_tasks_modified_at ON tasks(modified_at DESC);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

CREATE TABLE IF NOT EXISTS conversation_messages (
    id TEXT PRIMARY KEY NOT NULL,
    conversation_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    timestamp TEXT NOT NULL,
    tool_calls TEXT,
    tool_result TEXT,
    model_id TEXT,
    token_count INTEGER,
    is_streaming INTEGER
);

CREATE INDEX IF NOT EXISTS idx_messages_conversation
    ON conversation_messages(conversation_id, timestamp);
"#;

const TASK_COLUMNS: &str = "id, title, description, status, priority, review_depth, tags,
            execution_config, conversation_id, result, result_summary, pending_question,
            human_inputs, status_history, prompt_tokens, completion_tokens, total_cost,
            execution_steps, last_error, retry_count, created_at, modified_at, started_at,
            completed_at";

const INSERT_TASK_SQL: &str = "INSERT INTO tasks (id, title, description, status, priority, review_depth, tags,
            execution_config, conversation_id, result, result_summary, pending_question,
            human_inputs, status_history, prompt_tokens, completion_tokens, total_cost,
            execution_steps, last_error, retry_count, created_at, modified_at, started_at,
            completed_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
             ?18, ?19, ?20, ?21, ?22, ?23, ?24)";

const UPDATE_TASK_SQL: &str = "UPDATE tasks
     SET title = ?2, description = ?3, status = ?4, priority = ?5, review_depth = ?6,
         tags = ?7, execution_config = ?8, conversation_id = ?9, result = ?10,
         result_summary = ?11, pending_question = ?12, human_inputs = ?13,
         status_history = ?14, prompt_tokens = ?15, completion_tokens = ?16,
         total_cost = ?17, execution_steps = ?18, last_error = ?19, retry_count = ?20,
         created_at = ?21, modified_at = ?22, started_at = ?23, completed_at = ?24
     WHERE id = ?1";

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and apply the schema.
    pub async fn open(db_path: PathBuf) -> Result<Self, String> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Failed to create data dir: {}", e))?;
        }

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)
                .map_err(|e| format!("Failed to open SQLite database: {}", e))?;
            conn.execute_batch(SCHEMA)
                .map_err(|e| format!("Failed to run schema: {}", e))?;
            Ok::<_, String>(conn)
        })
        .await
        .map_err(|e| format!("Task join error: {}", e))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn parse_priority(s: &str) -> TaskPriority {
    match s {
        "low" => TaskPriority::Low,
        "high" => TaskPriority::High,
        "urgent" => TaskPriority::Urgent,
        _ => TaskPriority::Medium,
    }
}

fn parse_review_depth(s: &str) -> ReviewDepth {
    match s {
        "light" => ReviewDepth::Light,
        "deep" => ReviewDepth::Deep,
        _ => ReviewDepth::Standard,
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let id: String = row.get(0)?;
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let review_depth: String = row.get(5)?;
    let tags_json: Option<String> = row.get(6)?;
    let execution_config_json: String = row.get(7)?;
    let conversation_id: String = row.get(8)?;
    let human_inputs_json: Option<String> = row.get(12)?;
    let status_history_json: Option<String> = row.get(13)?;
    let created_at: String = row.get(20)?;
    let modified_at: String = row.get(21)?;
    let started_at: Option<String> = row.get(22)?;
    let completed_at: Option<String> = row.get(23)?;

    Ok(Task {
        id: TaskId::parse(&id).unwrap_or_default(),
        title: row.get(1)?,
        description: row.get(2)?,
        status: TaskStatus::parse(&status).unwrap_or(TaskStatus::Queued),
        priority: parse_priority(&priority),
        review_depth: parse_review_depth(&review_depth),
        tags: tags_json
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        execution_config: serde_json::from_str(&execution_config_json).unwrap_or_default(),
        conversation_id: ConversationId::parse(&conversation_id).unwrap_or_default(),
        result: row.get(9)?,
        result_summary: row.get(10)?,
        pending_question: row.get(11)?,
        human_inputs: human_inputs_json
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        status_history: status_history_json
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        token_usage: TokenUsageTotals {
            prompt_tokens: row.get::<_, i64>(14)? as u64,
            completion_tokens: row.get::<_, i64>(15)? as u64,
            total_cost: row.get(16)?,
        },
        execution_steps: row.get::<_, i64>(17)? as u32,
        last_error: row.get(18)?,
        retry_count: row.get::<_, i64>(19)? as u32,
        created_at: parse_timestamp(&created_at),
        modified_at: parse_timestamp(&modified_at),
        started_at: started_at.map(|s| parse_timestamp(&s)),
        completed_at: completed_at.map(|s| parse_timestamp(&s)),
    })
}

fn load_task(conn: &Connection, id: &str) -> Result<Option<Task>, String> {
    let mut stmt = conn
        .prepare(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))
        .map_err(|e| e.to_string())?;
    stmt.query_row(params![id], row_to_task)
        .optional()
        .map_err(|e| e.to_string())
}

fn write_task(conn: &Connection, task: &Task, sql: &str) -> Result<(), String> {
    let tags = serde_json::to_string(&task.tags).map_err(|e| e.to_string())?;
    let execution_config =
        serde_json::to_string(&task.execution_config).map_err(|e| e.to_string())?;
    let human_inputs = serde_json::to_string(&task.human_inputs).map_err(|e| e.to_string())?;
    let status_history =
        serde_json::to_string(&task.status_history).map_err(|e| e.to_string())?;

    conn.execute(
        sql,
        params![
            task.id.to_string(),
            task.title,
            task.description,
            task.status.as_str(),
            task.priority.as_str(),
            task.review_depth.as_str(),
            tags,
            execution_config,
            task.conversation_id.to_string(),
            task.result,
            task.result_summary,
            task.pending_question,
            human_inputs,
            status_history,
            task.token_usage.prompt_tokens as i64,
            task.token_usage.completion_tokens as i64,
            task.token_usage.total_cost,
            task.execution_steps as i64,
            task.last_error,
            task.retry_count as i64,
            task.created_at.to_rfc3339(),
            task.modified_at.to_rfc3339(),
            task.started_at.map(|t| t.to_rfc3339()),
            task.completed_at.map(|t| t.to_rfc3339()),
        ],
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationMessage> {
    let id: String = row.get(0)?;
    let conversation_id: String = row.get(1)?;
    let role: String = row.get(2)?;
    let timestamp: String = row.get(4)?;
    let tool_calls_json: Option<String> = row.get(5)?;
    let tool_result_json: Option<String> = row.get(6)?;
    let token_count: Option<i64> = row.get(8)?;
    let is_streaming: Option<i64> = row.get(9)?;

    Ok(ConversationMessage {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        conversation_id: ConversationId::parse(&conversation_id).unwrap_or_default(),
        role: MessageRole::parse(&role).unwrap_or(MessageRole::User),
        content: row.get(3)?,
        timestamp: parse_timestamp(&timestamp),
        tool_calls: tool_calls_json.and_then(|s| serde_json::from_str(&s).ok()),
        tool_result: tool_result_json.and_then(|s| serde_json::from_str(&s).ok()),
        model_id: row.get(7)?,
        token_count: token_count.map(|v| v as u64),
        is_streaming: is_streaming.map(|v| v != 0),
    })
}

#[async_trait]
impl TaskStore for SqliteStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn insert(&self, task: Task) -> Result<Task, String> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let exists = conn
                .prepare("SELECT 1 FROM tasks WHERE id = ?1")
                .map_err(|e| e.to_string())?
                .exists(params![task.id.to_string()])
                .map_err(|e| e.to_string())?;
            if exists {
                return Err(format!("Task {} already exists", task.id));
            }
            write_task(&conn, &task, INSERT_TASK_SQL)?;
            Ok(task)
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, String> {
        let conn = self.conn.clone();
        let id_str = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            load_task(&conn, &id_str)
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn list(&self) -> Result<Vec<Task>, String> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM tasks ORDER BY modified_at DESC",
                    TASK_COLUMNS
                ))
                .map_err(|e| e.to_string())?;
            let tasks = stmt
                .query_map([], row_to_task)
                .map_err(|e| e.to_string())?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?;
            Ok(tasks)
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, String> {
        let conn = self.conn.clone();
        let id_str = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut task = load_task(&conn, &id_str)?
                .ok_or_else(|| format!("Task {} not found", id_str))?;
            task.apply(patch);
            write_task(&conn, &task, UPDATE_TASK_SQL)?;
            Ok(task)
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn transition(
        &self,
        id: TaskId,
        to: TaskStatus,
        triggered_by: TriggeredBy,
        reason: Option<&str>,
    ) -> Result<Task, String> {
        let conn = self.conn.clone();
        let id_str = id.to_string();
        let reason = reason.map(str::to_string);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut task = load_task(&conn, &id_str)?
                .ok_or_else(|| format!("Task {} not found", id_str))?;
            task.transition(to, triggered_by, reason)
                .map_err(|e| e.to_string())?;
            write_task(&conn, &task, UPDATE_TASK_SQL)?;
            Ok(task)
        })
        .await
        .map_err(|e| e.to_string())?
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn append(&self, message: ConversationMessage) -> Result<(), String> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let tool_calls = match &message.tool_calls {
                Some(calls) => Some(serde_json::to_string(calls).map_err(|e| e.to_string())?),
                None => None,
            };
            let tool_result = match &message.tool_result {
                Some(result) => Some(serde_json::to_string(result).map_err(|e| e.to_string())?),
                None => None,
            };
            conn.execute(
                "INSERT INTO conversation_messages (id, conversation_id, role, content, timestamp,
                            tool_calls, tool_result, model_id, token_count, is_streaming)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    message.id.to_string(),
                    message.conversation_id.to_string(),
                    message.role.as_str(),
                    message.content,
                    message.timestamp.to_rfc3339(),
                    tool_calls,
                    tool_result,
                    message.model_id,
                    message.token_count.map(|v| v as i64),
                    message.is_streaming.map(i64::from),
                ],
            )
            .map_err(|e| e.to_string())?;
            Ok(())
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMessage>, String> {
        let conn = self.conn.clone();
        let id_str = conversation_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, role, content, timestamp, tool_calls,
                            tool_result, model_id, token_count, is_streaming
                     FROM conversation_messages
                     WHERE conversation_id = ?1
                     ORDER BY timestamp ASC, rowid ASC",
                )
                .map_err(|e| e.to_string())?;
            let messages = stmt
                .query_map(params![&id_str], row_to_message)
                .map_err(|e| e.to_string())?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?;
            Ok(messages)
        })
        .await
        .map_err(|e| e.to_string())?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{RecordedToolCall, RecordedToolResult};
    use crate::task::HumanInput;

    async fn open_store(dir: &tempfile::TempDir) -> SqliteStore {
        SqliteStore::open(dir.path().join("tasks.db"))
            .await
            .unwrap()
    }

    fn sample_task() -> Task {
        let mut task = Task::new("Compare vector database benchmarks", "Focus on recall at k=10");
        task.tags = vec!["research".to_string(), "databases".to_string()];
        task.priority = TaskPriority::High;
        task
    }

    #[tokio::test]
    async fn round_trips_nested_task_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let mut task = sample_task();
        task.transition(
            TaskStatus::InProgress,
            TriggeredBy::Agent,
            Some("Execution started".to_string()),
        )
        .unwrap();
        task.token_usage.accumulate(120, 48, 0.0042);
        task.human_inputs
            .push(HumanInput::new("Which benchmark suite?", "ann-benchmarks"));
        let id = task.id;

        store.insert(task.clone()).await.unwrap();
        let loaded = store.get(id).await.unwrap().unwrap();

        assert_eq!(loaded.id, id);
        assert_eq!(loaded.title, task.title);
        assert_eq!(loaded.status, TaskStatus::InProgress);
        assert_eq!(loaded.priority, TaskPriority::High);
        assert_eq!(loaded.tags, task.tags);
        assert_eq!(loaded.execution_config, task.execution_config);
        assert_eq!(loaded.token_usage, task.token_usage);
        assert_eq!(loaded.status_history.len(), 2);
        assert_eq!(loaded.status_history[1].to, TaskStatus::InProgress);
        assert_eq!(
            loaded.status_history[1].reason.as_deref(),
            Some("Execution started")
        );
        assert_eq!(loaded.human_inputs.len(), 1);
        assert_eq!(loaded.human_inputs[0].question, "Which benchmark suite?");
        assert_eq!(loaded.created_at, task.created_at);
        assert_eq!(loaded.started_at, task.started_at);
    }

    #[tokio::test]
    async fn rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let task = sample_task();
        store.insert(task.clone()).await.unwrap();
        let err = store.insert(task).await.unwrap_err();
        assert!(err.contains("already exists"));
    }

    #[tokio::test]
    async fn update_persists_patch_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let task = sample_task();
        let id = task.id;
        store.insert(task).await.unwrap();

        store
            .update(
                id,
                TaskPatch {
                    pending_question: Some(Some("Which region?".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = store
            .update(
                id,
                TaskPatch {
                    result: Some("All benchmarks compared".to_string()),
                    result_summary: Some("All benchmarks compared...".to_string()),
                    pending_question: Some(None),
                    execution_steps: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.result.as_deref(), Some("All benchmarks compared"));

        let reloaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(reloaded.result.as_deref(), Some("All benchmarks compared"));
        assert_eq!(reloaded.execution_steps, 3);
        assert!(reloaded.pending_question.is_none());
        assert!(reloaded.modified_at > reloaded.created_at);
    }

    #[tokio::test]
    async fn update_of_missing_task_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let err = store
            .update(TaskId::new(), TaskPatch::default())
            .await
            .unwrap_err();
        assert!(err.contains("not found"));
    }

    #[tokio::test]
    async fn transition_appends_history_and_stamps_started_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let task = sample_task();
        let id = task.id;
        store.insert(task).await.unwrap();

        let updated = store
            .transition(
                id,
                TaskStatus::InProgress,
                TriggeredBy::Agent,
                Some("Execution started"),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert!(updated.started_at.is_some());

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.status_history.len(), 2);
        assert_eq!(
            loaded.status_history.last().unwrap().reason.as_deref(),
            Some("Execution started")
        );
    }

    #[tokio::test]
    async fn invalid_transition_leaves_row_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let task = sample_task();
        let id = task.id;
        store.insert(task).await.unwrap();

        let err = store
            .transition(id, TaskStatus::Done, TriggeredBy::User, None)
            .await
            .unwrap_err();
        assert!(err.contains("invalid status transition"));

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Queued);
        assert_eq!(loaded.status_history.len(), 1);
    }

    #[tokio::test]
    async fn list_orders_by_most_recently_modified() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let first = sample_task();
        let second = sample_task();
        store.insert(first.clone()).await.unwrap();
        store.insert(second.clone()).await.unwrap();

        store
            .update(
                first.id,
                TaskPatch {
                    execution_steps: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let tasks = store.list().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, first.id);
        assert_eq!(tasks[1].id, second.id);
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");

        let task = sample_task();
        let id = task.id;
        {
            let store = SqliteStore::open(path.clone()).await.unwrap();
            store.insert(task).await.unwrap();
        }

        let store = SqliteStore::open(path).await.unwrap();
        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.status, TaskStatus::Queued);
    }

    #[tokio::test]
    async fn round_trips_conversation_messages() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let conversation_id = ConversationId::new();
        let request = ConversationMessage::new(
            conversation_id,
            MessageRole::Assistant,
            "Recording a finding",
        )
        .with_tool_calls(vec![RecordedToolCall {
            id: "call_1".to_string(),
            name: "save_finding".to_string(),
            arguments: serde_json::json!({"summary": "Recall at k=10 varies widely"}),
        }]);
        store.append(request).await.unwrap();

        let reply = ConversationMessage::new(
            conversation_id,
            MessageRole::Tool,
            "Finding saved successfully.",
        )
        .with_tool_result(RecordedToolResult {
            tool_call_id: "call_1".to_string(),
            name: "save_finding".to_string(),
            result: "Finding saved successfully.".to_string(),
            error: None,
        });
        store.append(reply).await.unwrap();

        let messages = store.messages(conversation_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::Assistant);
        let calls = messages[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].name, "save_finding");
        assert_eq!(calls[0].arguments["summary"], "Recall at k=10 varies widely");
        assert_eq!(messages[1].role, MessageRole::Tool);
        let result = messages[1].tool_result.as_ref().unwrap();
        assert_eq!(result.tool_call_id, "call_1");
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn unknown_conversation_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let messages = store.messages(ConversationId::new()).await.unwrap();
        assert!(messages.is_empty());
    }
}
