//! Runtime configuration for embedding applications.
//!
//! Configuration can be set via environment variables:
//! - `TASKDECK_DATA_DIR` - Optional. Directory for the settings file and the
//!   SQLite database. Defaults to the current directory.
//! - `TASKDECK_STORAGE` - Optional. Storage backend, `sqlite` (default) or
//!   `memory`.
//!
//! API keys are not configuration: they live in the settings store (which
//! itself falls back to `OPENROUTER_API_KEY` / `OPENAI_API_KEY` on first run).

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::settings::{SettingsStore, SharedSettingsStore};
use crate::store::{
    InMemoryConversationStore, InMemoryTaskStore, SharedConversationStore, SharedTaskStore,
    SqliteStore,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Which task/conversation store backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Non-persistent, for tests and ephemeral use
    Memory,
    /// Single-file SQLite database under the data directory
    Sqlite,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// Everything the engine's stores need, wired and shared.
pub struct Stores {
    pub tasks: SharedTaskStore,
    pub conversations: SharedConversationStore,
    pub settings: SharedSettingsStore,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the settings file and the SQLite database
    pub data_dir: PathBuf,

    /// Storage backend for tasks and conversations
    pub storage: StorageBackend,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `TASKDECK_STORAGE` is set to
    /// something other than `sqlite` or `memory`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = std::env::var("TASKDECK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let storage = match std::env::var("TASKDECK_STORAGE") {
            Ok(value) => value
                .parse()
                .map_err(|e: String| ConfigError::InvalidValue("TASKDECK_STORAGE".to_string(), e))?,
            Err(_) => StorageBackend::Sqlite,
        };

        Ok(Self { data_dir, storage })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(data_dir: PathBuf, storage: StorageBackend) -> Self {
        Self { data_dir, storage }
    }

    /// Path of the SQLite database under the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("taskdeck.db")
    }

    /// Open the configured stores.
    ///
    /// With the SQLite backend one connection backs both the task and the
    /// conversation store. The settings store always lives as JSON under the
    /// data directory, whatever the backend.
    pub async fn open_stores(&self) -> Result<Stores, String> {
        let settings: SharedSettingsStore = Arc::new(SettingsStore::new(&self.data_dir).await);

        let (tasks, conversations): (SharedTaskStore, SharedConversationStore) = match self.storage
        {
            StorageBackend::Memory => (
                Arc::new(InMemoryTaskStore::new()),
                Arc::new(InMemoryConversationStore::new()),
            ),
            StorageBackend::Sqlite => {
                let store = Arc::new(SqliteStore::open(self.database_path()).await?);
                (store.clone(), store)
            }
        };

        tracing::info!(
            backend = ?self.storage,
            data_dir = %self.data_dir.display(),
            "Opened task stores"
        );
        Ok(Stores {
            tasks,
            conversations,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ConversationMessage, MessageRole};
    use crate::task::Task;

    #[test]
    fn test_backend_parses_known_names_only() {
        assert_eq!("memory".parse(), Ok(StorageBackend::Memory));
        assert_eq!("sqlite".parse(), Ok(StorageBackend::Sqlite));
        assert!("postgres".parse::<StorageBackend>().is_err());
        // Names are exact; no case folding.
        assert!("Memory".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_database_path_is_under_data_dir() {
        let config = Config::new(PathBuf::from("/tmp/deck"), StorageBackend::Sqlite);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/deck/taskdeck.db"));
    }

    #[tokio::test]
    async fn test_memory_backend_opens_non_persistent_stores() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), StorageBackend::Memory);

        let stores = config.open_stores().await.unwrap();
        assert!(!stores.tasks.is_persistent());
        assert!(!stores.conversations.is_persistent());
        assert!(!config.database_path().exists());
    }

    #[tokio::test]
    async fn test_sqlite_backend_shares_one_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), StorageBackend::Sqlite);

        let stores = config.open_stores().await.unwrap();
        assert!(stores.tasks.is_persistent());
        assert!(config.database_path().exists());

        let task = stores
            .tasks
            .insert(Task::new("persist me", ""))
            .await
            .unwrap();
        stores
            .conversations
            .append(ConversationMessage::new(
                task.conversation_id,
                MessageRole::User,
                "hello",
            ))
            .await
            .unwrap();

        let log = stores
            .conversations
            .messages(task.conversation_id)
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, "hello");
    }
}
