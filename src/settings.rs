//! Global settings storage.
//!
//! Persists user-configurable settings to disk at
//! `{working_dir}/.taskdeck/settings.json`. Environment variables are used as
//! initial defaults when no settings file exists.
//!
//! Besides credentials and model defaults this carries the spend ledger:
//! every completed LLM exchange reports its estimated cost through
//! [`SettingsStore::add_spent`]. The monthly budget is informational — an
//! overrun logs a warning but never blocks execution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Global application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// OpenRouter API key, used by all streaming strategies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openrouter_api_key: Option<String>,
    /// OpenAI API key, used only by the deep-research strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    /// Model applied to newly created tasks.
    pub default_model_id: String,
    pub default_temperature: f64,
    pub default_max_tokens: u64,
    /// Soft monthly spend ceiling in USD.
    pub monthly_budget_usd: f64,
    /// Running total of estimated spend in USD.
    pub total_spent_usd: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openai_api_key: None,
            default_model_id: "anthropic/claude-sonnet-4".to_string(),
            default_temperature: 0.7,
            default_max_tokens: 4096,
            monthly_budget_usd: 10.0,
            total_spent_usd: 0.0,
        }
    }
}

/// In-memory store for global settings with disk persistence.
#[derive(Debug)]
pub struct SettingsStore {
    settings: RwLock<Settings>,
    storage_path: PathBuf,
}

impl SettingsStore {
    /// Create a new settings store, loading from disk if available.
    ///
    /// If no settings file exists, uses environment variables as defaults:
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub async fn new(working_dir: &Path) -> Self {
        let storage_path = working_dir.join(".taskdeck/settings.json");

        let settings = if storage_path.exists() {
            match Self::load_from_path(&storage_path) {
                Ok(s) => {
                    tracing::info!("Loaded settings from {}", storage_path.display());
                    s
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load settings from {}: {}, using defaults",
                        storage_path.display(),
                        e
                    );
                    Self::defaults_from_env()
                }
            }
        } else {
            tracing::info!(
                "No settings file found at {}, using environment defaults",
                storage_path.display()
            );
            Self::defaults_from_env()
        };

        Self {
            settings: RwLock::new(settings),
            storage_path,
        }
    }

    /// Load settings from environment variables as initial defaults.
    fn defaults_from_env() -> Settings {
        Settings {
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            ..Settings::default()
        }
    }

    /// Load settings from a file path.
    fn load_from_path(path: &Path) -> Result<Settings, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save current settings to disk.
    async fn save_to_disk(&self) -> Result<(), std::io::Error> {
        let settings = self.settings.read().await;

        if let Some(parent) = self.storage_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&*settings)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        std::fs::write(&self.storage_path, contents)?;
        tracing::debug!("Saved settings to {}", self.storage_path.display());
        Ok(())
    }

    /// Get a clone of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub async fn openrouter_api_key(&self) -> Option<String> {
        self.settings.read().await.openrouter_api_key.clone()
    }

    pub async fn openai_api_key(&self) -> Option<String> {
        self.settings.read().await.openai_api_key.clone()
    }

    pub async fn has_openrouter_key(&self) -> bool {
        self.settings.read().await.openrouter_api_key.is_some()
    }

    pub async fn has_openai_key(&self) -> bool {
        self.settings.read().await.openai_api_key.is_some()
    }

    /// Update the OpenRouter API key and persist to disk.
    pub async fn set_openrouter_api_key(
        &self,
        key: Option<String>,
    ) -> Result<(), std::io::Error> {
        let mut settings = self.settings.write().await;
        settings.openrouter_api_key = key;
        drop(settings); // Release lock before saving
        self.save_to_disk().await
    }

    /// Update the OpenAI API key and persist to disk.
    pub async fn set_openai_api_key(&self, key: Option<String>) -> Result<(), std::io::Error> {
        let mut settings = self.settings.write().await;
        settings.openai_api_key = key;
        drop(settings);
        self.save_to_disk().await
    }

    /// Add an estimated cost to the spend ledger and persist to disk.
    ///
    /// Returns the new running total. Logs a warning once the total crosses
    /// the monthly budget; spending is never blocked.
    pub async fn add_spent(&self, cost: f64) -> Result<f64, std::io::Error> {
        let mut settings = self.settings.write().await;
        settings.total_spent_usd += cost;
        let total = settings.total_spent_usd;
        let budget = settings.monthly_budget_usd;
        drop(settings);

        if total > budget {
            tracing::warn!(
                "Estimated spend ${:.4} exceeds monthly budget ${:.2}",
                total,
                budget
            );
        }

        self.save_to_disk().await?;
        Ok(total)
    }

    /// Update multiple settings at once.
    pub async fn update(&self, new_settings: Settings) -> Result<(), std::io::Error> {
        let mut settings = self.settings.write().await;
        *settings = new_settings;
        drop(settings);
        self.save_to_disk().await
    }
}

/// Shared settings store wrapped in Arc for concurrent access.
pub type SharedSettingsStore = Arc<SettingsStore>;
