//! # taskdeck
//!
//! An LLM task execution engine. Tasks move through an explicit lifecycle
//! (queued, in progress, needing input, under review, ...) while execution
//! strategies drive streaming model exchanges, dispatch tool calls, and
//! account for token spend.
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │              Engine              │
//!        │   (one async run per task id)    │
//!        └────────┬───────────────┬─────────┘
//!                 │               │
//!                 ▼               ▼
//!        ┌────────────────┐  ┌──────────────────┐
//!        │  OpenRouter /  │  │      Task /      │
//!        │  OpenAI client │  │   conversation   │
//!        │  + SSE decoder │  │      stores      │
//!        └────────────────┘  └──────────────────┘
//! ```
//!
//! ## Run Flow
//! 1. Validate credentials for the task's strategy
//! 2. Register the execution handle, move the task to `in_progress`
//! 3. Drive the strategy: streamed exchanges, tool dispatch, usage updates
//! 4. Land in `under_review`, `needs_input`, or `failed`; tear down the handle
//!
//! ## Modules
//! - `exec`: the execution engine, strategies, and live status store
//! - `llm`: provider clients and the streaming protocol decoder
//! - `task`: the task model and its lifecycle state machine
//! - `store`: task and conversation storage (in-memory or SQLite)

pub mod config;
pub mod conversation;
pub mod exec;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod settings;
pub mod store;
pub mod task;
pub mod tools;

pub use config::{Config, Stores};
pub use exec::{Engine, EngineError, ExecutionStatusStore, RunOutcome};
pub use settings::{Settings, SettingsStore};
pub use task::{Task, TaskId, TaskStatus};

/// Install the default tracing subscriber.
///
/// Intended for application entry points. Respects `RUST_LOG`, defaulting to
/// `taskdeck=info`. Later calls are no-ops, so tests and embedders can call
/// it without coordination.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdeck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_tracing_is_repeatable() {
        super::init_tracing();
        super::init_tracing();
    }
}
