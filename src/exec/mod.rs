//! Execution engine: drives a task through one strategy run.
//!
//! A run takes a task from `queued` (or a resumption point) into
//! `in_progress`, performs the network exchanges its research strategy
//! demands, and leaves the task `under_review`, `needs_input`, or `failed`.
//! Each run is one async task; concurrent runs across distinct task ids are
//! fine, and a process-wide handle registry enforces at most one live run
//! per task id.
//!
//! Run teardown is unconditional: success, pause, cancellation, and fault
//! all end by marking the task inactive, clearing its live transcript, and
//! removing its execution handle.

mod status;

pub use status::ExecutionStatusStore;

use crate::conversation::{ConversationMessage, MessageRole, RecordedToolCall, RecordedToolResult};
use crate::llm::{
    AccumulatedToolCall, ChatMessage, ChatOptions, FunctionCall, OpenAiResponsesClient,
    OpenRouterClient, Role, StreamEvent, ToolCall, Usage, OPENAI_RESPONSES_URL,
    OPENROUTER_CHAT_URL,
};
use crate::models::estimate_cost;
use crate::prompts::{
    build_research_prompt, build_synthesis_prompt, build_system_prompt, build_task_prompt,
    MULTI_MODEL_RESEARCH_SYSTEM, PERPLEXITY_RESEARCH_SYSTEM, SYNTHESIS_SYSTEM,
};
use crate::settings::SharedSettingsStore;
use crate::store::{SharedConversationStore, SharedTaskStore};
use crate::task::{HumanInput, ResearchStrategy, Task, TaskId, TaskPatch, TaskStatus, TriggeredBy};
use crate::tools::{dispatch_tool_call, tool_definitions, ToolAction};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex as StdMutex};
use tokio_util::sync::CancellationToken;

/// Upper bound on tool-loop rounds for the standard strategy.
const MAX_TOOL_ROUNDS: u32 = 10;

const SONAR_DEEP_RESEARCH_MODEL: &str = "perplexity/sonar-deep-research";
const SONAR_PRO_MODEL: &str = "perplexity/sonar-pro";

const OPENROUTER_KEY_MISSING: &str = "OpenRouter API key required. Configure it in Settings.";
const OPENAI_KEY_MISSING: &str =
    "OpenAI API key required for deep research. Configure it in Settings.";

/// How a run ended when it did not fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The strategy ran to completion; the task is under review.
    Completed,
    /// The run stopped to wait for human input; the task is `needs_input`.
    Paused,
    /// The run was cancelled; task status left untouched.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Task {0} not found")]
    TaskNotFound(TaskId),
    #[error("Task {0} is already executing")]
    AlreadyRunning(TaskId),
    /// Missing credential for the selected strategy, surfaced before any
    /// network activity or `in_progress` transition.
    #[error("{0}")]
    MissingCredential(String),
    #[error("Task {id} is {status}, expected {expected}")]
    WrongStatus {
        id: TaskId,
        status: TaskStatus,
        expected: TaskStatus,
    },
    #[error("{0}")]
    Store(String),
    #[error("{0}")]
    Execution(String),
}

/// Cancellation tokens for in-flight runs, keyed by task id.
///
/// Insert on run start, remove on every run-end path and on `cancel`.
/// Registration doubles as the at-most-one-run-per-task gate.
static EXECUTION_HANDLES: LazyLock<StdMutex<HashMap<TaskId, CancellationToken>>> =
    LazyLock::new(|| StdMutex::new(HashMap::new()));

/// Register a handle for `id`, failing if a run is already registered.
fn register_handle(id: TaskId) -> Option<CancellationToken> {
    let mut handles = EXECUTION_HANDLES
        .lock()
        .expect("execution handle registry poisoned");
    if handles.contains_key(&id) {
        return None;
    }
    let token = CancellationToken::new();
    handles.insert(id, token.clone());
    Some(token)
}

fn take_handle(id: TaskId) -> Option<CancellationToken> {
    EXECUTION_HANDLES
        .lock()
        .expect("execution handle registry poisoned")
        .remove(&id)
}

fn remove_handle(id: TaskId) {
    take_handle(id);
}

/// First 100 characters plus an ellipsis, the task-list preview format.
fn summarize(text: &str) -> String {
    let head: String = text.chars().take(100).collect();
    format!("{}...", head)
}

/// Content and tool calls collected from one streamed exchange.
struct RoundOutput {
    content: String,
    tool_calls: Vec<AccumulatedToolCall>,
}

pub struct Engine {
    tasks: SharedTaskStore,
    conversations: SharedConversationStore,
    settings: SharedSettingsStore,
    status: ExecutionStatusStore,
    chat_url: String,
    responses_url: String,
}

impl Engine {
    pub fn new(
        tasks: SharedTaskStore,
        conversations: SharedConversationStore,
        settings: SharedSettingsStore,
    ) -> Self {
        Self::with_endpoints(
            tasks,
            conversations,
            settings,
            OPENROUTER_CHAT_URL.to_string(),
            OPENAI_RESPONSES_URL.to_string(),
        )
    }

    /// Point the engine at alternate provider endpoints.
    pub fn with_endpoints(
        tasks: SharedTaskStore,
        conversations: SharedConversationStore,
        settings: SharedSettingsStore,
        chat_url: String,
        responses_url: String,
    ) -> Self {
        Self {
            tasks,
            conversations,
            settings,
            status: ExecutionStatusStore::new(),
            chat_url,
            responses_url,
        }
    }

    /// Live execution state: active runs and streaming transcripts.
    pub fn status(&self) -> &ExecutionStatusStore {
        &self.status
    }

    /// Execute `task_id` under its configured strategy.
    ///
    /// Accepts tasks in `queued`, `needs_input` (direct resume), `in_progress`
    /// (resume after [`Engine::provide_human_input`]), or `under_review`
    /// (sent back to work). Credentials for the selected strategy are
    /// validated before any transition, so a configuration failure never
    /// leaves the task `in_progress`.
    pub async fn run(&self, task_id: TaskId) -> Result<RunOutcome, EngineError> {
        let task = self
            .tasks
            .get(task_id)
            .await
            .map_err(EngineError::Store)?
            .ok_or(EngineError::TaskNotFound(task_id))?;

        let strategy = task.execution_config.research_strategy;
        if let Err(message) = self.check_credentials(strategy).await {
            self.record_config_failure(&task, &message).await;
            return Err(EngineError::MissingCredential(message));
        }

        let Some(cancel) = register_handle(task_id) else {
            return Err(EngineError::AlreadyRunning(task_id));
        };
        self.status.mark_active(task_id).await;

        let task = if task.status == TaskStatus::InProgress {
            task
        } else {
            match self
                .tasks
                .transition(
                    task_id,
                    TaskStatus::InProgress,
                    TriggeredBy::Agent,
                    Some("Execution started"),
                )
                .await
            {
                Ok(task) => task,
                Err(e) => {
                    self.teardown(task_id).await;
                    return Err(EngineError::Store(e));
                }
            }
        };

        tracing::info!(task = %task_id, strategy = ?strategy, "Starting task execution");

        let outcome = match strategy {
            ResearchStrategy::Standard => self.run_standard(&task, &cancel).await,
            ResearchStrategy::Perplexity => self.run_perplexity(&task, &cancel).await,
            ResearchStrategy::OpenaiDeep => self.run_openai_deep(&task, &cancel).await,
            ResearchStrategy::MultiModel => self.run_multi_model(&task, &cancel).await,
        };

        let result = match outcome {
            Ok(outcome) => {
                tracing::info!(task = %task_id, outcome = ?outcome, "Task execution finished");
                Ok(outcome)
            }
            Err(_) if cancel.is_cancelled() => {
                tracing::info!(task = %task_id, "Task execution cancelled");
                Ok(RunOutcome::Cancelled)
            }
            Err(message) => {
                tracing::warn!(task = %task_id, error = %message, "Task execution failed");
                self.record_run_failure(task_id, &message).await;
                Err(EngineError::Execution(message))
            }
        };

        self.teardown(task_id).await;
        result
    }

    /// Fire the cancellation token for `task_id`'s run, if one is live.
    ///
    /// Bookkeeping (active flag, transcript) is cleared immediately and
    /// unconditionally, independent of how fast the run unwinds. Idempotent
    /// when no run is active.
    pub async fn cancel(&self, task_id: TaskId) {
        if let Some(token) = take_handle(task_id) {
            tracing::info!(task = %task_id, "Cancelling task execution");
            token.cancel();
        }
        self.status.mark_inactive(task_id).await;
        self.status.clear_streaming_content(task_id).await;
    }

    /// Answer the pending question of a `needs_input` task.
    ///
    /// Records the answer, clears the question, and moves the task back to
    /// `in_progress`. The caller re-invokes [`Engine::run`] to resume.
    pub async fn provide_human_input(
        &self,
        task_id: TaskId,
        answer: &str,
    ) -> Result<Task, EngineError> {
        let task = self
            .tasks
            .get(task_id)
            .await
            .map_err(EngineError::Store)?
            .ok_or(EngineError::TaskNotFound(task_id))?;
        if task.status != TaskStatus::NeedsInput {
            return Err(EngineError::WrongStatus {
                id: task_id,
                status: task.status,
                expected: TaskStatus::NeedsInput,
            });
        }

        let question = task.pending_question.clone().unwrap_or_default();
        self.tasks
            .update(
                task_id,
                TaskPatch {
                    pending_question: Some(None),
                    push_human_input: Some(HumanInput::new(question, answer)),
                    ..Default::default()
                },
            )
            .await
            .map_err(EngineError::Store)?;

        self.tasks
            .transition(
                task_id,
                TaskStatus::InProgress,
                TriggeredBy::User,
                Some("Human provided input"),
            )
            .await
            .map_err(EngineError::Store)
    }

    /// Send a `failed` task back to `queued`, bumping its retry counter.
    pub async fn retry(&self, task_id: TaskId) -> Result<Task, EngineError> {
        let task = self
            .tasks
            .get(task_id)
            .await
            .map_err(EngineError::Store)?
            .ok_or(EngineError::TaskNotFound(task_id))?;
        if task.status != TaskStatus::Failed {
            return Err(EngineError::WrongStatus {
                id: task_id,
                status: task.status,
                expected: TaskStatus::Failed,
            });
        }

        self.tasks
            .update(
                task_id,
                TaskPatch {
                    retry_count: Some(task.retry_count + 1),
                    ..Default::default()
                },
            )
            .await
            .map_err(EngineError::Store)?;

        self.tasks
            .transition(task_id, TaskStatus::Queued, TriggeredBy::User, Some("Retry"))
            .await
            .map_err(EngineError::Store)
    }

    async fn check_credentials(&self, strategy: ResearchStrategy) -> Result<(), String> {
        match strategy {
            ResearchStrategy::Standard
            | ResearchStrategy::Perplexity
            | ResearchStrategy::MultiModel => {
                if self.settings.has_openrouter_key().await {
                    Ok(())
                } else {
                    Err(OPENROUTER_KEY_MISSING.to_string())
                }
            }
            ResearchStrategy::OpenaiDeep => {
                if self.settings.has_openai_key().await {
                    Ok(())
                } else {
                    Err(OPENAI_KEY_MISSING.to_string())
                }
            }
        }
    }

    async fn openrouter_client(&self) -> Result<OpenRouterClient, String> {
        let key = self
            .settings
            .openrouter_api_key()
            .await
            .ok_or_else(|| OPENROUTER_KEY_MISSING.to_string())?;
        Ok(OpenRouterClient::with_base_url(key, self.chat_url.clone()))
    }

    /// Standard strategy: the tool loop.
    async fn run_standard(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, String> {
        let client = self.openrouter_client().await?;
        let config = &task.execution_config;
        let start_steps = task.execution_steps;
        let mut messages = self.seed_standard_messages(task).await?;
        let mut full_content = String::new();

        for round in 1..=MAX_TOOL_ROUNDS {
            let options = ChatOptions {
                temperature: Some(config.temperature),
                max_tokens: Some(config.max_tokens),
                tools: Some(tool_definitions()),
            };
            let stream =
                client.stream_chat(&config.model_id, messages.clone(), options, cancel.clone());
            let round_output = self
                .consume_stream(task.id, &config.model_id, stream)
                .await?;
            if cancel.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }
            full_content.push_str(&round_output.content);

            if round_output.tool_calls.is_empty() {
                let mut message = ConversationMessage::new(
                    task.conversation_id,
                    MessageRole::Assistant,
                    full_content.clone(),
                );
                message.model_id = Some(config.model_id.clone());
                self.conversations.append(message).await?;

                self.tasks
                    .update(
                        task.id,
                        TaskPatch {
                            result: Some(full_content.clone()),
                            result_summary: Some(summarize(&full_content)),
                            execution_steps: Some(start_steps + round),
                            ..Default::default()
                        },
                    )
                    .await?;
                self.tasks
                    .transition(
                        task.id,
                        TaskStatus::UnderReview,
                        TriggeredBy::Agent,
                        Some("Task complete"),
                    )
                    .await?;
                return Ok(RunOutcome::Completed);
            }

            tracing::debug!(
                task = %task.id,
                round,
                calls = round_output.tool_calls.len(),
                "Dispatching tool calls"
            );

            let recorded: Vec<RecordedToolCall> = round_output
                .tool_calls
                .iter()
                .map(|call| RecordedToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: serde_json::from_str(&call.arguments)
                        .unwrap_or(serde_json::Value::Null),
                })
                .collect();
            let mut message = ConversationMessage::new(
                task.conversation_id,
                MessageRole::Assistant,
                round_output.content.clone(),
            )
            .with_tool_calls(recorded);
            message.model_id = Some(config.model_id.clone());
            self.conversations.append(message).await?;

            let llm_calls: Vec<ToolCall> = round_output
                .tool_calls
                .iter()
                .map(|call| ToolCall {
                    id: call.id.clone(),
                    call_type: "function".to_string(),
                    function: FunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect();
            messages.push(ChatMessage::assistant_with_tool_calls(
                round_output.content.clone(),
                llm_calls,
            ));

            for call in &round_output.tool_calls {
                let action = dispatch_tool_call(call);
                self.handle_tool_call(task, call, &action).await?;
                match action.reply() {
                    Some(reply) => {
                        messages.push(ChatMessage::tool_result(call.id.clone(), reply));
                    }
                    // A pause unwinds mid-round: later calls stay unprocessed
                    // and the pausing call gets no tool message.
                    None => return Ok(RunOutcome::Paused),
                }
            }
        }

        let mut message = ConversationMessage::new(
            task.conversation_id,
            MessageRole::Assistant,
            full_content.clone(),
        );
        message.model_id = Some(config.model_id.clone());
        self.conversations.append(message).await?;

        self.tasks
            .update(
                task.id,
                TaskPatch {
                    result: Some(full_content),
                    execution_steps: Some(start_steps + MAX_TOOL_ROUNDS),
                    ..Default::default()
                },
            )
            .await?;
        self.tasks
            .transition(
                task.id,
                TaskStatus::UnderReview,
                TriggeredBy::Agent,
                Some("Max iterations reached"),
            )
            .await?;
        Ok(RunOutcome::Completed)
    }

    /// Perplexity strategy: one streamed call to the deep-research model.
    async fn run_perplexity(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, String> {
        let client = self.openrouter_client().await?;
        let config = &task.execution_config;
        let messages = vec![
            ChatMessage::new(Role::System, PERPLEXITY_RESEARCH_SYSTEM),
            ChatMessage::new(Role::User, build_research_prompt(task)),
        ];
        let options = ChatOptions {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            tools: None,
        };

        let stream = client.stream_chat(SONAR_DEEP_RESEARCH_MODEL, messages, options, cancel.clone());
        let output = self
            .consume_stream(task.id, SONAR_DEEP_RESEARCH_MODEL, stream)
            .await?;
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        self.finish_research(task, output.content, None, 1, "Research complete")
            .await?;
        Ok(RunOutcome::Completed)
    }

    /// OpenAI deep-research strategy: one non-streaming request, raced
    /// against the run's cancellation token.
    async fn run_openai_deep(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, String> {
        let key = self
            .settings
            .openai_api_key()
            .await
            .ok_or_else(|| OPENAI_KEY_MISSING.to_string())?;
        let client = OpenAiResponsesClient::with_base_url(key, self.responses_url.clone());
        let prompt = build_research_prompt(task);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(RunOutcome::Cancelled),
            result = client.deep_research(&prompt) => {
                result.map_err(|e| e.message)?
            }
        };

        self.finish_research(task, result, None, 1, "Deep research complete")
            .await?;
        Ok(RunOutcome::Completed)
    }

    /// Multi-model strategy: research pass, then synthesis with the task's
    /// own model.
    async fn run_multi_model(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, String> {
        let client = self.openrouter_client().await?;
        let config = &task.execution_config;

        self.status
            .set_streaming_content(task.id, "--- Step 1: Gathering research via Perplexity ---\n\n")
            .await;
        let research_messages = vec![
            ChatMessage::new(Role::System, MULTI_MODEL_RESEARCH_SYSTEM),
            ChatMessage::new(Role::User, build_research_prompt(task)),
        ];
        let research_options = ChatOptions {
            temperature: Some(0.3),
            max_tokens: Some(4096),
            tools: None,
        };
        let stream = client.stream_chat(
            SONAR_PRO_MODEL,
            research_messages,
            research_options,
            cancel.clone(),
        );
        let research = self.consume_stream(task.id, SONAR_PRO_MODEL, stream).await?;
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        self.status
            .append_streaming_content(
                task.id,
                &format!("\n\n--- Step 2: Synthesizing with {} ---\n\n", config.model_id),
            )
            .await;
        let synthesis_messages = vec![
            ChatMessage::new(Role::System, SYNTHESIS_SYSTEM),
            ChatMessage::new(
                Role::User,
                build_synthesis_prompt(&task.title, &research.content),
            ),
        ];
        let synthesis_options = ChatOptions {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            tools: None,
        };
        let stream = client.stream_chat(
            &config.model_id,
            synthesis_messages,
            synthesis_options,
            cancel.clone(),
        );
        let synthesis = self
            .consume_stream(task.id, &config.model_id, stream)
            .await?;
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        let full = format!(
            "## Research\n\n{}\n\n---\n\n## Synthesis\n\n{}",
            research.content, synthesis.content
        );
        self.finish_research(
            task,
            full,
            Some(&synthesis.content),
            2,
            "Multi-model research complete",
        )
        .await?;
        Ok(RunOutcome::Completed)
    }

    /// Seed the standard strategy's message list: system + task prompt,
    /// replayed user/assistant turns, and the latest not-yet-replayed human
    /// answer.
    async fn seed_standard_messages(&self, task: &Task) -> Result<Vec<ChatMessage>, String> {
        let mut messages = vec![
            ChatMessage::new(Role::System, build_system_prompt(task)),
            ChatMessage::new(Role::User, build_task_prompt(task)),
        ];

        let history = self.conversations.messages(task.conversation_id).await?;
        for recorded in &history {
            if recorded.content.is_empty() {
                continue;
            }
            let role = match recorded.role {
                MessageRole::User => Role::User,
                MessageRole::Assistant => Role::Assistant,
                // System turns are rebuilt fresh; tool turns only make sense
                // next to the tool_call_id they answered.
                MessageRole::System | MessageRole::Tool => continue,
            };
            messages.push(ChatMessage::new(role, recorded.content.clone()));
        }

        if let Some(latest) = task.human_inputs.last() {
            let replayed = history.iter().any(|m| m.content == latest.answer);
            if !latest.answer.is_empty() && !replayed {
                messages.push(ChatMessage::new(Role::User, latest.answer.clone()));
            }
        }

        Ok(messages)
    }

    /// Drain one streamed exchange, mirroring content into the live
    /// transcript and recording usage as it arrives.
    async fn consume_stream<S>(
        &self,
        task_id: TaskId,
        model_id: &str,
        stream: S,
    ) -> Result<RoundOutput, String>
    where
        S: Stream<Item = StreamEvent> + Send,
    {
        tokio::pin!(stream);
        let mut output = RoundOutput {
            content: String::new(),
            tool_calls: Vec::new(),
        };

        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::Content(chunk) => {
                    self.status.append_streaming_content(task_id, &chunk).await;
                    output.content.push_str(&chunk);
                }
                StreamEvent::ToolCall(call) => output.tool_calls.push(call),
                StreamEvent::Done { usage } => {
                    if let Some(usage) = usage {
                        self.record_usage(task_id, model_id, usage).await?;
                    }
                }
                StreamEvent::Error(message) => return Err(message),
            }
        }

        Ok(output)
    }

    /// Accumulate one exchange's token usage and cost onto the task and the
    /// spend ledger.
    async fn record_usage(
        &self,
        task_id: TaskId,
        model_id: &str,
        usage: Usage,
    ) -> Result<(), String> {
        let cost = estimate_cost(usage.prompt_tokens, usage.completion_tokens, model_id);

        let task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or_else(|| format!("Task {} not found", task_id))?;
        let mut totals = task.token_usage;
        totals.accumulate(usage.prompt_tokens, usage.completion_tokens, cost);
        self.tasks
            .update(
                task_id,
                TaskPatch {
                    token_usage: Some(totals),
                    ..Default::default()
                },
            )
            .await?;

        if let Err(e) = self.settings.add_spent(cost).await {
            tracing::warn!(task = %task_id, "Failed to persist spend ledger: {}", e);
        }
        tracing::debug!(
            task = %task_id,
            model = model_id,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            cost,
            "Recorded token usage"
        );
        Ok(())
    }

    /// Side effects of one dispatched tool call (the reply text itself is
    /// handled by the caller).
    async fn handle_tool_call(
        &self,
        task: &Task,
        call: &AccumulatedToolCall,
        action: &ToolAction,
    ) -> Result<(), String> {
        match action {
            ToolAction::RequestHumanInput { question } => {
                tracing::info!(task = %task.id, "Task paused awaiting human input");
                self.tasks
                    .update(
                        task.id,
                        TaskPatch {
                            pending_question: Some(Some(question.clone())),
                            ..Default::default()
                        },
                    )
                    .await?;
                self.tasks
                    .transition(
                        task.id,
                        TaskStatus::NeedsInput,
                        TriggeredBy::Agent,
                        Some("Needs human clarification"),
                    )
                    .await?;
                self.conversations
                    .append(ConversationMessage::new(
                        task.conversation_id,
                        MessageRole::Assistant,
                        format!("[Asking user]: {}", question),
                    ))
                    .await?;
            }
            ToolAction::SaveFinding(finding) => {
                tracing::info!(task = %task.id, summary = %finding.summary, "Research finding saved");
                self.conversations
                    .append(
                        ConversationMessage::new(
                            task.conversation_id,
                            MessageRole::Tool,
                            format!("[Finding saved]: {}", finding.summary),
                        )
                        .with_tool_result(RecordedToolResult {
                            tool_call_id: call.id.clone(),
                            name: call.name.clone(),
                            result: "Finding saved successfully.".to_string(),
                            error: None,
                        }),
                    )
                    .await?;
            }
            ToolAction::MarkComplete { summary } => {
                self.tasks
                    .update(
                        task.id,
                        TaskPatch {
                            result_summary: Some(summary.clone()),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
            ToolAction::Reply(_) => {}
        }
        Ok(())
    }

    /// Record the result of a research-style run and move it to review: the
    /// full text lands in the conversation and on the task.
    async fn finish_research(
        &self,
        task: &Task,
        result: String,
        summary_source: Option<&str>,
        steps_added: u32,
        reason: &str,
    ) -> Result<(), String> {
        self.conversations
            .append(ConversationMessage::new(
                task.conversation_id,
                MessageRole::Assistant,
                result.clone(),
            ))
            .await?;

        let summary = summarize(summary_source.unwrap_or(&result));
        self.tasks
            .update(
                task.id,
                TaskPatch {
                    result: Some(result),
                    result_summary: Some(summary),
                    execution_steps: Some(task.execution_steps + steps_added),
                    ..Default::default()
                },
            )
            .await?;
        self.tasks
            .transition(
                task.id,
                TaskStatus::UnderReview,
                TriggeredBy::Agent,
                Some(reason),
            )
            .await?;
        Ok(())
    }

    /// Record a missing-credential failure. The task goes to `failed` only
    /// where the transition table allows; otherwise it keeps its status with
    /// `last_error` set.
    async fn record_config_failure(&self, task: &Task, message: &str) {
        if let Err(e) = self
            .tasks
            .update(
                task.id,
                TaskPatch {
                    last_error: Some(message.to_string()),
                    ..Default::default()
                },
            )
            .await
        {
            tracing::warn!(task = %task.id, "Failed to record configuration error: {}", e);
        }
        if task.status.can_transition_to(TaskStatus::Failed) {
            if let Err(e) = self
                .tasks
                .transition(task.id, TaskStatus::Failed, TriggeredBy::Agent, Some(message))
                .await
            {
                tracing::warn!(task = %task.id, "Failed to mark task failed: {}", e);
            }
        }
    }

    /// Record a mid-run fault and move the task to `failed`.
    async fn record_run_failure(&self, task_id: TaskId, message: &str) {
        if let Err(e) = self
            .tasks
            .update(
                task_id,
                TaskPatch {
                    last_error: Some(message.to_string()),
                    ..Default::default()
                },
            )
            .await
        {
            tracing::warn!(task = %task_id, "Failed to record run error: {}", e);
        }
        if let Err(e) = self
            .tasks
            .transition(task_id, TaskStatus::Failed, TriggeredBy::Agent, Some(message))
            .await
        {
            tracing::warn!(task = %task_id, "Failed to mark task failed: {}", e);
        }
    }

    /// Unconditional end-of-run cleanup.
    async fn teardown(&self, task_id: TaskId) {
        self.status.mark_inactive(task_id).await;
        self.status.clear_streaming_content(task_id).await;
        remove_handle(task_id);
    }
}
