//! Agent-facing tools for the standard execution loop.
//!
//! Three tools are exposed to the model: asking the user a question,
//! recording a research finding, and declaring the task complete. Dispatch
//! never fails — malformed arguments and unknown names come back as plain
//! replies so the model can correct itself on the next round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::llm::{AccumulatedToolCall, FunctionDefinition, ToolDefinition};

pub const REQUEST_HUMAN_INPUT: &str = "request_human_input";
pub const SAVE_FINDING: &str = "save_finding";
pub const MARK_COMPLETE: &str = "mark_complete";

/// Confidence the model attaches to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A discovery recorded through the `save_finding` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFinding {
    pub id: Uuid,
    pub summary: String,
    pub detail: String,
    pub sources: Vec<String>,
    pub confidence: Confidence,
    pub timestamp: DateTime<Utc>,
}

/// What the orchestrator must do after decoding one tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    /// Feed the text back to the model and keep looping.
    Reply(String),
    /// Record the finding, note it in the transcript, and keep looping.
    SaveFinding(ResearchFinding),
    /// Stamp the result summary and keep looping; the model signals the
    /// actual end by stopping its tool calls.
    MarkComplete { summary: String },
    /// Stop the loop and wait for the user. Carries no reply: the pausing
    /// call gets no tool message.
    RequestHumanInput { question: String },
}

impl ToolAction {
    /// The text fed back to the model, when the loop continues.
    pub fn reply(&self) -> Option<String> {
        match self {
            ToolAction::Reply(text) => Some(text.clone()),
            ToolAction::SaveFinding(_) => Some("Finding saved successfully.".to_string()),
            ToolAction::MarkComplete { .. } => Some("Task marked as complete.".to_string()),
            ToolAction::RequestHumanInput { .. } => None,
        }
    }
}

/// Decode one accumulated tool call into the action it demands.
pub fn dispatch_tool_call(call: &AccumulatedToolCall) -> ToolAction {
    let args: Value = match serde_json::from_str(&call.arguments) {
        Ok(v) => v,
        Err(_) => return ToolAction::Reply("Error: Invalid JSON arguments".to_string()),
    };

    match call.name.as_str() {
        REQUEST_HUMAN_INPUT => ToolAction::RequestHumanInput {
            question: string_arg(&args, "question"),
        },
        SAVE_FINDING => ToolAction::SaveFinding(ResearchFinding {
            id: Uuid::new_v4(),
            summary: string_arg(&args, "summary"),
            detail: string_arg(&args, "detail"),
            sources: args
                .get("sources")
                .and_then(Value::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            confidence: parse_confidence(args.get("confidence").and_then(Value::as_str)),
            timestamp: Utc::now(),
        }),
        MARK_COMPLETE => ToolAction::MarkComplete {
            summary: string_arg(&args, "summary"),
        },
        other => ToolAction::Reply(format!("Unknown tool: {}", other)),
    }
}

fn string_arg(args: &Value, key: &str) -> String {
    args.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Out-of-range or missing confidence collapses to medium.
fn parse_confidence(value: Option<&str>) -> Confidence {
    match value {
        Some("low") => Confidence::Low,
        Some("high") => Confidence::High,
        _ => Confidence::Medium,
    }
}

/// The tool schemas advertised on every standard-loop request.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: REQUEST_HUMAN_INPUT.to_string(),
                description: "Ask the human user a clarifying question when you need more \
                              information to proceed. This will pause your execution until the \
                              user responds."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "The question to ask the user"
                        },
                        "context": {
                            "type": "string",
                            "description": "Why you need this information"
                        }
                    },
                    "required": ["question"]
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: SAVE_FINDING.to_string(),
                description: "Record a research finding for later synthesis. Use this to save \
                              important discoveries as you research."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "summary": {
                            "type": "string",
                            "description": "Brief summary of the finding"
                        },
                        "detail": {
                            "type": "string",
                            "description": "Detailed explanation"
                        },
                        "sources": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Source URLs if any"
                        },
                        "confidence": {
                            "type": "string",
                            "enum": ["low", "medium", "high"],
                            "description": "How confident you are in this finding"
                        }
                    },
                    "required": ["summary", "detail"]
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: MARK_COMPLETE.to_string(),
                description: "Signal that you have completed the task and your response contains \
                              the final result. Call this when you are done."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "summary": {
                            "type": "string",
                            "description": "A one-sentence summary of what you produced"
                        }
                    },
                    "required": ["summary"]
                }),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: &str) -> AccumulatedToolCall {
        AccumulatedToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_definitions_cover_all_three_tools() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.function.name.as_str()).collect();
        assert_eq!(names, vec![REQUEST_HUMAN_INPUT, SAVE_FINDING, MARK_COMPLETE]);
        assert!(defs.iter().all(|d| d.tool_type == "function"));
    }

    #[test]
    fn test_definitions_mark_required_parameters() {
        let defs = tool_definitions();
        let required = |i: usize| defs[i].function.parameters["required"].clone();
        assert_eq!(required(0), json!(["question"]));
        assert_eq!(required(1), json!(["summary", "detail"]));
        assert_eq!(required(2), json!(["summary"]));
    }

    #[test]
    fn test_invalid_json_arguments() {
        let action = dispatch_tool_call(&call(SAVE_FINDING, "{not json"));
        assert_eq!(action, ToolAction::Reply("Error: Invalid JSON arguments".to_string()));
    }

    #[test]
    fn test_empty_arguments_are_invalid() {
        let action = dispatch_tool_call(&call(MARK_COMPLETE, ""));
        assert_eq!(action, ToolAction::Reply("Error: Invalid JSON arguments".to_string()));
    }

    #[test]
    fn test_unknown_tool_reply() {
        let action = dispatch_tool_call(&call("send_email", "{}"));
        assert_eq!(action, ToolAction::Reply("Unknown tool: send_email".to_string()));
        assert_eq!(action.reply().unwrap(), "Unknown tool: send_email");
    }

    #[test]
    fn test_request_human_input_carries_question_and_no_reply() {
        let action = dispatch_tool_call(&call(
            REQUEST_HUMAN_INPUT,
            "{\"question\":\"Which city?\",\"context\":\"ambiguous\"}",
        ));
        assert_eq!(
            action,
            ToolAction::RequestHumanInput {
                question: "Which city?".to_string()
            }
        );
        assert!(action.reply().is_none());
    }

    #[test]
    fn test_request_human_input_missing_question_defaults_empty() {
        let action = dispatch_tool_call(&call(REQUEST_HUMAN_INPUT, "{}"));
        assert_eq!(
            action,
            ToolAction::RequestHumanInput {
                question: String::new()
            }
        );
    }

    #[test]
    fn test_save_finding_parses_fields() {
        let action = dispatch_tool_call(&call(
            SAVE_FINDING,
            "{\"summary\":\"s\",\"detail\":\"d\",\"sources\":[\"a\",\"b\"],\"confidence\":\"high\"}",
        ));
        let ToolAction::SaveFinding(finding) = action else {
            panic!("expected SaveFinding");
        };
        assert_eq!(finding.summary, "s");
        assert_eq!(finding.detail, "d");
        assert_eq!(finding.sources, vec!["a", "b"]);
        assert_eq!(finding.confidence, Confidence::High);
    }

    #[test]
    fn test_save_finding_clamps_bad_confidence_to_medium() {
        let action = dispatch_tool_call(&call(
            SAVE_FINDING,
            "{\"summary\":\"s\",\"detail\":\"d\",\"confidence\":\"certain\"}",
        ));
        let ToolAction::SaveFinding(finding) = action else {
            panic!("expected SaveFinding");
        };
        assert_eq!(finding.confidence, Confidence::Medium);
        assert!(finding.sources.is_empty());
    }

    #[test]
    fn test_save_finding_reply_text() {
        let action = dispatch_tool_call(&call(SAVE_FINDING, "{\"summary\":\"s\",\"detail\":\"d\"}"));
        assert_eq!(action.reply().unwrap(), "Finding saved successfully.");
    }

    #[test]
    fn test_mark_complete_carries_summary() {
        let action = dispatch_tool_call(&call(MARK_COMPLETE, "{\"summary\":\"built the report\"}"));
        assert_eq!(
            action,
            ToolAction::MarkComplete {
                summary: "built the report".to_string()
            }
        );
        assert_eq!(action.reply().unwrap(), "Task marked as complete.");
    }
}
