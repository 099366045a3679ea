//! Prompt construction for every execution strategy.
//!
//! All model-facing text lives here so the orchestrator stays free of
//! string templates. Builders take the task as-is; answered human input is
//! folded into the system prompt so a resumed run sees the full exchange.

use crate::task::Task;

/// System prompt for the single-shot research strategy.
pub const PERPLEXITY_RESEARCH_SYSTEM: &str =
    "You are a thorough research assistant. Provide comprehensive, well-sourced research reports.";

/// System prompt for the research step of the two-model pipeline.
pub const MULTI_MODEL_RESEARCH_SYSTEM: &str =
    "You are a research assistant. Gather comprehensive information on the topic. Include sources.";

/// System prompt for the synthesis step of the two-model pipeline.
pub const SYNTHESIS_SYSTEM: &str = "You are an expert analyst. You have been given raw research data on a topic. Your job is to synthesize this into a clear, well-structured report.";

/// System prompt for the standard tool loop.
///
/// Ends with the priority and review-depth lines; previously answered
/// questions are appended as a `## Previous Human Input` section when any
/// exist.
pub fn build_system_prompt(task: &Task) -> String {
    let mut prompt = format!(
        r#"You are an AI research and task assistant. You have been assigned a task to complete autonomously.

Your goal is to produce a thorough, well-researched result for the user.

## Guidelines
- Be thorough and comprehensive in your research and analysis
- If you need clarification from the user, use the request_human_input tool
- When you discover important findings, use save_finding to record them
- When you are done, use mark_complete with a brief summary
- Write your final output in clear, well-structured markdown
- Include sources and citations where applicable
- If you cannot complete the task, explain why and suggest next steps

## Task Priority: {}
## Review Depth Expected: {}
"#,
        task.priority, task.review_depth
    );

    if !task.human_inputs.is_empty() {
        let exchange: Vec<String> = task
            .human_inputs
            .iter()
            .map(|h| format!("Q: {}\nA: {}", h.question, h.answer))
            .collect();
        prompt.push_str(&format!("\n## Previous Human Input\n{}", exchange.join("\n\n")));
    }

    prompt
}

/// Opening user message: the title, with the description appended when
/// there is one.
pub fn build_task_prompt(task: &Task) -> String {
    let mut prompt = task.title.clone();
    if !task.description.is_empty() {
        prompt.push_str(&format!("\n\n{}", task.description));
    }
    prompt
}

/// User message for the research strategies.
pub fn build_research_prompt(task: &Task) -> String {
    let details = if task.description.is_empty() {
        String::new()
    } else {
        format!("\nDetails: {}", task.description)
    };
    format!(
        r#"Research the following topic thoroughly and provide a comprehensive report with sources and findings.

Topic: {}
{}

Please provide:
1. Key findings with supporting evidence
2. Different perspectives or viewpoints
3. Sources and references
4. A clear summary and conclusion
5. Any limitations or areas that need further investigation"#,
        task.title, details
    )
}

/// User message for the synthesis step, wrapping the gathered research.
pub fn build_synthesis_prompt(title: &str, research: &str) -> String {
    format!(
        r#"Here is the research gathered on the topic "{}":

{}

Please synthesize this into a comprehensive, well-organized report. Include key findings, analysis, and conclusions."#,
        title, research
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::HumanInput;

    #[test]
    fn test_system_prompt_names_all_three_tools() {
        let task = Task::new("Check something", "");
        let prompt = build_system_prompt(&task);
        assert!(prompt.contains("request_human_input"));
        assert!(prompt.contains("save_finding"));
        assert!(prompt.contains("mark_complete"));
    }

    #[test]
    fn test_system_prompt_states_priority_and_review_depth() {
        let task = Task::new("Check something", "");
        let prompt = build_system_prompt(&task);
        assert!(prompt.contains("## Task Priority: medium"));
        assert!(prompt.contains("## Review Depth Expected: standard"));
    }

    #[test]
    fn test_system_prompt_omits_human_input_section_when_empty() {
        let task = Task::new("Check something", "");
        assert!(!build_system_prompt(&task).contains("Previous Human Input"));
    }

    #[test]
    fn test_system_prompt_includes_answered_questions() {
        let mut task = Task::new("Check something", "");
        task.human_inputs.push(HumanInput::new("Which region?", "eu-west-1"));
        task.human_inputs.push(HumanInput::new("Which year?", "2024"));

        let prompt = build_system_prompt(&task);
        assert!(prompt.contains("## Previous Human Input"));
        assert!(prompt.contains("Q: Which region?\nA: eu-west-1\n\nQ: Which year?\nA: 2024"));
    }

    #[test]
    fn test_task_prompt_with_and_without_description() {
        let bare = Task::new("Write a haiku", "");
        assert_eq!(build_task_prompt(&bare), "Write a haiku");

        let detailed = Task::new("Write a haiku", "About autumn rain.");
        assert_eq!(build_task_prompt(&detailed), "Write a haiku\n\nAbout autumn rain.");
    }

    #[test]
    fn test_research_prompt_includes_details_line_only_with_description() {
        let bare = Task::new("Rust adoption", "");
        let prompt = build_research_prompt(&bare);
        assert!(prompt.contains("Topic: Rust adoption\n"));
        assert!(!prompt.contains("Details:"));

        let detailed = Task::new("Rust adoption", "Focus on embedded.");
        assert!(build_research_prompt(&detailed).contains("\nDetails: Focus on embedded."));
    }

    #[test]
    fn test_synthesis_prompt_embeds_title_and_research() {
        let prompt = build_synthesis_prompt("Solar trends", "finding one");
        assert!(prompt.starts_with("Here is the research gathered on the topic \"Solar trends\":"));
        assert!(prompt.contains("\n\nfinding one\n\n"));
        assert!(prompt.ends_with("Include key findings, analysis, and conclusions."));
    }
}
