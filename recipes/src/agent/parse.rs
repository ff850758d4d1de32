//! Parser for the free-text "Thought / Action / Final Answer" reply format.

pub const USE_TOOL_MARKER: &str = "Thought: Do I need to use a tool? Yes";
pub const NO_TOOL_MARKER: &str = "Thought: Do I need to use a tool? No";

const ACTION: &str = "Action: ";
const ACTION_INPUT: &str = "Action Input: ";
const FINAL_ANSWER: &str = "Final Answer: ";

/// What the model decided in one `call_agent` turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentDecision {
    UseTool { tool: String, input: String },
    FinalAnswer(String),
    Undetermined,
}

fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_suffix("```").unwrap_or(text).trim_end();
    let text = text.strip_prefix("```").unwrap_or(text);
    text.trim()
}

fn after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.find(marker).map(|i| &text[i + marker.len()..])
}

/// Classifies a model reply. The tool marker wins when both appear.
pub fn parse_agent_reply(text: &str) -> AgentDecision {
    if text.contains(USE_TOOL_MARKER) {
        let tool = after(text, ACTION)
            .map(|rest| rest.split('\n').next().unwrap_or(rest).trim())
            .unwrap_or_default();
        let input = after(text, ACTION_INPUT).map(strip_fences).unwrap_or_default();
        return AgentDecision::UseTool {
            tool: tool.to_string(),
            input: input.to_string(),
        };
    }
    if let Some(rest) = after(text, NO_TOOL_MARKER) {
        let answer = after(rest, FINAL_ANSWER).unwrap_or(rest);
        return AgentDecision::FinalAnswer(strip_fences(answer).to_string());
    }
    AgentDecision::Undetermined
}
