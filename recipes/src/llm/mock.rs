//! Mock LLM for tests: scripted replies and a record of every call.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, ToolCall};
use crate::message::Message;
use crate::tool_source::ToolSpec;

/// Replies with scripted responses in order; the last one repeats once the
/// script runs out. Every invocation's message list is recorded.
///
/// **Interaction**: Stands in for `ChatOllama` in node and agent tests.
pub struct MockLlm {
    script: Mutex<VecDeque<LlmResponse>>,
    last: Mutex<LlmResponse>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            last: Mutex::new(LlmResponse::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Text-only replies.
    pub fn with_replies<I, T>(replies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(replies.into_iter().map(LlmResponse::text).collect())
    }

    /// First reply requests `calls`, the next one is plain `then` text.
    pub fn tool_calls_then(calls: Vec<ToolCall>, then: impl Into<String>) -> Self {
        Self::new(vec![
            LlmResponse {
                tool_calls: calls,
                ..LlmResponse::default()
            },
            LlmResponse::text(then),
        ])
    }

    /// Message lists received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next_response(&self, messages: &[Message]) -> LlmResponse {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = self.script.lock().unwrap_or_else(|e| e.into_inner()).pop_front() {
            *last = next;
        }
        last.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        Ok(self.next_response(messages))
    }

    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        Ok(self.next_response(messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Replies come back in order, the last repeats, and calls are recorded.
    #[tokio::test]
    async fn replays_script_then_repeats_last() {
        let llm = MockLlm::with_replies(["one", "two"]);
        let msgs = [Message::user("q")];
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "one");
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "two");
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "two");
        assert_eq!(llm.call_count(), 3);
        assert_eq!(llm.calls()[0], vec![Message::user("q")]);
    }
}
