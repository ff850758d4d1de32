//! One-shot chat and the translation chain.

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompt::{vars, ChatPromptTemplate};

pub const DEFAULT_SYSTEM: &str = "You are an experienced stock market analyst.";
pub const DEFAULT_QUESTION: &str = "What are the top 5 stock symbols?";

const TRANSLATE_SYSTEM: &str =
    "You are a helpful assistant that translates {input_language} to {output_language}.";

/// System + user message → model reply text.
pub async fn chat(llm: &dyn LlmClient, system: &str, user: &str) -> Result<String, AgentError> {
    let messages = [Message::system(system), Message::user(user)];
    Ok(llm.invoke(&messages).await?.content)
}

pub fn translate_prompt() -> Result<ChatPromptTemplate, AgentError> {
    Ok(ChatPromptTemplate::from_messages([
        ("system", TRANSLATE_SYSTEM),
        ("human", "{input}"),
    ])?)
}

/// Translates `input` from `from` to `to`.
pub async fn translate(
    llm: &dyn LlmClient,
    input: &str,
    from: &str,
    to: &str,
) -> Result<String, AgentError> {
    let messages = translate_prompt()?.format_messages(&vars([
        ("input", input),
        ("input_language", from),
        ("output_language", to),
    ]))?;
    Ok(llm.invoke(&messages).await?.content)
}
