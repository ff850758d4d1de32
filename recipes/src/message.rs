//! Chat message type: system, user, or assistant text.

use serde::{Deserialize, Serialize};

/// One chat message. Graph states keep a `Vec<Message>` as the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    System(String),
    User(String),
    Assistant(String),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Wire role name, as used by Ollama's chat API.
    pub fn role(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::User(_) => "user",
            Self::Assistant(_) => "assistant",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System(s) | Self::User(s) | Self::Assistant(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_and_content_match_variant() {
        let m = Message::assistant("hi");
        assert_eq!(m.role(), "assistant");
        assert_eq!(m.content(), "hi");
        assert_eq!(Message::system("s").role(), "system");
        assert_eq!(Message::user("u").role(), "user");
    }

    #[test]
    fn serializes_with_role_tag() {
        let v = serde_json::to_value(Message::user("hello")).unwrap();
        assert_eq!(v, serde_json::json!({"role": "user", "content": "hello"}));
        let back: Message = serde_json::from_value(v).unwrap();
        assert_eq!(back, Message::user("hello"));
    }
}
