//! Chat prompt templates: role-tagged `{variable}` templates plus message placeholders.
//!
//! A [`ChatPromptTemplate`] is an ordered list of parts. Template parts become one
//! message each after substitution; placeholder parts splice in a whole message list
//! (e.g. the running conversation). `{{` and `}}` write literal braces.
//!
//! ```rust
//! use std::collections::HashMap;
//! use recipes::prompt::ChatPromptTemplate;
//! use recipes::Message;
//!
//! let prompt = ChatPromptTemplate::from_messages([
//!     ("system", "You are a helpful assistant that translates {input_language} to {output_language}."),
//!     ("human", "{input}"),
//! ])
//! .unwrap();
//! let vars: HashMap<String, String> = [
//!     ("input_language", "English"),
//!     ("output_language", "Bengali"),
//!     ("input", "how are you?"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//! let messages = prompt.format_messages(&vars).unwrap();
//! assert_eq!(messages[1], Message::user("how are you?"));
//! ```

use std::collections::HashMap;

use thiserror::Error;

use crate::message::Message;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("missing prompt variable: {0}")]
    MissingVariable(String),
    #[error("missing messages placeholder: {0}")]
    MissingPlaceholder(String),
    #[error("unknown prompt role: {0}")]
    UnknownRole(String),
    #[error("unclosed '{{' in template: {0}")]
    Unclosed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    System,
    Human,
    Ai,
}

impl Role {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Some(Self::System),
            "human" | "user" => Some(Self::Human),
            "ai" | "assistant" => Some(Self::Ai),
            _ => None,
        }
    }

    fn message(self, content: String) -> Message {
        match self {
            Self::System => Message::System(content),
            Self::Human => Message::User(content),
            Self::Ai => Message::Assistant(content),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

fn parse_template(template: &str) -> Result<Vec<Segment>, PromptError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(PromptError::Unclosed(template.to_string()));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Var(name.trim().to_string()));
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[derive(Clone, Debug)]
enum PromptPart {
    Template { role: Role, segments: Vec<Segment> },
    Placeholder(String),
}

/// Ordered chat prompt: role templates and message placeholders.
#[derive(Clone, Debug, Default)]
pub struct ChatPromptTemplate {
    parts: Vec<PromptPart>,
}

impl ChatPromptTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from `(role, template)` pairs. Role `"placeholder"` with template
    /// `"{name}"` declares a messages placeholder.
    pub fn from_messages<'a, I>(parts: I) -> Result<Self, PromptError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut prompt = Self::new();
        for (role, template) in parts {
            prompt = prompt.with_message(role, template)?;
        }
        Ok(prompt)
    }

    /// Appends one role template.
    pub fn with_message(mut self, role: &str, template: &str) -> Result<Self, PromptError> {
        if role.eq_ignore_ascii_case("placeholder") {
            let name = template
                .trim()
                .trim_start_matches('{')
                .trim_end_matches('}')
                .trim();
            return Ok(self.with_placeholder(name));
        }
        let role = Role::parse(role).ok_or_else(|| PromptError::UnknownRole(role.to_string()))?;
        self.parts.push(PromptPart::Template {
            role,
            segments: parse_template(template)?,
        });
        Ok(self)
    }

    /// Appends a messages placeholder filled at `format` time.
    pub fn with_placeholder(mut self, name: impl Into<String>) -> Self {
        self.parts.push(PromptPart::Placeholder(name.into()));
        self
    }

    /// Variable names in first-appearance order (placeholders excluded).
    pub fn input_variables(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for part in &self.parts {
            if let PromptPart::Template { segments, .. } = part {
                for seg in segments {
                    if let Segment::Var(name) = seg {
                        if !out.contains(name) {
                            out.push(name.clone());
                        }
                    }
                }
            }
        }
        out
    }

    /// Renders messages; every referenced variable and placeholder must be supplied.
    pub fn format(
        &self,
        vars: &HashMap<String, String>,
        placeholders: &HashMap<String, Vec<Message>>,
    ) -> Result<Vec<Message>, PromptError> {
        let mut messages = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            match part {
                PromptPart::Template { role, segments } => {
                    let mut text = String::new();
                    for seg in segments {
                        match seg {
                            Segment::Literal(s) => text.push_str(s),
                            Segment::Var(name) => {
                                let value = vars
                                    .get(name)
                                    .ok_or_else(|| PromptError::MissingVariable(name.clone()))?;
                                text.push_str(value);
                            }
                        }
                    }
                    messages.push(role.message(text));
                }
                PromptPart::Placeholder(name) => {
                    let list = placeholders
                        .get(name)
                        .ok_or_else(|| PromptError::MissingPlaceholder(name.clone()))?;
                    messages.extend(list.iter().cloned());
                }
            }
        }
        Ok(messages)
    }

    /// `format` without placeholders.
    pub fn format_messages(&self, vars: &HashMap<String, String>) -> Result<Vec<Message>, PromptError> {
        self.format(vars, &HashMap::new())
    }
}

/// Builds a variables map from `(name, value)` pairs.
pub fn vars<K, V, I>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
