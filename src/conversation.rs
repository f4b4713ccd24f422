use serde::{Deserialize, Serialize};

use crate::error::ChorusError;

/// Number of trailing history entries a request carries by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Speaker of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One incoming call: a non-empty message plus the trailing history.
///
/// Fields are private so the non-empty and history-bound invariants hold
/// for every value that exists.
#[derive(Debug, Clone)]
pub struct RequestContext {
    message: String,
    history: Vec<Turn>,
}

impl RequestContext {
    /// Validate the message and keep only the last `history_limit` turns.
    pub fn new(
        message: &str,
        history: &[Turn],
        history_limit: usize,
    ) -> Result<Self, ChorusError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChorusError::InvalidInput(
                "message must not be empty".to_owned(),
            ));
        }

        let start = history.len().saturating_sub(history_limit);
        Ok(Self {
            message: message.to_owned(),
            history: history[start..].to_vec(),
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }
}

/// Most recent user turn in `history`, if any.
pub fn last_user_message(history: &[Turn]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|t| t.role == Role::User)
        .map(|t| t.content.as_str())
}

/// Where a final answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum AnswerSource {
    Provider(String),
    Fallback,
}

/// The single answer produced per request. Never empty.
///
/// Construction is crate-private; the assembler is the only producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalAnswer {
    text: String,
    source: AnswerSource,
}

impl FinalAnswer {
    pub(crate) fn new(text: String, source: AnswerSource) -> Self {
        debug_assert!(!text.trim().is_empty());
        Self { text, source }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &AnswerSource {
        &self.source
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("question {i}"))
                } else {
                    Turn::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn empty_message_rejected() {
        let err = RequestContext::new("", &[], DEFAULT_HISTORY_LIMIT).unwrap_err();
        assert!(matches!(err, ChorusError::InvalidInput(_)));
    }

    #[test]
    fn whitespace_message_rejected() {
        let err = RequestContext::new("  \n\t ", &[], DEFAULT_HISTORY_LIMIT).unwrap_err();
        assert!(matches!(err, ChorusError::InvalidInput(_)));
    }

    #[test]
    fn message_is_trimmed() {
        let ctx = RequestContext::new("  hello  ", &[], DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(ctx.message(), "hello");
    }

    #[test]
    fn history_keeps_last_ten() {
        let history = history_of(15);
        let ctx = RequestContext::new("next", &history, DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(ctx.history().len(), 10);
        assert_eq!(ctx.history()[0].content, "answer 5");
        assert_eq!(ctx.history()[9].content, "question 14");
    }

    #[test]
    fn short_history_untouched() {
        let history = history_of(3);
        let ctx = RequestContext::new("next", &history, DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(ctx.history(), history.as_slice());
    }

    #[test]
    fn last_user_message_skips_assistant_turns() {
        let history = history_of(4);
        assert_eq!(last_user_message(&history), Some("question 2"));
        assert_eq!(last_user_message(&[Turn::assistant("hello")]), None);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
