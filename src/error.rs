use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChorusError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("provider '{provider}' timed out after {elapsed_ms}ms")]
    Timeout { provider: String, elapsed_ms: u64 },

    #[error("config load error: {0}")]
    ConfigLoad(String),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("knowledge table error: {0}")]
    KnowledgeLoad(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChorusError {
    /// Text safe to show a caller. Only `InvalidInput` echoes its detail;
    /// everything else stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(detail) => detail.clone(),
            _ => "Sorry, something went wrong while preparing a response. Please try again."
                .to_owned(),
        }
    }

    /// Client-fixable errors. Drives the 4xx/5xx split in the HTTP surface.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
