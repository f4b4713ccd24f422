pub mod gemini;
pub mod huggingface;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::conversation::{RequestContext, Role};
use crate::error::ChorusError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire shape spoken by a provider endpoint.
/// Enum: the set of shapes is known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    HuggingFace,
}

impl ProviderKind {
    /// Every kind, in default priority order.
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Gemini, Self::HuggingFace];

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::HuggingFace => "huggingface",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn default_priority(self) -> u8 {
        match self {
            Self::OpenAi => 0,
            Self::Gemini => 1,
            Self::HuggingFace => 2,
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
            Self::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
            }
            Self::HuggingFace => {
                "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.2"
            }
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Gemini => "gemini-1.5-flash",
            Self::HuggingFace => "mistralai/Mistral-7B-Instruct-v0.2",
        }
    }

    pub fn default_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::HuggingFace => "HUGGINGFACE_API_KEY",
        }
    }
}

/// Result of asking one provider during one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutcome {
    pub provider: String,
    pub priority: u8,
    pub text: String,
    pub succeeded: bool,
}

impl ProviderOutcome {
    pub fn success(provider: &str, priority: u8, text: String) -> Self {
        Self {
            provider: provider.to_owned(),
            priority,
            text,
            succeeded: true,
        }
    }

    pub fn failure(provider: &str, priority: u8) -> Self {
        Self {
            provider: provider.to_owned(),
            priority,
            text: String::new(),
            succeeded: false,
        }
    }
}

/// Extension point for text-generation backends. The dispatcher only sees
/// this trait, so tests substitute fakes.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Fixed rank; lower is preferred.
    fn priority(&self) -> u8;

    async fn complete(&self, ctx: &RequestContext) -> Result<String, ChorusError>;
}

/// A provider reached over HTTP. Request and response shapes come from
/// `config.kind`.
pub struct HttpProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn fail(&self, detail: impl std::fmt::Display) -> ChorusError {
        ChorusError::Provider(format!("{}: {detail}", self.config.name))
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn priority(&self) -> u8 {
        self.config.priority
    }

    async fn complete(&self, ctx: &RequestContext) -> Result<String, ChorusError> {
        let key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| self.fail("no credential configured"))?;

        let body = match self.config.kind {
            ProviderKind::OpenAi => openai::build_body(&self.config, ctx),
            ProviderKind::Gemini => gemini::build_body(&self.config, ctx),
            ProviderKind::HuggingFace => huggingface::build_body(&self.config, ctx),
        };

        let request = self.client.post(self.config.endpoint.clone()).json(&body);
        let request = match self.config.kind {
            ProviderKind::Gemini => request.header("x-goog-api-key", key.expose_secret()),
            ProviderKind::OpenAi | ProviderKind::HuggingFace => {
                request.bearer_auth(key.expose_secret())
            }
        };

        debug!(
            provider = %self.config.name,
            model = %self.config.model,
            "sending completion request"
        );

        let response = request
            .send()
            .await
            .map_err(|e| self.fail(e))?
            .error_for_status()
            .map_err(|e| self.fail(e))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.fail(format!("malformed body: {e}")))?;

        let text = match self.config.kind {
            ProviderKind::OpenAi => openai::extract_text(&payload),
            ProviderKind::Gemini => gemini::extract_text(&payload),
            ProviderKind::HuggingFace => huggingface::extract_text(&payload),
        };

        text.ok_or_else(|| self.fail("response has no text at the expected path"))
    }
}

/// Build one `HttpProvider` per enabled config, sharing a single HTTP client.
/// Disabled configs are skipped and never contacted.
pub fn build_providers(
    configs: &[ProviderConfig],
) -> Result<Vec<Arc<dyn Provider>>, ChorusError> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ChorusError::Internal(format!("cannot build http client: {e}")))?;

    Ok(configs
        .iter()
        .filter(|c| c.enabled())
        .map(|c| Arc::new(HttpProvider::new(c.clone(), client.clone())) as Arc<dyn Provider>)
        .collect())
}

/// Role names used by chat-style request bodies.
pub(crate) fn chat_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ProviderKind::from_name("anthropic"), None);
    }

    #[test]
    fn default_priorities_are_distinct_and_ordered() {
        let priorities: Vec<_> = ProviderKind::ALL.iter().map(|k| k.default_priority()).collect();
        assert_eq!(priorities, [0, 1, 2]);
    }

    #[test]
    fn failure_outcome_has_empty_text() {
        let outcome = ProviderOutcome::failure("openai", 0);
        assert!(!outcome.succeeded);
        assert!(outcome.text.is_empty());
    }

    #[test]
    fn only_enabled_configs_are_built() {
        let env = |key: &str| (key == "OPENAI_API_KEY").then(|| "k".to_owned());
        let settings = crate::config::Settings::parse("", &env).unwrap();
        let providers = build_providers(&settings.providers).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "openai");
    }
}
