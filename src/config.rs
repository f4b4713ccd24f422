use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::conversation::DEFAULT_HISTORY_LIMIT;
use crate::error::ChorusError;
use crate::fallback::knowledge::MatcherTuning;
use crate::providers::ProviderKind;

const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024; // 64 KiB

/// Environment variable naming the settings file.
pub const CONFIG_PATH_ENV: &str = "CHORUS_CONFIG";

pub const DEFAULT_TIMEOUT_MS: u64 = 8000;
pub const DEFAULT_MIN_ANSWER_CHARS: usize = 10;
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer clearly and concisely in plain language.";

// --- TOML deserialization structs (private, map 1:1 to the file schema) ---

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    dispatch: DispatchFile,
    #[serde(default)]
    history: HistoryFile,
    #[serde(default)]
    matcher: MatcherFile,
    #[serde(default)]
    fallback: FallbackFile,
    #[serde(default)]
    logging: LoggingFile,
    #[serde(default)]
    server: ServerFile,
    #[serde(default)]
    providers: HashMap<String, ProviderFile>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DispatchFile {
    timeout_ms: Option<u64>,
    min_answer_chars: Option<usize>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct HistoryFile {
    limit: Option<usize>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct MatcherFile {
    overlap_threshold: Option<f64>,
    interrogative_overlap_threshold: Option<f64>,
    keyword_prefix_len: Option<usize>,
    min_containment_len: Option<usize>,
    whole_word_containment: Option<bool>,
    min_overlap_token_len: Option<usize>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FallbackFile {
    seed: Option<u64>,
    knowledge_path: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct LoggingFile {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ServerFile {
    bind: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ProviderFile {
    enabled: Option<bool>,
    priority: Option<u8>,
    endpoint: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    system_prompt: Option<String>,
}

// --- Resolved settings (internal representation) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub timeout: Duration,
    /// Trimmed provider text must be strictly longer than this.
    pub min_answer_chars: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            min_answer_chars: DEFAULT_MIN_ANSWER_CHARS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FallbackSettings {
    pub seed: Option<u64>,
    pub knowledge_path: Option<PathBuf>,
}

/// One external text-generation provider. Immutable after startup.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    /// Lower is preferred. Distinct across providers.
    pub priority: u8,
    pub endpoint: Url,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl ProviderConfig {
    /// A provider takes part in dispatch only when its credential is present.
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub dispatch: DispatchSettings,
    pub history_limit: usize,
    pub matcher: MatcherTuning,
    pub fallback: FallbackSettings,
    pub logging: LoggingSettings,
    pub bind: String,
    /// Sorted by priority.
    pub providers: Vec<ProviderConfig>,
}

impl Settings {
    /// Parse settings from TOML, resolving provider credentials through `env`.
    pub fn parse(
        content: &str,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ChorusError> {
        let file: SettingsFile =
            toml::from_str(content).map_err(|e| ChorusError::ConfigLoad(e.to_string()))?;
        compile(file, env)
    }

    /// Load from a TOML file. Checks file size before reading.
    pub fn load(path: &Path, env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ChorusError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            ChorusError::ConfigLoad(format!("cannot read {}: {e}", path.display()))
        })?;

        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ChorusError::ConfigLoad(format!(
                "config file exceeds {MAX_CONFIG_FILE_SIZE} byte limit"
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ChorusError::ConfigLoad(format!("cannot read {}: {e}", path.display()))
        })?;

        Self::parse(&content, env)
    }

    /// Process-start entry point: `.env`, then `CHORUS_CONFIG` (if set), then
    /// the process environment for credentials.
    pub fn from_env() -> Result<Self, ChorusError> {
        // Missing .env is normal.
        let _ = dotenvy::dotenv();
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path), &env),
            None => Self::parse("", &env),
        }
    }
}

fn compile(
    file: SettingsFile,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Settings, ChorusError> {
    let timeout_ms = file.dispatch.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(ChorusError::ConfigValidation(
            "dispatch.timeout_ms must be greater than zero".to_owned(),
        ));
    }

    let history_limit = file.history.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let matcher = compile_matcher(file.matcher)?;

    let mut providers = Vec::new();
    let mut seen = HashMap::new();
    for (name, provider) in &file.providers {
        if ProviderKind::from_name(name).is_none() {
            return Err(ChorusError::ConfigValidation(format!(
                "unknown provider '{name}' (expected one of: openai, gemini, huggingface)"
            )));
        }
        seen.insert(name.as_str(), provider);
    }

    let empty = ProviderFile::default();
    for kind in ProviderKind::ALL {
        let section = seen.get(kind.name()).copied().unwrap_or(&empty);
        if section.enabled == Some(false) {
            continue;
        }
        providers.push(compile_provider(kind, section, env)?);
    }

    providers.sort_by_key(|p| p.priority);
    if let Some(pair) = providers.windows(2).find(|w| w[0].priority == w[1].priority) {
        return Err(ChorusError::ConfigValidation(format!(
            "providers '{}' and '{}' share priority {}",
            pair[0].name, pair[1].name, pair[0].priority
        )));
    }

    Ok(Settings {
        dispatch: DispatchSettings {
            timeout: Duration::from_millis(timeout_ms),
            min_answer_chars: file
                .dispatch
                .min_answer_chars
                .unwrap_or(DEFAULT_MIN_ANSWER_CHARS),
        },
        history_limit,
        matcher,
        fallback: FallbackSettings {
            seed: file.fallback.seed,
            knowledge_path: file.fallback.knowledge_path,
        },
        logging: LoggingSettings {
            level: file.logging.level.unwrap_or_else(|| "info".to_owned()),
            format: file.logging.format.unwrap_or_default(),
        },
        bind: file.server.bind.unwrap_or_else(|| DEFAULT_BIND.to_owned()),
        providers,
    })
}

fn compile_matcher(file: MatcherFile) -> Result<MatcherTuning, ChorusError> {
    let defaults = MatcherTuning::default();
    let tuning = MatcherTuning {
        overlap_threshold: file.overlap_threshold.unwrap_or(defaults.overlap_threshold),
        interrogative_overlap_threshold: file
            .interrogative_overlap_threshold
            .unwrap_or(defaults.interrogative_overlap_threshold),
        keyword_prefix_len: file.keyword_prefix_len.unwrap_or(defaults.keyword_prefix_len),
        min_containment_len: file
            .min_containment_len
            .unwrap_or(defaults.min_containment_len),
        whole_word_containment: file
            .whole_word_containment
            .unwrap_or(defaults.whole_word_containment),
        min_overlap_token_len: file
            .min_overlap_token_len
            .unwrap_or(defaults.min_overlap_token_len),
    };

    for (field, value) in [
        ("overlap_threshold", tuning.overlap_threshold),
        (
            "interrogative_overlap_threshold",
            tuning.interrogative_overlap_threshold,
        ),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            return Err(ChorusError::ConfigValidation(format!(
                "matcher.{field} must be in (0, 1], got {value}"
            )));
        }
    }
    if tuning.keyword_prefix_len == 0 {
        return Err(ChorusError::ConfigValidation(
            "matcher.keyword_prefix_len must be greater than zero".to_owned(),
        ));
    }

    Ok(tuning)
}

fn compile_provider(
    kind: ProviderKind,
    section: &ProviderFile,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<ProviderConfig, ChorusError> {
    let name = kind.name();
    let raw_endpoint = section
        .endpoint
        .as_deref()
        .unwrap_or(kind.default_endpoint());
    let endpoint = Url::parse(raw_endpoint).map_err(|e| {
        ChorusError::ConfigValidation(format!(
            "provider '{name}': bad endpoint '{raw_endpoint}': {e}"
        ))
    })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ChorusError::ConfigValidation(format!(
            "provider '{name}': endpoint must be http or https"
        )));
    }

    let key_var = section
        .api_key_env
        .as_deref()
        .unwrap_or(kind.default_key_env());
    let api_key = env(key_var).map(SecretString::from);

    Ok(ProviderConfig {
        name: name.to_owned(),
        kind,
        priority: section.priority.unwrap_or(kind.default_priority()),
        endpoint,
        model: section
            .model
            .clone()
            .unwrap_or_else(|| kind.default_model().to_owned()),
        api_key,
        temperature: section.temperature.unwrap_or(0.7),
        max_tokens: section.max_tokens.unwrap_or(500),
        system_prompt: section
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_owned()),
    })
}
