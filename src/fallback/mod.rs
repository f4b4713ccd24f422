pub mod arithmetic;
pub mod intents;
pub mod knowledge;
pub mod phrases;
pub mod text;

use rand::RngCore;
use tracing::debug;

use crate::config::FallbackSettings;
use crate::conversation::Turn;
use crate::error::ChorusError;
use intents::{IntentCascade, Probe};
use knowledge::{KnowledgeBase, MatcherTuning};

/// Deterministic responder used when no provider produced a usable answer.
/// Runs the intent cascade against the fact table and always yields text.
#[derive(Debug)]
pub struct FallbackResponder {
    knowledge: KnowledgeBase,
    cascade: IntentCascade,
}

impl FallbackResponder {
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self {
            knowledge,
            cascade: IntentCascade::standard(),
        }
    }

    /// Built-in fact table unless `settings.knowledge_path` names a file.
    pub fn from_settings(
        settings: &FallbackSettings,
        tuning: MatcherTuning,
    ) -> Result<Self, ChorusError> {
        let knowledge = match &settings.knowledge_path {
            Some(path) => KnowledgeBase::load(path, tuning)?,
            None => KnowledgeBase::builtin(tuning)?,
        };
        debug!(entries = knowledge.len(), "fallback knowledge loaded");
        Ok(Self::new(knowledge))
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Answer `message` from local rules. Never returns an empty string.
    pub fn respond(&self, message: &str, history: &[Turn], rng: &mut dyn RngCore) -> String {
        let probe = Probe::new(message, history, &self.knowledge);
        match self.cascade.evaluate(&probe, rng) {
            Some((rule, text)) if !text.trim().is_empty() => {
                debug!(rule, "fallback rule answered");
                text
            }
            _ => {
                debug!("fallback cascade produced nothing");
                phrases::DEFAULT_CLARIFICATION.to_owned()
            }
        }
    }
}
