use crate::conversation::{AnswerSource, FinalAnswer};
use crate::fallback::phrases::DEFAULT_CLARIFICATION;
use crate::providers::ProviderOutcome;

/// Produce the one answer returned for a request.
///
/// A winning provider outcome is used verbatim after trimming. Otherwise
/// `fallback` runs; it is only called when needed.
pub fn assemble(
    winner: Option<ProviderOutcome>,
    fallback: impl FnOnce() -> String,
) -> FinalAnswer {
    if let Some(outcome) = winner {
        let text = outcome.text.trim();
        if !text.is_empty() {
            return FinalAnswer::new(text.to_owned(), AnswerSource::Provider(outcome.provider));
        }
    }

    let text = fallback();
    let text = match text.trim() {
        "" => DEFAULT_CLARIFICATION,
        trimmed => trimmed,
    };
    FinalAnswer::new(text.to_owned(), AnswerSource::Fallback)
}
