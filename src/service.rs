use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::assembler::assemble;
use crate::config::Settings;
use crate::conversation::{AnswerSource, FinalAnswer, RequestContext, Turn};
use crate::dispatch::Dispatcher;
use crate::error::ChorusError;
use crate::fallback::FallbackResponder;
use crate::providers::{Provider, build_providers};

/// Public entry point: one message in, one answer out.
///
/// Holds only read-only state plus the phrase RNG, so a single instance
/// serves concurrent requests.
pub struct ChatService {
    dispatcher: Dispatcher,
    responder: FallbackResponder,
    history_limit: usize,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("dispatcher", &self.dispatcher)
            .field("history_limit", &self.history_limit)
            .finish()
    }
}

impl ChatService {
    /// `seed` fixes phrase selection; `None` seeds from the OS.
    pub fn new(
        dispatcher: Dispatcher,
        responder: FallbackResponder,
        history_limit: usize,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            dispatcher,
            responder,
            history_limit,
            rng: Mutex::new(rng),
        }
    }

    /// Wire up HTTP providers and the fallback responder from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ChorusError> {
        let providers = build_providers(&settings.providers)?;
        Self::with_providers(providers, settings)
    }

    /// Same as [`ChatService::from_settings`] but with caller-supplied providers.
    pub fn with_providers(
        providers: Vec<Arc<dyn Provider>>,
        settings: &Settings,
    ) -> Result<Self, ChorusError> {
        let dispatcher = Dispatcher::new(providers, &settings.dispatch);
        let responder =
            FallbackResponder::from_settings(&settings.fallback, settings.matcher.clone())?;
        info!(
            providers = ?dispatcher.provider_names(),
            knowledge_entries = responder.knowledge().len(),
            "chat service ready"
        );
        Ok(Self::new(
            dispatcher,
            responder,
            settings.history_limit,
            settings.fallback.seed,
        ))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Answer `message` given the prior conversation.
    ///
    /// Fails only for an empty message; every provider problem degrades to
    /// the fallback responder instead.
    pub async fn get_response(
        &self,
        message: &str,
        history: &[Turn],
    ) -> Result<FinalAnswer, ChorusError> {
        let ctx = RequestContext::new(message, history, self.history_limit)?;
        let span = info_span!("chat", request_id = %Uuid::now_v7());
        self.answer(ctx).instrument(span).await
    }

    async fn answer(&self, ctx: RequestContext) -> Result<FinalAnswer, ChorusError> {
        let started = Instant::now();
        let winner = self.dispatcher.dispatch(&ctx).await;

        // A panic mid-pick leaves the RNG in a usable state.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let answer = assemble(winner, || {
            self.responder.respond(ctx.message(), ctx.history(), &mut *rng)
        });
        drop(rng);

        let source = match answer.source() {
            AnswerSource::Provider(name) => name.as_str(),
            AnswerSource::Fallback => "fallback",
        };
        info!(
            source,
            chars = answer.text().chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response assembled"
        );
        Ok(answer)
    }
}
