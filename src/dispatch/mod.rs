pub mod timeout;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::DispatchSettings;
use crate::conversation::RequestContext;
use crate::error::ChorusError;
use crate::providers::{Provider, ProviderOutcome};
use timeout::with_timeout;

/// Fans a request out to every configured provider and picks one answer.
///
/// Waits for all providers to settle before selecting, so the winner is
/// decided by priority rank and never by arrival order.
pub struct Dispatcher {
    providers: Vec<Arc<dyn Provider>>,
    timeout: Duration,
    min_answer_chars: usize,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("provider_count", &self.providers.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(providers: Vec<Arc<dyn Provider>>, settings: &DispatchSettings) -> Self {
        Self {
            providers,
            timeout: settings.timeout,
            min_answer_chars: settings.min_answer_chars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Query every provider concurrently and return the preferred usable
    /// outcome, or `None` when no provider produced one.
    pub async fn dispatch(&self, ctx: &RequestContext) -> Option<ProviderOutcome> {
        if self.providers.is_empty() {
            debug!("no providers configured, skipping dispatch");
            return None;
        }

        let outcomes = self.gather(ctx).await;
        let winner = select_winner(outcomes, self.min_answer_chars);
        match &winner {
            Some(outcome) => info!(provider = %outcome.provider, "provider answer selected"),
            None => info!("no usable provider answer"),
        }
        winner
    }

    /// Run every provider under the timeout and collect all outcomes, in
    /// completion order. Failures and timeouts become failed outcomes.
    pub async fn gather(&self, ctx: &RequestContext) -> Vec<ProviderOutcome> {
        let ctx = Arc::new(ctx.clone());
        let mut tasks = JoinSet::new();
        for provider in &self.providers {
            tasks.spawn(invoke(provider.clone(), ctx.clone(), self.timeout));
        }

        let mut outcomes = Vec::with_capacity(self.providers.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                // A panicking adapter counts as "no answer" like any other failure.
                Err(e) => warn!(error = %e, "provider task aborted"),
            }
        }
        outcomes
    }
}

/// Ask one provider, bounded by `bound`. Never fails: errors and timeouts
/// are logged and reported as a failed outcome.
async fn invoke(
    provider: Arc<dyn Provider>,
    ctx: Arc<RequestContext>,
    bound: Duration,
) -> ProviderOutcome {
    let name = provider.name().to_owned();
    let priority = provider.priority();
    let started = Instant::now();

    let result = with_timeout(provider.complete(&ctx), bound).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Some(Ok(text)) => {
            debug!(provider = %name, elapsed_ms, chars = text.len(), "provider answered");
            ProviderOutcome::success(&name, priority, text)
        }
        Some(Err(e)) => {
            warn!(provider = %name, elapsed_ms, error = %e, "provider failed");
            ProviderOutcome::failure(&name, priority)
        }
        None => {
            let e = ChorusError::Timeout {
                provider: name.clone(),
                elapsed_ms,
            };
            warn!(provider = %name, elapsed_ms, error = %e, "provider timed out");
            ProviderOutcome::failure(&name, priority)
        }
    }
}

/// Keep successful outcomes whose trimmed text is longer than
/// `min_answer_chars`, then take the lowest priority rank.
pub fn select_winner(
    outcomes: Vec<ProviderOutcome>,
    min_answer_chars: usize,
) -> Option<ProviderOutcome> {
    outcomes
        .into_iter()
        .filter(|o| o.succeeded && o.text.trim().chars().count() > min_answer_chars)
        .min_by_key(|o| o.priority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    struct FakeProvider {
        name: &'static str,
        priority: u8,
        delay: Duration,
        reply: Result<&'static str, &'static str>,
        calls: AtomicUsize,
        finished: AtomicBool,
    }

    impl FakeProvider {
        fn new(
            name: &'static str,
            priority: u8,
            delay_ms: u64,
            reply: Result<&'static str, &'static str>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                priority,
                delay: Duration::from_millis(delay_ms),
                reply,
                calls: AtomicUsize::new(0),
                finished: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        async fn complete(&self, _ctx: &RequestContext) -> Result<String, ChorusError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.finished.store(true, Ordering::SeqCst);
            self.reply
                .map(str::to_owned)
                .map_err(|e| ChorusError::Provider(e.to_owned()))
        }
    }

    fn dispatcher(providers: Vec<Arc<FakeProvider>>) -> Dispatcher {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn Provider>)
            .collect();
        Dispatcher::new(providers, &DispatchSettings::default())
    }

    fn ctx() -> RequestContext {
        RequestContext::new("tell me about rust", &[], 10).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn single_success_is_returned() {
        let d = dispatcher(vec![FakeProvider::new(
            "openai",
            0,
            10,
            Ok("Rust is a systems language."),
        )]);
        let winner = d.dispatch(&ctx()).await.expect("winner");
        assert_eq!(winner.provider, "openai");
        assert_eq!(winner.text, "Rust is a systems language.");
    }

    #[tokio::test(start_paused = true)]
    async fn priority_beats_arrival_order() {
        let slow_preferred =
            FakeProvider::new("openai", 0, 3000, Ok("answer from the preferred provider"));
        let fast_second = FakeProvider::new("gemini", 1, 10, Ok("answer from the faster provider"));
        let d = dispatcher(vec![fast_second.clone(), slow_preferred.clone()]);

        let winner = d.dispatch(&ctx()).await.expect("winner");
        assert_eq!(winner.provider, "openai");
        assert!(slow_preferred.finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_all_providers() {
        let fast = FakeProvider::new("openai", 0, 10, Ok("fast and preferred answer"));
        let slow = FakeProvider::new("huggingface", 2, 5000, Ok("slow and less preferred"));
        let d = dispatcher(vec![fast, slow.clone()]);

        let outcomes = d.gather(&ctx()).await;
        assert_eq!(outcomes.len(), 2);
        assert!(slow.finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_provider_is_excluded() {
        let too_slow = FakeProvider::new("openai", 0, 9000, Ok("would have won on priority"));
        let in_time = FakeProvider::new("gemini", 1, 7000, Ok("arrived before the deadline"));
        let d = dispatcher(vec![too_slow.clone(), in_time]);

        let winner = d.dispatch(&ctx()).await.expect("winner");
        assert_eq!(winner.provider, "gemini");
        assert!(!too_slow.finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_does_not_affect_others() {
        let broken = FakeProvider::new("openai", 0, 10, Err("http 500"));
        let working = FakeProvider::new("huggingface", 2, 50, Ok("a perfectly fine answer"));
        let d = dispatcher(vec![broken, working]);

        let winner = d.dispatch(&ctx()).await.expect("winner");
        assert_eq!(winner.provider, "huggingface");
    }

    #[tokio::test(start_paused = true)]
    async fn short_answers_rejected() {
        let terse = FakeProvider::new("openai", 0, 10, Ok("   ok sure    "));
        let ten = FakeProvider::new("gemini", 1, 10, Ok("0123456789"));
        let d = dispatcher(vec![terse, ten]);
        assert!(d.dispatch(&ctx()).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_yield_none() {
        let d = dispatcher(vec![
            FakeProvider::new("openai", 0, 10, Err("bad key")),
            FakeProvider::new("gemini", 1, 9000, Ok("too late to matter")),
        ]);
        assert!(d.dispatch(&ctx()).await.is_none());
    }

    #[tokio::test]
    async fn empty_dispatcher_yields_none() {
        let d = dispatcher(Vec::new());
        assert!(d.is_empty());
        assert!(d.dispatch(&ctx()).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn each_provider_called_once() {
        let a = FakeProvider::new("openai", 0, 10, Ok("first answer, long enough"));
        let b = FakeProvider::new("gemini", 1, 10, Ok("second answer, long enough"));
        let d = dispatcher(vec![a.clone(), b.clone()]);
        d.dispatch(&ctx()).await;
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn select_winner_ignores_failed_outcomes() {
        let outcomes = vec![
            ProviderOutcome::failure("openai", 0),
            ProviderOutcome::success("huggingface", 2, "long enough answer".to_owned()),
            ProviderOutcome::success("gemini", 1, "another long answer".to_owned()),
        ];
        let winner = select_winner(outcomes, 10).unwrap();
        assert_eq!(winner.provider, "gemini");
    }
}
