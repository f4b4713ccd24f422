use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use chorus::conversation::RequestContext;
use chorus::fallback::phrases::GREETINGS;
use chorus::providers::Provider;
use chorus::{AnswerSource, ChatService, ChorusError, Settings, Turn};

struct ScriptedProvider {
    name: &'static str,
    priority: u8,
    delay: Duration,
    reply: Option<&'static str>,
    calls: AtomicUsize,
    seen_history: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    fn new(
        name: &'static str,
        priority: u8,
        delay_ms: u64,
        reply: Option<&'static str>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            priority,
            delay: Duration::from_millis(delay_ms),
            reply,
            calls: AtomicUsize::new(0),
            seen_history: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    async fn complete(&self, ctx: &RequestContext) -> Result<String, ChorusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_history.lock().unwrap().push(ctx.history().len());
        tokio::time::sleep(self.delay).await;
        self.reply
            .map(str::to_owned)
            .ok_or_else(|| ChorusError::Provider(format!("{} unavailable", self.name)))
    }
}

fn no_env(_: &str) -> Option<String> {
    None
}

fn service(providers: &[Arc<ScriptedProvider>]) -> ChatService {
    let settings = Settings::parse("[fallback]\nseed = 11\n", &no_env).unwrap();
    let providers = providers
        .iter()
        .map(|p| p.clone() as Arc<dyn Provider>)
        .collect();
    ChatService::with_providers(providers, &settings).unwrap()
}

#[tokio::test(start_paused = true)]
async fn preferred_provider_wins_regardless_of_latency() {
    let openai = ScriptedProvider::new("openai", 0, 5000, Some("Paris is the capital of France."));
    let gemini = ScriptedProvider::new("gemini", 1, 1000, Some("The capital of France is Paris."));
    let hf = ScriptedProvider::new("huggingface", 2, 100, Some("France's capital city is Paris."));
    let chat = service(&[hf, gemini, openai]);

    let answer = chat
        .get_response("What is the capital of France?", &[])
        .await
        .unwrap();
    assert_eq!(answer.text(), "Paris is the capital of France.");
    assert_eq!(answer.source(), &AnswerSource::Provider("openai".to_owned()));
}

#[tokio::test(start_paused = true)]
async fn single_provider_text_is_trimmed() {
    let gemini =
        ScriptedProvider::new("gemini", 1, 50, Some("  Water boils at 100 degrees Celsius.\n"));
    let chat = service(&[gemini]);

    let answer = chat.get_response("When does water boil?", &[]).await.unwrap();
    assert_eq!(answer.text(), "Water boils at 100 degrees Celsius.");
}

#[tokio::test(start_paused = true)]
async fn short_answers_are_not_used() {
    let openai = ScriptedProvider::new("openai", 0, 10, Some("Yes."));
    let chat = service(&[openai]);

    let answer = chat.get_response("Calculate 15% of 200", &[]).await.unwrap();
    assert_eq!(answer.source(), &AnswerSource::Fallback);
    assert_eq!(answer.text(), "15% of 200 is 30.");
}

#[tokio::test(start_paused = true)]
async fn every_provider_failing_falls_back() {
    let openai = ScriptedProvider::new("openai", 0, 10, None);
    let gemini = ScriptedProvider::new("gemini", 1, 20, None);
    let chat = service(&[openai.clone(), gemini.clone()]);

    let answer = chat.get_response("hello", &[]).await.unwrap();
    assert_eq!(answer.source(), &AnswerSource::Fallback);
    assert!(GREETINGS.contains(&answer.text()));
    assert_eq!(openai.calls.load(Ordering::SeqCst), 1);
    assert_eq!(gemini.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn providers_see_bounded_history() {
    let openai = ScriptedProvider::new("openai", 0, 10, Some("Here is a long enough answer."));
    let chat = service(&[openai.clone()]);

    let history: Vec<Turn> = (0..30)
        .map(|i| {
            if i % 2 == 0 {
                Turn::user(format!("question {i}"))
            } else {
                Turn::assistant(format!("answer {i}"))
            }
        })
        .collect();
    chat.get_response("and another thing", &history).await.unwrap();
    assert_eq!(*openai.seen_history.lock().unwrap(), [10]);
}

#[tokio::test]
async fn empty_message_never_reaches_providers() {
    let openai = ScriptedProvider::new("openai", 0, 0, Some("Should never be asked."));
    let chat = service(&[openai.clone()]);

    let err = chat.get_response(" \t\n", &[]).await.unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(openai.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_share_one_service() {
    let openai = ScriptedProvider::new("openai", 0, 20, Some("A perfectly reasonable answer."));
    let chat = Arc::new(service(&[openai.clone()]));

    let mut handles = Vec::new();
    for i in 0..8 {
        let chat = chat.clone();
        handles.push(tokio::spawn(async move {
            chat.get_response(&format!("question number {i}"), &[]).await
        }));
    }
    for handle in handles {
        let answer = handle.await.unwrap().unwrap();
        assert_eq!(answer.text(), "A perfectly reasonable answer.");
    }
    assert_eq!(openai.calls.load(Ordering::SeqCst), 8);
}
