//! Text-generation inference wire shape. History is flattened into a transcript.

use serde_json::{Value, json};

use crate::config::ProviderConfig;
use crate::conversation::{RequestContext, Role};

pub(super) fn build_body(config: &ProviderConfig, ctx: &RequestContext) -> Value {
    json!({
        "inputs": transcript(config, ctx),
        "parameters": {
            "temperature": config.temperature,
            "max_new_tokens": config.max_tokens,
            "return_full_text": false,
        },
    })
}

fn transcript(config: &ProviderConfig, ctx: &RequestContext) -> String {
    let mut out = String::new();
    if !config.system_prompt.is_empty() {
        out.push_str(&config.system_prompt);
        out.push_str("\n\n");
    }
    for turn in ctx.history() {
        let speaker = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        out.push_str(&format!("{speaker}: {}\n", turn.content));
    }
    out.push_str(&format!("User: {}\nAssistant:", ctx.message()));
    out
}

/// Inference endpoints answer with either `[{generated_text}]` or `{generated_text}`.
pub(super) fn extract_text(body: &Value) -> Option<String> {
    body.pointer("/0/generated_text")
        .or_else(|| body.get("generated_text"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::conversation::Turn;

    fn config() -> ProviderConfig {
        let mut config = Settings::parse("", &|_: &str| Some("k".to_owned()))
            .unwrap()
            .providers
            .remove(2);
        config.system_prompt.clear();
        config
    }

    #[test]
    fn transcript_ends_with_assistant_cue() {
        let history = [Turn::user("hi"), Turn::assistant("hello")];
        let ctx = RequestContext::new("what's new", &history, 10).unwrap();
        let body = build_body(&config(), &ctx);

        assert_eq!(
            body["inputs"],
            "User: hi\nAssistant: hello\nUser: what's new\nAssistant:"
        );
        assert_eq!(body["parameters"]["return_full_text"], false);
    }

    #[test]
    fn extracts_array_and_object_shapes() {
        let array = json!([{"generated_text": " Sure thing."}]);
        let object = json!({"generated_text": "Sure thing."});
        assert_eq!(extract_text(&array).as_deref(), Some(" Sure thing."));
        assert_eq!(extract_text(&object).as_deref(), Some("Sure thing."));
    }

    #[test]
    fn error_body_has_no_text() {
        let body = json!({"error": "Model is currently loading", "estimated_time": 20.0});
        assert_eq!(extract_text(&body), None);
    }
}
