//! generateContent wire shape. The model is part of the endpoint path.

use serde_json::{Value, json};

use crate::config::ProviderConfig;
use crate::conversation::{RequestContext, Role};

pub(super) fn build_body(config: &ProviderConfig, ctx: &RequestContext) -> Value {
    let mut contents: Vec<Value> = ctx
        .history()
        .iter()
        .map(|t| {
            let role = match t.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            json!({"role": role, "parts": [{"text": t.content}]})
        })
        .collect();
    contents.push(json!({"role": "user", "parts": [{"text": ctx.message()}]}));

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "temperature": config.temperature,
            "maxOutputTokens": config.max_tokens,
        },
    });
    if !config.system_prompt.is_empty() {
        body["systemInstruction"] = json!({"parts": [{"text": config.system_prompt}]});
    }
    body
}

pub(super) fn extract_text(body: &Value) -> Option<String> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_owned)
}
