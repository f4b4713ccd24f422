//! Chat-completions wire shape. Also fits any OpenAI-compatible endpoint.

use serde_json::{Value, json};

use super::chat_role;
use crate::config::ProviderConfig;
use crate::conversation::RequestContext;

pub(super) fn build_body(config: &ProviderConfig, ctx: &RequestContext) -> Value {
    let mut messages = Vec::with_capacity(ctx.history().len() + 2);
    if !config.system_prompt.is_empty() {
        messages.push(json!({"role": "system", "content": config.system_prompt}));
    }
    messages.extend(
        ctx.history()
            .iter()
            .map(|t| json!({"role": chat_role(t.role), "content": t.content})),
    );
    messages.push(json!({"role": "user", "content": ctx.message()}));

    json!({
        "model": config.model,
        "messages": messages,
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
    })
}

pub(super) fn extract_text(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_owned)
}
