use std::sync::Arc;

use anyhow::{Context, Result};

use chorus::{ChatService, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env().context("loading settings")?;
    chorus::logging::init(&settings.logging)?;

    let service = Arc::new(ChatService::from_settings(&settings).context("starting chat service")?);
    chorus::http::serve(&settings.bind, service)
        .await
        .with_context(|| format!("serving on {}", settings.bind))
}
