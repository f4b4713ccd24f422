use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use chorus::{ChatService, Settings, Turn};

const PROMPT: &str = "you> ";

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env().context("loading settings")?;
    chorus::logging::init(&settings.logging)?;
    let service = ChatService::from_settings(&settings).context("starting chat service")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return answer_once(&service, &args.join(" ")).await;
    }

    repl(&service, settings.history_limit).await
}

async fn answer_once(service: &ChatService, message: &str) -> Result<()> {
    match service.get_response(message, &[]).await {
        Ok(answer) => {
            println!("{}", answer.text());
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "request failed");
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}

/// Interactive loop. Keeps the last `history_limit` turns as context.
async fn repl(service: &ChatService, history_limit: usize) -> Result<()> {
    let mut editor = DefaultEditor::new().context("opening line editor")?;
    let mut history: Vec<Turn> = Vec::new();

    println!("Ask me anything. Ctrl-D to quit.");
    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("reading input"),
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(message);

        match service.get_response(message, &history).await {
            Ok(answer) => {
                println!("{}\n", answer.text());
                history.push(Turn::user(message));
                history.push(Turn::assistant(answer.into_text()));
                let excess = history.len().saturating_sub(history_limit);
                history.drain(..excess);
            }
            Err(e) => {
                tracing::warn!(error = %e, "request failed");
                println!("{}\n", e.user_message());
            }
        }
    }
    Ok(())
}
