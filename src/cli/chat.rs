//! CLI `chat` command.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use moodlog::api::{ApiClient, JournalApi};
use moodlog::config::MoodlogConfig;
use moodlog::pages::{ChatPage, Exchange};
use moodlog::session;

use super::{connect, spinner};

pub async fn chat(config: &MoodlogConfig, message: Option<String>) -> Result<()> {
    let (store, api) = connect(config)?;

    let safe_mode = if session::has_credential(store.as_ref())? {
        match api.settings().await {
            Ok(settings) => settings.safe_mode,
            Err(e) => {
                tracing::warn!(error = %e, "could not read safe mode setting");
                false
            }
        }
    } else {
        false
    };

    let mut page = ChatPage::mount(store, &*api, safe_mode).await;
    if page.is_locked() {
        println!("Safe mode is on. Run `moodlog safe-mode off` to continue journaling.");
        return Ok(());
    }

    if let Some(message) = message {
        send(&mut page, &api, &message).await;
        return Ok(());
    }

    for exchange in page.messages() {
        print_exchange(exchange);
    }
    println!("Talk to Eli. Type /quit or press Ctrl-D to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }
        send(&mut page, &api, &line).await;
    }

    Ok(())
}

async fn send(page: &mut ChatPage, api: &ApiClient, message: &str) {
    let pb = spinner("Eli is thinking...");
    let reply = page.send(api, message).await;
    pb.finish_and_clear();
    if let Some(exchange) = reply {
        print_reply(exchange);
    }
}

fn print_exchange(exchange: &Exchange) {
    println!("you: {}", exchange.user);
    print_reply(exchange);
}

fn print_reply(exchange: &Exchange) {
    let Some(eli) = &exchange.eli else {
        return;
    };
    let tags = exchange
        .tags
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| format!(", {t}"))
        .unwrap_or_default();
    println!("eli: {eli}");
    println!("     ({}{tags})", exchange.sentiment());
    println!();
}
