//! `parley chat`: Interactive client for a running gateway.

use parley_config::AppConfig;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::client::{ChatClient, render_context};

pub async fn run(url_override: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let base_url = url_override.unwrap_or(config.client.base_url);

    let mut client = ChatClient::new(base_url.clone());

    println!();
    println!("  Parley Chat  ({base_url})");
    println!("  Type 'exit' to quit, 'context' to view the current context");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("You: ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => break,
            "context" => show_context(&client).await,
            _ => match client.send(input).await {
                Ok(reply) => println!("\nAssistant: {}\n", reply.response),
                Err(e) => eprintln!("\n  [Error] {e}\n"),
            },
        }
    }

    println!("\n  Goodbye!\n");
    Ok(())
}

async fn show_context(client: &ChatClient) {
    match client.fetch_context().await {
        Ok(Some(record)) => println!("\n{}\n", render_context(&record)),
        Ok(None) if client.context().is_empty() => println!("\nContext is empty.\n"),
        Ok(None) => print_local(client),
        Err(e) => {
            eprintln!("  [Error] {e}");
            print_local(client);
        }
    }
}

/// Fall back to the client's own copy when the server cannot be asked.
fn print_local(client: &ChatClient) {
    let local = serde_json::to_string_pretty(client.context()).unwrap_or_default();
    println!("\n===== LOCAL CONTEXT =====\n{local}\n=========================\n");
}
