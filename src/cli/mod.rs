//! CLI entry points: `serve` and the interactive `chat` console

use crate::server;
use anyhow::Result;
use campus_agents::ConversationHistory;
use clap::{Parser, Subcommand};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Campus - multi-agent smart-campus assistant
#[derive(Debug, Parser)]
#[command(name = "campus", version, about)]
pub struct Cli {
    /// Subcommand; defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Bind port
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Interactive console chat with the triage agent
    Chat,
}

/// Dispatch the parsed CLI
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Serve {
        host: "0.0.0.0".to_string(),
        port: 8000,
    }) {
        Command::Serve { host, port } => server::serve(&host, port).await,
        Command::Chat => chat().await,
    }
}

/// Console REPL against the triage agent
async fn chat() -> Result<()> {
    let (triage, failures) = server::build_triage().await?;

    println!("\n--- Triage Agent Initialized ---");
    println!("This agent will formulate plans and delegate to available specialized agents.");
    for failure in &failures {
        println!("(unavailable: {} - {})", failure.name, failure.error);
    }
    println!("Type 'exit' or 'quit' to stop.");

    let mut history = ConversationHistory::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nUser > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!("\nExiting...");
            break;
        };
        let input = line.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        println!("\nTriageAgent processing...");
        match triage.handle_turn(&mut history, input).await {
            Ok(response) => println!("{}", response),
            Err(e) => eprintln!("\n[TriageAgent ERROR] An error occurred during invocation: {}", e),
        }
    }

    Ok(())
}
