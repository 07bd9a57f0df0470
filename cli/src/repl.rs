//! Interactive chat session
//!
//! Plain lines are questions; slash commands start uploads and removals.
//! Every action runs as its own task, so a question can be answered while an
//! upload batch is still in flight.

use docchat::{FileSelection, Session, UploadReport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Upload(Vec<String>),
    Delete(String),
    Ask(String),
}

impl Command {
    pub fn parse(input: &str) -> Result<Self, String> {
        let Some(rest) = input.strip_prefix('/') else {
            return Ok(Command::Ask(input.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let Some(name) = parts.next() else {
            return Err("Empty command".to_string());
        };

        match name {
            "quit" | "exit" => Ok(Command::Quit),
            "help" => Ok(Command::Help),
            "upload" => Ok(Command::Upload(parts.map(String::from).collect())),
            "delete" => parts
                .next()
                .map(|id| Command::Delete(id.to_string()))
                .ok_or_else(|| "Usage: /delete <doc_id>".to_string()),
            _ => Err(format!("Unknown command: /{}. Type /help for available commands.", name)),
        }
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  <question>             - Ask a question about your documents");
    println!("  /upload <path> [...]   - Upload files, one after another");
    println!("  /delete <doc_id>       - Remove an uploaded document");
    println!("  /quit, /exit           - Exit (waits for pending requests)");
    println!("  /help                  - Show this help message");
}

/// Lines naming the doc_id of each embedded file, for later `/delete`.
pub fn doc_id_lines(reports: &[UploadReport]) -> Vec<String> {
    reports.iter().filter_map(UploadReport::doc_id_line).collect()
}

pub async fn run_chat(session: Session) -> anyhow::Result<()> {
    println!("Type /help for commands, Ctrl+D or /quit to exit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        // Reap finished actions so the set does not grow unbounded.
        while in_flight.try_join_next().is_some() {}

        let command = match Command::parse(line.trim_start()) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{}", err);
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Ask(question) => {
                let asks = session.asks.clone();
                in_flight.spawn(async move {
                    let mut input = question;
                    asks.ask(&mut input).await;
                });
            }
            Command::Upload(paths) => {
                let uploads = session.uploads.clone();
                in_flight.spawn(async move {
                    let mut selection = FileSelection::from_paths(paths);
                    match uploads.upload_all(&mut selection).await {
                        Ok(reports) => {
                            for line in doc_id_lines(&reports) {
                                println!("  {}", line);
                            }
                        }
                        Err(notice) => eprintln!("! {}", notice),
                    }
                });
            }
            Command::Delete(doc_id) => {
                let uploads = session.uploads.clone();
                in_flight.spawn(async move {
                    uploads.remove_document(&doc_id).await;
                });
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Chat action panicked: {}", e);
        }
    }
    Ok(())
}
