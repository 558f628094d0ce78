//! Question answering from the command line.
//!
//! `docqa ask` answers one question with a freshly built index; `docqa
//! chat` keeps a [`Session`] open over stdin so the document is indexed
//! once and reused for every question.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use docqa_core::assistant::{Assistant, Reply};
use docqa_core::session::Session;

use crate::config::Config;
use crate::extract::load_document;
use crate::service::{load_assistant, new_session};

/// JSON shape printed by `docqa ask --json`.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub message: String,
    pub reply: Reply,
}

/// Load `document` and answer `question` about it.
pub async fn ask_document(
    assistant: &Assistant,
    document: &Path,
    question: &str,
    top_k: Option<usize>,
) -> Result<AskResponse> {
    let text = load_document(document)?;
    let reply = assistant.ask(&text, question, top_k).await;
    Ok(AskResponse {
        question: question.to_string(),
        message: reply.message(),
        reply,
    })
}

/// CLI entry point for `docqa ask`.
pub async fn run_ask(
    cfg: &Config,
    document: &Path,
    question: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let assistant = load_assistant(cfg).await?;
    let response = ask_document(&assistant, document, question, top_k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.message);
    if let Reply::Answer { score, context, .. } = &response.reply {
        println!();
        println!("score: {:.3}", score);
        for hit in context {
            println!(
                "  [chunk {} @ word {}] distance {:.4}",
                hit.chunk.index, hit.chunk.start_word, hit.distance
            );
        }
    }
    Ok(())
}

/// What one line of chat input asks for.
#[derive(Debug, PartialEq)]
enum ChatCommand<'a> {
    Quit,
    Load(&'a str),
    History,
    Ask(&'a str),
    Skip,
}

fn parse_chat_line(line: &str) -> ChatCommand<'_> {
    let line = line.trim();
    match line {
        "" => ChatCommand::Skip,
        ":quit" | ":exit" | "exit" | "quit" => ChatCommand::Quit,
        ":history" => ChatCommand::History,
        _ => match line.strip_prefix(":load ") {
            Some(path) => ChatCommand::Load(path.trim()),
            None => ChatCommand::Ask(line),
        },
    }
}

fn load_into_session(session: &mut Session, path: &Path) -> Result<()> {
    let text = load_document(path)?;
    let name = path.display().to_string();
    session.load_document(name, text);
    Ok(())
}

/// CLI entry point for `docqa chat`.
///
/// Reads questions from stdin until EOF or `:quit`. `:load <file>` swaps
/// the active document and `:history` lists the previous turns.
pub async fn run_chat(cfg: &Config, document: &Path) -> Result<()> {
    let assistant = load_assistant(cfg).await?;
    let mut session = new_session(cfg);
    load_into_session(&mut session, document)?;

    if let Some(doc) = session.document() {
        println!(
            "Loaded {} ({} words). Ask a question, :load <file> to switch, :quit to exit.",
            doc.name(),
            doc.word_count()
        );
    }

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_chat_line(&line) {
            ChatCommand::Skip => continue,
            ChatCommand::Quit => break,
            ChatCommand::History => {
                for (i, turn) in session.history().iter().enumerate() {
                    println!("{}. {}\n   {}", i + 1, turn.question, turn.reply.message());
                }
            }
            ChatCommand::Load(path) => match load_into_session(&mut session, Path::new(path)) {
                Ok(()) => println!("Loaded {}.", path),
                Err(e) => println!("Error: {:#}", e),
            },
            ChatCommand::Ask(question) => {
                let reply = assistant.ask_in_session(&mut session, question, None).await;
                println!("{}", reply.message());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_chat_line() {
        assert_eq!(parse_chat_line("   "), ChatCommand::Skip);
        assert_eq!(parse_chat_line(":quit"), ChatCommand::Quit);
        assert_eq!(parse_chat_line("exit"), ChatCommand::Quit);
        assert_eq!(parse_chat_line(":history"), ChatCommand::History);
        assert_eq!(
            parse_chat_line(":load  other.pdf "),
            ChatCommand::Load("other.pdf")
        );
        assert_eq!(
            parse_chat_line(" Where is the cat? "),
            ChatCommand::Ask("Where is the cat?")
        );
    }

    #[tokio::test]
    async fn test_ask_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pets.txt");
        std::fs::write(&path, "The cat sat on the mat. The dog ran in the park.").unwrap();

        let mut cfg = Config::default();
        cfg.embedding.provider = "hash".to_string();
        let assistant = load_assistant(&cfg).await.unwrap();

        let response = ask_document(&assistant, &path, "Where did the dog run?", None)
            .await
            .unwrap();
        assert!(response.reply.is_answer());
        assert_eq!(response.message, "The dog ran in the park.");
    }
}
