//! # docqa CLI
//!
//! The `docqa` binary answers questions about a PDF or text document,
//! summarizes it, lists its keywords, and serves the same operations over
//! HTTP.
//!
//! ## Usage
//!
//! ```bash
//! docqa [--config ./config/docqa.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa ask "<question>" --document <file>` | Answer one question |
//! | `docqa chat --document <file>` | Interactive questions over stdin |
//! | `docqa summarize --document <file>` | Extractive summary |
//! | `docqa keywords --document <file>` | Top keywords |
//! | `docqa extract <pdf>` | Save the PDF's text to a file |
//! | `docqa serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docqa::config::{self, Config};
use docqa::core::analysis::{DEFAULT_KEYWORDS, DEFAULT_SUMMARY_SENTENCES};
use docqa::{analyze, ask, extract, logging, server};

/// docqa: ask questions about a document and get answers quoted from it.
///
/// Settings are read from the TOML file given with `--config`; without
/// one, built-in defaults are used. See `config/docqa.example.toml`.
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa: ask questions about a PDF or text document",
    version,
    long_about = "docqa splits a document into overlapping word windows, embeds them, \
    retrieves the windows closest to your question, and quotes the span of text that \
    answers it. It never generates text the document does not contain."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question about a document.
    Ask {
        /// The question.
        question: String,

        /// PDF or text file to ask about.
        #[arg(long, short)]
        document: PathBuf,

        /// Number of chunks to retrieve (overrides `[retrieval].top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the full reply as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ask several questions about a document, reading them from stdin.
    ///
    /// The document is indexed once and reused for every question.
    Chat {
        #[arg(long, short)]
        document: PathBuf,
    },

    /// Print an extractive summary of a document.
    Summarize {
        #[arg(long, short)]
        document: PathBuf,

        /// Number of sentences.
        #[arg(long, default_value_t = DEFAULT_SUMMARY_SENTENCES)]
        sentences: usize,
    },

    /// List the most frequent content words of a document.
    Keywords {
        #[arg(long, short)]
        document: PathBuf,

        /// Number of keywords.
        #[arg(long, default_value_t = DEFAULT_KEYWORDS)]
        top: usize,

        /// Print keywords and weights as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract the text of a PDF and save it.
    Extract {
        pdf: PathBuf,

        /// Output file (default `extracted_text.txt`).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    logging::init_logging(&cfg.logging)?;

    match cli.command {
        Commands::Ask {
            question,
            document,
            top_k,
            json,
        } => {
            ask::run_ask(&cfg, &document, &question, top_k, json).await?;
        }
        Commands::Chat { document } => {
            ask::run_chat(&cfg, &document).await?;
        }
        Commands::Summarize {
            document,
            sentences,
        } => {
            analyze::run_summarize(&document, sentences)?;
        }
        Commands::Keywords {
            document,
            top,
            json,
        } => {
            analyze::run_keywords(&document, top, json)?;
        }
        Commands::Extract { pdf, out } => {
            extract::run_extract(&pdf, out.as_deref())?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
