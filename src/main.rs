//! # DocQuery CLI (`dq`)
//!
//! The `dq` binary is the primary interface for DocQuery. It provides an
//! interactive chat session over loaded documents, a one-shot ask, and a
//! text-extraction debug dump.
//!
//! ## Usage
//!
//! ```bash
//! dq --config ./config/dq.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dq chat [FILES]...` | Start an interactive Q&A session |
//! | `dq ask "<question>" --file <PATH>` | Ingest files, ask one question, print the answer |
//! | `dq extract <PATH>` | Print the text extracted from a document |
//!
//! ## Examples
//!
//! ```bash
//! # Chat over two documents with the default (Ollama) providers
//! dq chat report.pdf appendix.docx
//!
//! # One-shot question
//! dq ask "What was the total revenue?" --file report.pdf
//!
//! # Check what the extractor sees in a PDF
//! dq extract report.pdf
//! ```
//!
//! Inside a chat session, lines starting with `:` are commands
//! (`:load <path>`, `:sources`, `:clear`, `:reset`, `:help`, `:quit`);
//! everything else is a question.

mod assemble;
mod chunk;
mod config;
mod dedupe;
mod embedding;
mod engine;
mod extract;
mod generation;
mod history;
mod index;
mod models;
mod provider;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::engine::{Engine, IngestReport};
use crate::models::DocumentInput;

const DEFAULT_CONFIG_PATH: &str = "./config/dq.toml";

/// DocQuery CLI — conversational Q&A over your documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Without one, built-in defaults are used (local Ollama providers).
/// See `config/dq.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "dq",
    about = "DocQuery — conversational document Q&A with source citations",
    version,
    long_about = "DocQuery ingests PDF and DOCX documents, indexes them in memory, and answers \
    natural-language questions from document content with source citations. Embedding and \
    generation run against configurable providers (Ollama by default, OpenAI optional)."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/dq.toml`; if that file does not exist,
    /// built-in defaults are used. An explicitly given path must exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start an interactive Q&A session.
    ///
    /// Loads any files given on the command line, then reads questions from
    /// stdin. Session state (index, history) lives in memory and is gone
    /// when the session ends.
    Chat {
        /// Documents to load before the first question (PDF or DOCX).
        files: Vec<PathBuf>,
    },

    /// Ingest documents and ask a single question.
    ///
    /// Prints the answer and its citations, then exits. Exits non-zero if
    /// ingestion fails.
    Ask {
        /// The question to ask.
        question: String,

        /// Document to ingest (repeatable).
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the text extracted from a document, page by page.
    ///
    /// Useful for checking what the chunker will see before ingesting.
    Extract {
        /// Path to a PDF or DOCX file.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let explicit = cli.config.is_some();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = config::load_config_or_default(&config_path, explicit)?;

    match cli.command {
        Commands::Chat { files } => run_chat(config, files).await,
        Commands::Ask { question, files } => run_ask(config, question, files).await,
        Commands::Extract { path } => run_extract(&path),
    }
}

async fn run_chat(config: config::Config, files: Vec<PathBuf>) -> Result<()> {
    let mut engine = Engine::from_config(config)?;

    if !files.is_empty() {
        let docs = load_files(&files)?;
        let report = engine.ingest(docs).await;
        print_ingest_report(&report);
    }

    println!("DocQuery interactive session. Ask a question, or :help for commands.");

    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        if interactive {
            print!("dq> ");
            std::io::stdout().flush()?;
        }

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            ":quit" | ":q" | ":exit" => break,
            ":help" => {
                println!(":load <path>   load another document");
                println!(":sources       list loaded documents");
                println!(":clear         forget the conversation, keep documents");
                println!(":reset         drop documents and conversation");
                println!(":quit          leave the session");
            }
            ":sources" => {
                if engine.sources().is_empty() {
                    println!("no documents loaded");
                } else {
                    for name in engine.sources() {
                        println!("  {}", name);
                    }
                    println!("  ({} chunks indexed)", engine.chunk_count());
                }
            }
            ":clear" => {
                engine.clear_history();
                println!("conversation cleared");
            }
            ":reset" => {
                engine.reset();
                println!("session reset");
            }
            _ if input.starts_with(":load") => {
                let path = input.trim_start_matches(":load").trim();
                if path.is_empty() {
                    println!("usage: :load <path>");
                    continue;
                }
                match load_files(&[PathBuf::from(path)]) {
                    Ok(docs) => {
                        let report = engine.ingest(docs).await;
                        print_ingest_report(&report);
                    }
                    Err(e) => println!("error: {}", e),
                }
            }
            _ if input.starts_with(':') => {
                println!("unknown command: {} (try :help)", input);
            }
            question => {
                let outcome = engine.ask(question).await;
                println!("{}", outcome.answer);
                print_citations(&outcome.citations);
            }
        }
    }

    Ok(())
}

async fn run_ask(config: config::Config, question: String, files: Vec<PathBuf>) -> Result<()> {
    let mut engine = Engine::from_config(config)?;

    let docs = load_files(&files)?;
    let report = engine.ingest(docs).await;
    print_ingest_report(&report);
    if !report.ok {
        bail!("ingestion failed: {}", report.message);
    }

    let outcome = engine.ask(&question).await;
    println!("{}", outcome.answer);
    print_citations(&outcome.citations);
    Ok(())
}

fn run_extract(path: &Path) -> Result<()> {
    let name = file_display_name(path);
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let pages = extract::extract_pages(&name, &bytes)?;

    if pages.is_empty() {
        println!("no extractable text");
        return Ok(());
    }
    for page in &pages {
        match page.page_number {
            Some(n) => println!("--- page {} ---", n),
            None => println!("--- (unpaginated) ---"),
        }
        println!("{}", page.text.trim_end());
    }
    Ok(())
}

fn load_files(paths: &[PathBuf]) -> Result<Vec<DocumentInput>> {
    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        docs.push(DocumentInput::new(file_display_name(path), bytes));
    }
    Ok(docs)
}

fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_ingest_report(report: &IngestReport) {
    println!("ingest");
    println!("  files ingested: {}", report.files_ingested.len());
    println!("  chunks indexed: {}", report.chunks_indexed);
    for (name, reason) in &report.files_skipped {
        println!("  skipped {}: {}", name, reason);
    }
    println!("{}", if report.ok { "ok" } else { "failed" });
}

fn print_citations(citations: &[crate::models::Citation]) {
    if citations.is_empty() {
        return;
    }
    println!();
    println!("sources:");
    for (i, citation) in citations.iter().enumerate() {
        // Snippets may span lines; flatten for single-line display.
        let snippet = citation.snippet.split_whitespace().collect::<Vec<_>>().join(" ");
        println!(
            "  [{}] {} ({}): {}",
            i + 1,
            citation.source_name,
            citation.page_label(),
            snippet
        );
    }
}
