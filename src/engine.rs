//! Question-answering engine orchestration.
//!
//! Coordinates the full pipeline: extraction → chunking → embedding →
//! vector index on the ingest path, and embed → retrieve → assemble →
//! generate → cite on the ask path. The engine owns all session state
//! (index, processed file names, conversation history) and is the single
//! mutation point for it.
//!
//! Failure policy: no collaborator fault is fatal. Ingestion failures leave
//! prior state untouched and are reported in the [`IngestReport`];
//! generation failures surface as a descriptive answer string with no
//! citations. Every error is recoverable at the next user action.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::assemble::assemble;
use crate::chunk::split_pages;
use crate::config::Config;
use crate::dedupe::dedupe;
use crate::embedding::{create_embedder, embed_query, Embedder};
use crate::extract::extract_pages;
use crate::generation::{create_generator, Generator};
use crate::history::History;
use crate::index::{IndexEntry, VectorIndex};
use crate::models::{Chunk, Citation, DocumentInput};

/// Fixed response for questions asked before any document is ingested.
pub const NO_DOCUMENTS_ANSWER: &str =
    "Please load one or more documents before asking questions.";

/// Outcome of one `ingest` call.
#[derive(Debug)]
pub struct IngestReport {
    /// Whether the engine state advanced (or the batch was a clean no-op).
    pub ok: bool,
    /// Names of files whose chunks entered the index, in input order.
    pub files_ingested: Vec<String>,
    /// Skipped files with the reason each was skipped.
    pub files_skipped: Vec<(String, String)>,
    /// Number of chunks added to the index by this call.
    pub chunks_indexed: usize,
    /// One-line human-readable summary.
    pub message: String,
}

/// Outcome of one `ask` call.
#[derive(Debug)]
pub struct AskOutcome {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// The conversational document Q&A engine.
///
/// Owns one session's state exclusively; not safe for concurrent mutation
/// from multiple callers without external serialization. Each `ingest` and
/// `ask` is one blocking unit of work from the caller's perspective.
pub struct Engine {
    config: Config,
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
    index: Option<VectorIndex>,
    processed_files: Vec<String>,
    seen_hashes: HashSet<String>,
    history: History,
}

impl Engine {
    /// Build an engine with explicit provider implementations.
    ///
    /// The engine depends only on the [`Embedder`] and [`Generator`] traits;
    /// tests substitute scripted implementations here.
    pub fn new(config: Config, embedder: Box<dyn Embedder>, generator: Box<dyn Generator>) -> Self {
        Self {
            config,
            embedder,
            generator,
            index: None,
            processed_files: Vec::new(),
            seen_hashes: HashSet::new(),
            history: History::new(),
        }
    }

    /// Build an engine with providers chosen from the configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let generator = create_generator(&config.generation)?;
        Ok(Self::new(config, embedder, generator))
    }

    /// Ingest a batch of documents into the session index.
    ///
    /// Files are processed independently: one unreadable file is skipped
    /// with a reason while the rest of the batch proceeds. A file whose
    /// content hash was already ingested this session is a no-op skip.
    /// Ingestion is cumulative across calls.
    ///
    /// The index swap is atomic — embedding the new chunks and building the
    /// merged index happen on the side, and engine state only changes when
    /// the whole batch has succeeded. Any failure leaves the previous index
    /// (if any) still answering.
    pub async fn ingest(&mut self, documents: Vec<DocumentInput>) -> IngestReport {
        let mut ingested: Vec<String> = Vec::new();
        let mut skipped: Vec<(String, String)> = Vec::new();
        let mut pending_hashes: Vec<String> = Vec::new();
        let mut new_chunks: Vec<Chunk> = Vec::new();
        let total = documents.len();

        for doc in documents {
            let hash = content_hash(&doc.bytes);
            if self.seen_hashes.contains(&hash) || pending_hashes.contains(&hash) {
                skipped.push((doc.name, "already ingested (identical content)".to_string()));
                continue;
            }

            let pages = match extract_pages(&doc.name, &doc.bytes) {
                Ok(pages) => pages,
                Err(e) => {
                    skipped.push((doc.name, e.to_string()));
                    continue;
                }
            };

            let chunks = split_pages(&doc.name, &pages, &self.config.chunking);
            if chunks.is_empty() {
                skipped.push((doc.name, "no extractable text".to_string()));
                continue;
            }

            new_chunks.extend(chunks);
            pending_hashes.push(hash);
            ingested.push(doc.name);
        }

        if new_chunks.is_empty() {
            // A batch of already-ingested files is a clean no-op; anything
            // else produced zero chunks and is a failure.
            let all_duplicates = !skipped.is_empty()
                && skipped.iter().all(|(_, reason)| reason.starts_with("already ingested"));
            return IngestReport {
                ok: all_duplicates,
                files_ingested: Vec::new(),
                files_skipped: skipped,
                chunks_indexed: 0,
                message: if all_duplicates {
                    "All files were already ingested; nothing to do.".to_string()
                } else {
                    format!("No content could be extracted from {} file(s).", total)
                },
            };
        }

        let chunk_count = new_chunks.len();

        let new_entries = match VectorIndex::embed_chunks(new_chunks, self.embedder.as_ref()).await
        {
            Ok(entries) => entries,
            Err(e) => {
                return IngestReport {
                    ok: false,
                    files_ingested: Vec::new(),
                    files_skipped: skipped,
                    chunks_indexed: 0,
                    message: format!("Ingestion failed while embedding: {}", e),
                };
            }
        };

        let mut entries: Vec<IndexEntry> = self
            .index
            .as_ref()
            .map(|index| index.entries().to_vec())
            .unwrap_or_default();
        entries.extend(new_entries);

        let merged = match VectorIndex::new(entries) {
            Ok(index) => index,
            Err(e) => {
                return IngestReport {
                    ok: false,
                    files_ingested: Vec::new(),
                    files_skipped: skipped,
                    chunks_indexed: 0,
                    message: format!("Ingestion failed: {}", e),
                };
            }
        };

        // Full success: commit the new index and bookkeeping together.
        self.index = Some(merged);
        self.seen_hashes.extend(pending_hashes);
        self.processed_files.extend(ingested.iter().cloned());

        let message = if skipped.is_empty() {
            format!(
                "Successfully processed {} file(s) ({} chunks).",
                ingested.len(),
                chunk_count
            )
        } else {
            format!(
                "Successfully processed {} file(s) ({} chunks); skipped {}.",
                ingested.len(),
                chunk_count,
                skipped.len()
            )
        };

        IngestReport {
            ok: true,
            files_ingested: ingested,
            files_skipped: skipped,
            chunks_indexed: chunk_count,
            message,
        }
    }

    /// Answer a question from the ingested documents.
    ///
    /// With no documents loaded this returns the fixed placeholder answer
    /// and changes nothing. Service failures (embedding the question or
    /// generating the answer) are converted into a descriptive answer
    /// string with no citations; the failed exchange is not recorded in
    /// history, so a transient fault never poisons later prompts.
    pub async fn ask(&mut self, question: &str) -> AskOutcome {
        let index = match &self.index {
            Some(index) if !index.is_empty() => index,
            _ => {
                return AskOutcome {
                    answer: NO_DOCUMENTS_ANSWER.to_string(),
                    citations: Vec::new(),
                }
            }
        };

        let query_vec = match embed_query(self.embedder.as_ref(), question).await {
            Ok(v) => v,
            Err(e) => {
                return AskOutcome {
                    answer: format!("Error answering question: {}", e),
                    citations: Vec::new(),
                }
            }
        };

        let hits: Vec<Chunk> = index
            .search(&query_vec, self.config.retrieval.top_k)
            .into_iter()
            .map(|(chunk, _score)| chunk.clone())
            .collect();

        let prompt = assemble(
            &hits,
            self.history.turns(),
            self.config.history.max_turns,
            question,
        );

        let answer = match self.generator.generate(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                return AskOutcome {
                    answer: format!("Error generating response: {}", e),
                    citations: Vec::new(),
                }
            }
        };

        self.history.push(question, answer.clone());

        let citations = dedupe(
            &hits,
            self.config.retrieval.max_citations,
            self.config.retrieval.dedupe_prefix_chars,
            self.config.retrieval.snippet_chars,
        );

        AskOutcome { answer, citations }
    }

    /// Drop the index, processed file names, and history together.
    pub fn reset(&mut self) {
        self.index = None;
        self.processed_files.clear();
        self.seen_hashes.clear();
        self.history.clear();
    }

    /// Forget the conversation but keep the ingested documents.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Names of successfully ingested files, in ingestion order.
    pub fn sources(&self) -> &[String] {
        &self.processed_files
    }

    pub fn has_documents(&self) -> bool {
        self.index.as_ref().map(|i| !i.is_empty()).unwrap_or(false)
    }

    pub fn chunk_count(&self) -> usize {
        self.index.as_ref().map(|i| i.len()).unwrap_or(0)
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
