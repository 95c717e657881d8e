//! # DocQuery
//!
//! A conversational document Q&A engine with retrieval-augmented generation
//! and source citations.
//!
//! DocQuery ingests PDF and DOCX documents, chunks and embeds them into an
//! in-memory vector index, and answers natural-language questions from
//! document content — citing the passages each answer came from and
//! threading conversation history across turns.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌─────────────┐
//! │ Documents │──▶│   Pipeline   │──▶│ VectorIndex │
//! │ PDF/DOCX  │   │ Extract+Chunk│   │ (in-memory) │
//! └───────────┘   │   +Embed     │   └──────┬──────┘
//!                 └──────────────┘          │
//!                                           ▼
//!            question ──▶ embed ──▶ retrieve top-k
//!                                           │
//!      history ──▶ assemble prompt ◀────────┘
//!                        │
//!                        ▼
//!                 generate answer ──▶ cite sources
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dq chat report.pdf            # load a document, then ask away
//! dq ask "What changed in Q3?" --file report.pdf
//! dq extract report.pdf        # inspect extracted page text
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF and DOCX text extraction |
//! | [`chunk`] | Overlapping text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`generation`] | Generation provider abstraction |
//! | [`index`] | In-memory vector index and similarity search |
//! | [`history`] | Bounded conversation state |
//! | [`assemble`] | Prompt construction |
//! | [`dedupe`] | Citation deduplication |
//! | [`engine`] | Session orchestration: ingest / ask / reset |

pub mod assemble;
pub mod chunk;
pub mod config;
pub mod dedupe;
pub mod embedding;
pub mod engine;
pub mod extract;
pub mod generation;
pub mod history;
pub mod index;
pub mod models;
pub mod provider;
