//! Overlapping text chunker.
//!
//! Splits extracted page text into [`Chunk`]s of a configurable character
//! length with a configurable overlap between consecutive chunks, so context
//! spanning a chunk boundary is still retrievable. Cuts prefer paragraph
//! breaks (`\n\n`), then line breaks, then spaces, then raw character
//! boundaries, in that order.
//!
//! Each chunk receives a UUID, its source document name and page number,
//! plus a SHA-256 hash of its text. Chunk indices are contiguous from 0
//! across all pages of one document.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::models::{Chunk, PageText};

/// Split a document's extracted pages into chunks.
///
/// Deterministic: the same pages and the same configuration always yield the
/// same chunk sequence (text, hash, index, page). Pages with no splittable
/// text contribute nothing.
pub fn split_pages(source_name: &str, pages: &[PageText], config: &ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut chunk_index: i64 = 0;

    for page in pages {
        for piece in split_text(&page.text, config.chunk_chars, config.overlap_chars) {
            chunks.push(make_chunk(
                source_name,
                page.page_number,
                chunk_index,
                &piece,
            ));
            chunk_index += 1;
        }
    }

    chunks
}

/// Split text into pieces of at most `max_chars` characters, with
/// `overlap_chars` characters repeated between consecutive pieces.
///
/// Lengths are counted in characters, never bytes, so multi-byte text is
/// never cut mid-character.
pub fn split_text(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<String> {
    // Byte offset of every char boundary, so windows can be sliced safely.
    let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let total = boundaries.len();
    if total == 0 {
        return Vec::new();
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + max_chars.max(1)).min(total);
        let window_start = boundaries[start];
        let window_end = if end == total {
            text.len()
        } else {
            boundaries[end]
        };
        let window = &text[window_start..window_end];

        let cut = if end == total {
            window.len()
        } else {
            pick_break(window)
        };

        let piece = window[..cut].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }

        let cut_chars = window[..cut].chars().count();
        let consumed = start + cut_chars;
        if consumed >= total {
            break;
        }

        // Step back by the overlap, but always make forward progress.
        let next = consumed.saturating_sub(overlap_chars);
        start = if next > start { next } else { consumed };
    }

    pieces
}

/// Byte offset to cut a full window at, preferring the strongest separator
/// in the back half of the window. Falls back to a hard cut at the window
/// end when no separator qualifies.
fn pick_break(window: &str) -> usize {
    let min = window.len() / 2;
    for sep in ["\n\n", "\n", " "] {
        if let Some(pos) = window.rfind(sep) {
            if pos > min {
                return pos + sep.len();
            }
        }
    }
    window.len()
}

fn make_chunk(source_name: &str, page_number: Option<u32>, index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        source_name: source_name.to_string(),
        page_number,
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}
