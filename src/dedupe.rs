//! Citation deduplication.
//!
//! Retrieval often returns overlapping chunks of the same passage (the
//! chunker's overlap guarantees it for boundary-adjacent hits). For display
//! purposes two chunks are the same source if their leading characters
//! match; the first occurrence in retrieval order wins.

use std::collections::HashSet;

use crate::models::{Chunk, Citation};

/// Collapse retrieved chunks into a short, display-ready citation list.
///
/// Chunks whose first `prefix_chars` characters are identical are
/// duplicates; later ones are dropped. Output preserves retrieval order of
/// first occurrences and is truncated to `max_results`. Snippets are
/// bounded to `snippet_chars` characters with a `...` marker appended when
/// the chunk text was actually truncated.
pub fn dedupe(
    chunks: &[Chunk],
    max_results: usize,
    prefix_chars: usize,
    snippet_chars: usize,
) -> Vec<Citation> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut citations = Vec::new();

    for chunk in chunks {
        let key: String = chunk.text.chars().take(prefix_chars).collect();
        if !seen.insert(key) {
            continue;
        }

        citations.push(Citation {
            source_name: chunk.source_name.clone(),
            page_number: chunk.page_number,
            snippet: make_snippet(&chunk.text, snippet_chars),
        });

        if citations.len() == max_results {
            break;
        }
    }

    citations
}

/// Truncate to `max_chars` characters, marking truncation with `...`.
/// Counts characters, not bytes, so multi-byte text is never cut mid-char.
fn make_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: i64, text: &str) -> Chunk {
        Chunk {
            id: format!("c{}", index),
            source_name: "doc.pdf".to_string(),
            page_number: Some(index as u32 + 1),
            chunk_index: index,
            text: text.to_string(),
            hash: String::new(),
        }
    }

    #[test]
    fn drops_later_duplicates_keeps_order() {
        // [A, A, B, A] -> [A, B]
        let chunks = vec![
            chunk(0, "alpha passage"),
            chunk(1, "alpha passage"),
            chunk(2, "beta passage"),
            chunk(3, "alpha passage"),
        ];
        let citations = dedupe(&chunks, 3, 200, 300);
        assert_eq!(citations.len(), 2);
        assert!(citations[0].snippet.starts_with("alpha"));
        assert!(citations[1].snippet.starts_with("beta"));
        // First-seen wins: page from chunk 0, not chunk 1 or 3.
        assert_eq!(citations[0].page_number, Some(1));
    }

    #[test]
    fn truncates_to_max_results() {
        let chunks: Vec<Chunk> = (0..5)
            .map(|i| chunk(i, &format!("distinct passage number {}", i)))
            .collect();
        let citations = dedupe(&chunks, 3, 200, 300);
        assert_eq!(citations.len(), 3);
    }

    #[test]
    fn prefix_shorter_than_text_matches_duplicates() {
        // Same first 10 chars, different tails.
        let chunks = vec![
            chunk(0, "shared-head tail one"),
            chunk(1, "shared-head tail two"),
        ];
        let citations = dedupe(&chunks, 3, 10, 300);
        assert_eq!(citations.len(), 1);
    }

    #[test]
    fn snippet_marked_when_truncated() {
        let long = "x".repeat(400);
        let citations = dedupe(&[chunk(0, &long)], 3, 200, 300);
        assert_eq!(citations[0].snippet.chars().count(), 303);
        assert!(citations[0].snippet.ends_with("..."));
    }

    #[test]
    fn snippet_unmarked_when_it_fits() {
        let citations = dedupe(&[chunk(0, "short text")], 3, 200, 300);
        assert_eq!(citations[0].snippet, "short text");
    }

    #[test]
    fn multibyte_prefix_and_snippet_are_char_safe() {
        let text = "é".repeat(350);
        let citations = dedupe(&[chunk(0, &text)], 3, 300, 300);
        assert!(citations[0].snippet.ends_with("..."));
        assert_eq!(citations[0].snippet.chars().count(), 303);
    }

    #[test]
    fn empty_input_empty_output() {
        assert!(dedupe(&[], 3, 200, 300).is_empty());
    }
}
