//! In-memory vector index over embedded chunks.
//!
//! The index owns its entries and is immutable after construction. Search is
//! brute-force cosine similarity over all stored vectors — document sets are
//! session-sized, so there is no ANN structure. Re-ingestion builds a whole
//! new index and the engine swaps it in only on full success, so a failure
//! mid-build never leaves a partially populated index behind.

use anyhow::{bail, Result};

use crate::embedding::{cosine_similarity, Embedder};
use crate::models::Chunk;

/// One stored unit: a chunk and its embedding vector.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Immutable vector index with a fixed dimensionality.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dims: usize,
}

impl VectorIndex {
    /// Build an index from pre-embedded entries.
    ///
    /// All vectors must share one dimensionality; mixing embedders within
    /// one index is rejected here rather than surfacing as silent zero
    /// similarity scores at query time.
    pub fn new(entries: Vec<IndexEntry>) -> Result<Self> {
        let dims = entries.first().map(|e| e.vector.len()).unwrap_or(0);
        for entry in &entries {
            if entry.vector.len() != dims {
                bail!(
                    "mixed embedding dimensions in index: {} vs {}",
                    entry.vector.len(),
                    dims
                );
            }
        }
        Ok(Self { entries, dims })
    }

    /// Embed every chunk once and return the stored entries, in input order.
    ///
    /// Cost is O(n) embedded texts. Vectors that do not match the embedder's
    /// declared dimensionality are a hard error.
    pub async fn embed_chunks(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
    ) -> Result<Vec<IndexEntry>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;

        if vectors.len() != chunks.len() {
            bail!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }
        for vector in &vectors {
            if vector.len() != embedder.dims() {
                bail!(
                    "embedder '{}' returned a {}-dim vector, expected {}",
                    embedder.model_name(),
                    vector.len(),
                    embedder.dims()
                );
            }
        }

        Ok(chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect())
    }

    /// Embed chunks and build a fresh index in one step.
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        let entries = Self::embed_chunks(chunks, embedder).await?;
        Self::new(entries)
    }

    /// The `k` nearest stored chunks to `query`, by descending cosine
    /// similarity. Ties keep insertion order (the sort is stable). `k`
    /// larger than the index just returns everything; an empty index
    /// returns an empty vector.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(&Chunk, f32)> {
        let mut scored: Vec<(&Chunk, f32)> = self
            .entries
            .iter()
            .map(|e| (&e.chunk, cosine_similarity(query, &e.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: i64, text: &str) -> Chunk {
        Chunk {
            id: format!("c{}", index),
            source_name: "doc.pdf".to_string(),
            page_number: Some(1),
            chunk_index: index,
            text: text.to_string(),
            hash: String::new(),
        }
    }

    fn entry(index: i64, text: &str, vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            chunk: chunk(index, text),
            vector,
        }
    }

    #[test]
    fn empty_index_returns_empty() {
        let index = VectorIndex::new(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 4).is_empty());
    }

    #[test]
    fn search_orders_by_similarity() {
        let index = VectorIndex::new(vec![
            entry(0, "east", vec![1.0, 0.0]),
            entry(1, "north", vec![0.0, 1.0]),
            entry(2, "northeast", vec![0.7, 0.7]),
        ])
        .unwrap();

        let hits = index.search(&[1.0, 0.1], 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0.text, "east");
        assert_eq!(hits[1].0.text, "northeast");
        assert_eq!(hits[2].0.text, "north");
        assert!(hits[0].1 >= hits[1].1 && hits[1].1 >= hits[2].1);
    }

    #[test]
    fn exact_k_results_for_all_k() {
        let entries: Vec<IndexEntry> = (0..6)
            .map(|i| entry(i, &format!("chunk {}", i), vec![i as f32 + 1.0, 1.0]))
            .collect();
        let index = VectorIndex::new(entries).unwrap();
        for k in 0..=6 {
            assert_eq!(index.search(&[1.0, 1.0], k).len(), k);
        }
        assert_eq!(index.search(&[1.0, 1.0], 50).len(), 6);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = VectorIndex::new(vec![
            entry(0, "first", vec![1.0, 0.0]),
            entry(1, "second", vec![1.0, 0.0]),
            entry(2, "third", vec![2.0, 0.0]),
        ])
        .unwrap();

        // All three have identical cosine similarity to the query.
        let hits = index.search(&[1.0, 0.0], 3);
        assert_eq!(hits[0].0.text, "first");
        assert_eq!(hits[1].0.text, "second");
        assert_eq!(hits[2].0.text, "third");
    }

    #[test]
    fn rejects_mixed_dimensions() {
        let result = VectorIndex::new(vec![
            entry(0, "a", vec![1.0, 0.0]),
            entry(1, "b", vec![1.0, 0.0, 0.0]),
        ]);
        assert!(result.is_err());
    }
}
