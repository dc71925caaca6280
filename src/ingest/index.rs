//! In-memory vector index and the retriever built on it

use std::sync::Arc;

use tracing::debug;

use super::Chunk;
use crate::embeddings::Embedder;
use crate::error::{DataPrepError, Result};

/// Cosine similarity; zero when either vector has no magnitude or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<(Chunk, Vec<f32>)>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) {
        self.entries.push((chunk, embedding));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `k` chunks by similarity, best first. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(f32, &Chunk)> {
        let mut scored: Vec<(f32, &Chunk)> = self
            .entries
            .iter()
            .map(|(chunk, emb)| (cosine_similarity(query, emb), chunk))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

pub struct TextRetriever {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl TextRetriever {
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k: top_k.max(1),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Text of the best matching chunks joined by blank lines.
    /// An empty index answers with an empty string.
    pub async fn query(&self, query: &str, top_k: Option<usize>) -> Result<String> {
        if self.index.is_empty() {
            return Ok(String::new());
        }
        let k = top_k.unwrap_or(self.top_k).max(1);
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| DataPrepError::Embedding {
                message: e.to_string(),
            })?;
        let hits = self.index.search(&embedding, k);
        debug!(
            "Retrieved {} chunk(s) for query (best score {:.3})",
            hits.len(),
            hits.first().map(|h| h.0).unwrap_or(0.0)
        );
        Ok(hits
            .into_iter()
            .map(|(_, chunk)| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}
