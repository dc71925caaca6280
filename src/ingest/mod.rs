//! Ingest module for retrieval over plain text files
//!
//! Files matching a glob are loaded one at a time, split into overlapping
//! character chunks, embedded, and held in an in-memory vector index. The
//! resulting [`TextRetriever`] answers similarity queries with the text of
//! the best matching chunks.

use crate::embeddings::Embedder;
use crate::error::{DataPrepError, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub mod index;
pub mod loader;
pub mod splitter;

pub use index::{TextRetriever, VectorIndex};
pub use loader::{GlobSpec, discover_files};
pub use splitter::RecursiveCharacterSplitter;

/// Configuration for text ingestion
#[derive(Debug, Clone)]
pub struct TextIngestConfig {
    pub glob: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl TextIngestConfig {
    pub fn from_config(ingest: &crate::config::IngestConfig) -> Option<Self> {
        ingest.glob.as_ref().map(|glob| Self {
            glob: glob.clone(),
            chunk_size: ingest.chunk_size,
            chunk_overlap: ingest.chunk_overlap,
            top_k: ingest.top_k,
        })
    }
}

/// Text document loaded from the filesystem
#[derive(Debug, Serialize)]
pub struct Document {
    pub source: PathBuf,
    pub content: String,
}

/// Bounded slice of a document; the unit of embedding and retrieval
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub id: String,
    pub source: PathBuf,
    pub index: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(source: PathBuf, index: usize, text: String) -> Self {
        let id = utils::chunk_id(&source, index, &text);
        Self {
            id,
            source,
            index,
            text,
        }
    }
}

/// Result of ingestion process
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub files_matched: usize,
    pub documents_loaded: usize,
    pub chunks_indexed: usize,
    pub errors: Vec<String>,
}

/// Common utility functions
pub mod utils {
    use std::path::Path;

    /// Stable chunk id: blake3 over source path, position and text
    pub fn chunk_id(source: &Path, index: usize, text: &str) -> String {
        let hash = blake3::hash(
            format!("chunk:{}:{}:{}", source.display(), index, text).as_bytes(),
        );
        hash.to_hex()[..16].to_string()
    }
}

pub struct TextIngestor {
    embedder: Arc<dyn Embedder>,
    config: TextIngestConfig,
}

impl TextIngestor {
    pub fn new(embedder: Arc<dyn Embedder>, config: TextIngestConfig) -> Self {
        Self { embedder, config }
    }

    /// Load, split, embed and index every file matching the configured glob
    pub async fn ingest(&self) -> Result<(TextRetriever, IngestReport)> {
        info!("Ingesting documents matching {}", self.config.glob);
        let spec = GlobSpec::parse(&self.config.glob)?;
        let files = discover_files(&spec)?;
        let splitter =
            RecursiveCharacterSplitter::new(self.config.chunk_size, self.config.chunk_overlap);

        let mut report = IngestReport {
            files_matched: files.len(),
            ..IngestReport::default()
        };
        let mut index = VectorIndex::new();

        for path in files {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.errors.push(format!("{}: {}", path.display(), e));
                    continue;
                }
            };
            let doc = Document {
                source: path,
                content,
            };
            report.documents_loaded += 1;

            for (i, text) in splitter.split_text(&doc.content).into_iter().enumerate() {
                let embedding = self.embedder.embed(&text).await.map_err(|e| {
                    DataPrepError::Embedding {
                        message: format!("{}: {}", doc.source.display(), e),
                    }
                })?;
                index.insert(Chunk::new(doc.source.clone(), i, text), embedding);
                report.chunks_indexed += 1;
            }
        }

        info!(
            "Indexed {} chunk(s) from {} document(s)",
            report.chunks_indexed, report.documents_loaded
        );
        let retriever = TextRetriever::new(index, self.embedder.clone(), self.config.top_k);
        Ok((retriever, report))
    }
}
