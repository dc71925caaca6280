//! Text ingestion over a scratch corpus with the deterministic embedder

use std::sync::Arc;

use data_prep_agent::embeddings::FakeEmbedder;
use data_prep_agent::error::DataPrepError;
use data_prep_agent::ingest::{RecursiveCharacterSplitter, TextIngestConfig, TextIngestor};

fn config(glob: String, chunk_size: usize, chunk_overlap: usize) -> TextIngestConfig {
    TextIngestConfig {
        glob,
        chunk_size,
        chunk_overlap,
        top_k: 4,
    }
}

#[tokio::test]
async fn ingests_matching_files_and_skips_non_utf8() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("a.txt"), "alpha beta gamma").unwrap();
    std::fs::write(dir.path().join("nested/b.txt"), "delta epsilon").unwrap();
    std::fs::write(dir.path().join("c.md"), "not matched").unwrap();
    std::fs::write(dir.path().join("binary.txt"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let ingestor = TextIngestor::new(
        Arc::new(FakeEmbedder::new(Some(64))),
        config(format!("{}/**/*.txt", dir.path().display()), 1024, 200),
    );
    let (retriever, report) = ingestor.ingest().await.unwrap();

    assert_eq!(report.files_matched, 3);
    assert_eq!(report.documents_loaded, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.chunks_indexed, 2);
    assert_eq!(retriever.chunk_count(), 2);
}

#[tokio::test]
async fn long_documents_are_chunked_within_size() {
    let dir = tempfile::tempdir().unwrap();
    let paragraph = "The quick brown fox jumps over the lazy dog. ".repeat(20);
    let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
    std::fs::write(dir.path().join("fox.txt"), &text).unwrap();

    let splitter = RecursiveCharacterSplitter::new(200, 40);
    for chunk in splitter.split_text(&text) {
        assert!(chunk.chars().count() <= 200);
    }

    let (retriever, report) = TextIngestor::new(
        Arc::new(FakeEmbedder::new(Some(64))),
        config(format!("{}/fox.txt", dir.path().display()), 200, 40),
    )
    .ingest()
    .await
    .unwrap();
    assert!(report.chunks_indexed > 3);

    let out = retriever.query("lazy dog", Some(2)).await.unwrap();
    assert_eq!(out.split("\n\n").count(), 2);
}

#[tokio::test]
async fn empty_match_yields_empty_answers() {
    let dir = tempfile::tempdir().unwrap();
    let (retriever, report) = TextIngestor::new(
        Arc::new(FakeEmbedder::new(Some(16))),
        config(format!("{}/*.txt", dir.path().display()), 100, 10),
    )
    .ingest()
    .await
    .unwrap();
    assert_eq!(report.files_matched, 0);
    assert_eq!(retriever.query("anything", None).await.unwrap(), "");
}

#[tokio::test]
async fn missing_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let result = TextIngestor::new(
        Arc::new(FakeEmbedder::new(Some(16))),
        config(format!("{}/missing/*.txt", dir.path().display()), 100, 10),
    )
    .ingest()
    .await;
    assert!(matches!(result, Err(DataPrepError::NotFound { .. })));
}
