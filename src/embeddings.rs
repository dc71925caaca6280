use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{IngestConfig, LlmConfig};

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn dimensions(&self) -> usize;
}

// OpenAI-compatible API implementation
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dims: usize,
    attempts: u32,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponseData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIResponseData>,
}

impl OpenAIEmbedder {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: String,
        dims: Option<usize>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("Failed to build reqwest client with timeout")?;

        let dims = dims.unwrap_or(match model.as_str() {
            // Known OpenAI embedding dims
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            _ => 1536,
        });

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
            model,
            dims,
            attempts: 3,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(
            "Generating OpenAI embedding (model={}, chars={})",
            self.model,
            text.len()
        );

        let body = OpenAIRequest {
            model: &self.model,
            input: text,
        };

        // Retry with simple exponential backoff
        let mut last_err: Option<anyhow::Error> = None;
        for i in 0..self.attempts {
            let mut req = self.client.post(&self.endpoint).json(&body);
            if let Some(key) = &self.api_key {
                req = req.bearer_auth(key);
            }
            let send_res = req
                .send()
                .await
                .context("Failed to send request to embeddings API");
            let response = match send_res {
                Ok(resp) => resp,
                Err(e) => {
                    last_err = Some(e);
                    let delay_ms = 200u64 * (1u64 << i);
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                last_err = Some(anyhow::anyhow!(
                    "Embeddings API error {}: {}",
                    status,
                    error_text
                ));
                let delay_ms = 200u64 * (1u64 << i);
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                continue;
            }

            let parse_res: Result<OpenAIResponse> = response
                .json()
                .await
                .context("Failed to parse embeddings response");
            match parse_res {
                Ok(result) => {
                    return result
                        .data
                        .into_iter()
                        .next()
                        .map(|d| d.embedding)
                        .context("No embedding returned from embeddings API");
                }
                Err(e) => {
                    last_err = Some(e);
                    let delay_ms = 200u64 * (1u64 << i);
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Unknown embedding error")))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Deterministic local embedder (no network).
///
/// Lowercased alphanumeric tokens are hashed into buckets, so texts sharing
/// words land close together under cosine similarity.
pub struct FakeEmbedder {
    dims: usize,
}

impl FakeEmbedder {
    pub fn new(dims: Option<usize>) -> Self {
        let d = dims.unwrap_or(256).max(1);
        Self { dims: d }
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut out = vec![0.0f32; self.dims];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        for token in tokens {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let mut idx = [0u8; 8];
            idx.copy_from_slice(&bytes[..8]);
            let bucket = (u64::from_le_bytes(idx) % self.dims as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            out[bucket] += sign;
        }

        // Normalize to unit length to emulate real embeddings
        let norm: f32 = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut out {
                *v /= norm;
            }
        }
        out
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Build the embedder named by `ingest.embedding_provider`
pub fn create_embedder(ingest: &IngestConfig, llm: &LlmConfig) -> Result<Arc<dyn Embedder>> {
    match ingest.embedding_provider.as_str() {
        "openai" => {
            if llm.api_key.is_none() && llm.base_url.contains("api.openai.com") {
                anyhow::bail!(
                    "embedding_provider=openai but neither DPA_LLM_API_KEY nor OPENAI_API_KEY is set"
                );
            }
            info!(
                "Using OpenAI-compatible embeddings (model={})",
                ingest.embedding_model
            );
            Ok(Arc::new(OpenAIEmbedder::new(
                &llm.base_url,
                llm.api_key.clone(),
                ingest.embedding_model.clone(),
                Some(ingest.embedding_dimensions),
            )?))
        }
        "fake" | "local" => {
            let fake = FakeEmbedder::new(Some(ingest.embedding_dimensions));
            info!(
                "Using FakeEmbedder (deterministic) with {} dimensions",
                fake.dimensions()
            );
            Ok(Arc::new(fake))
        }
        other => anyhow::bail!("Unknown embedding provider '{}'", other),
    }
}
