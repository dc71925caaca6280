//! text_file_ingest tool handler: retrieval over the ingested corpus

use crate::error::{DataPrepError, Result};
use crate::server::DataPrepServer;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use serde::Deserialize;
use tracing::info;

pub const NO_CORPUS_STATUS: &str =
    "No text corpus is configured. Set ingest.glob (or DPA_INGEST_GLOB) and restart the server.";

#[derive(Debug, Deserialize)]
pub struct TextQueryParams {
    pub query: String,
    #[serde(
        default,
        deserialize_with = "crate::deserializers::de_option_usize_forgiving"
    )]
    pub top_k: Option<usize>,
}

impl DataPrepServer {
    pub async fn handle_text_file_ingest(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult> {
        let params: TextQueryParams = super::parse_params(request)?;
        let text = self.query_corpus(&params.query, params.top_k).await?;
        Ok(super::status_result(text))
    }

    /// Best matching chunk texts joined by blank lines
    pub async fn query_corpus(&self, query: &str, top_k: Option<usize>) -> Result<String> {
        if query.trim().is_empty() {
            return Err(DataPrepError::Validation {
                message: "'query' must not be empty".into(),
            });
        }
        let Some(retriever) = &self.retriever else {
            return Ok(NO_CORPUS_STATUS.to_string());
        };
        info!(
            "text_file_ingest: query over {} chunk(s)",
            retriever.chunk_count()
        );
        retriever.query(query, top_k.map(|k| k.clamp(1, 50))).await
    }
}
