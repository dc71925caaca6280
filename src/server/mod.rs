//! Server module containing the DataPrepServer implementation

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::{ChatCompletionsClient, LanguageModel};
use crate::config::Config;
use crate::embeddings::create_embedder;
use crate::error::Result;
use crate::ingest::{TextIngestConfig, TextIngestor, TextRetriever};

pub mod router;

/// Tool server shared across MCP sessions
#[derive(Clone)]
pub struct DataPrepServer {
    pub config: Arc<Config>,
    pub llm: Arc<dyn LanguageModel>,
    pub retriever: Option<Arc<TextRetriever>>, // None when no ingest glob is configured
}

impl DataPrepServer {
    /// Build the server from configuration: the chat-completions client and,
    /// when `ingest.glob` is set, the retrieval index.
    pub async fn new(config: Config) -> Result<Self> {
        let llm: Arc<dyn LanguageModel> = Arc::new(ChatCompletionsClient::new(&config.llm)?);

        let retriever = match TextIngestConfig::from_config(&config.ingest) {
            Some(ingest_cfg) => {
                let embedder = create_embedder(&config.ingest, &config.llm)?;
                let (retriever, report) = TextIngestor::new(embedder, ingest_cfg).ingest().await?;
                for err in &report.errors {
                    warn!("ingest: {}", err);
                }
                Some(Arc::new(retriever))
            }
            None => {
                info!("No ingest glob configured; text_file_ingest will report an empty corpus");
                None
            }
        };

        Ok(Self::with_parts(config, llm, retriever))
    }

    /// Assemble a server from already-built capabilities
    pub fn with_parts(
        config: Config,
        llm: Arc<dyn LanguageModel>,
        retriever: Option<Arc<TextRetriever>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            llm,
            retriever,
        }
    }
}
