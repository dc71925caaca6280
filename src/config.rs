use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure loaded from data_prep_agent.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Filesystem locations shared by the tools and the front end
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding uploaded CSVs; the header extractor reads from here
    pub data_dir: PathBuf,
    /// Directory for the persisted feature/label assignment
    pub output_dir: PathBuf,
    /// Directory for generated notebooks
    pub notebook_dir: PathBuf,
    /// Dataset file name, relative to `data_dir`, loaded by the first notebook cell
    pub dataset_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data_files"),
            output_dir: PathBuf::from("output"),
            notebook_dir: PathBuf::from("jupyter_notebooks"),
            dataset_file: "train.csv".to_string(),
        }
    }
}

impl PathsConfig {
    pub fn assignment_path(&self) -> PathBuf {
        self.output_dir
            .join(crate::classifier::ASSIGNMENT_FILE_NAME)
    }

    pub fn notebook_path(&self) -> PathBuf {
        self.notebook_dir
            .join(crate::generation::NOTEBOOK_FILE_NAME)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(&self.dataset_file)
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
    /// Never read from the TOML file; populated from DPA_LLM_API_KEY / OPENAI_API_KEY
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_ms: 120_000,
            api_key: None,
        }
    }
}

/// Feature/label classification behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub max_attempts: u32,
    pub temperature: f32,
    pub retry_temperature: f32,
    pub max_tokens: u32,
    /// Treat features/labels that are not real column headers as malformed output
    pub validate_headers: bool,
    /// Fill the retry prompt with the user's instructions instead of leaving the slot empty
    pub retry_with_instructions: bool,
    /// Issue a second, unconditional model call after every failed attempt
    pub duplicate_retry_call: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            temperature: 0.1,
            retry_temperature: 0.5,
            max_tokens: 2000,
            validate_headers: true,
            retry_with_instructions: false,
            duplicate_retry_call: false,
        }
    }
}

/// Notebook generation model parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

/// Text file ingestion and retrieval
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestConfig {
    /// e.g. "docs/**/*.txt"; ingestion is skipped when unset
    pub glob: Option<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            glob: None,
            chunk_size: 1024,
            chunk_overlap: 200,
            top_k: 4,
            embedding_provider: "openai".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
        }
    }
}

/// Upload + chat web front end
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub bind: std::net::SocketAddr,
    pub agent_service_url: String,
    pub request_timeout_ms: u64,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            bind: std::net::SocketAddr::from(([127, 0, 0, 1], 5000)),
            agent_service_url: "http://localhost:8000/generate".to_string(),
            request_timeout_ms: 300_000,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub mcp_no_log: bool,
    pub log_level: String,
    // HTTP transport configuration
    pub transport: String,
    pub http_bind: std::net::SocketAddr,
    pub http_path: String,
    pub bearer_token: Option<String>,
    pub http_sse_keepalive_sec: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mcp_no_log: false,
            log_level: "data_prep_agent=info,rmcp=info".to_string(),
            transport: "stdio".to_string(),
            http_bind: std::net::SocketAddr::from(([127, 0, 0, 1], 8787)),
            http_path: "/mcp".to_string(),
            bearer_token: None,
            http_sse_keepalive_sec: 15,
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses DATA_PREP_CONFIG environment variable or defaults to "data_prep_agent.toml"
    pub fn load() -> anyhow::Result<Self> {
        // DPA_ENV_FILE if set, else ./.env
        if let Ok(env_path) = std::env::var("DPA_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let config_path = std::env::var("DATA_PREP_CONFIG")
            .unwrap_or_else(|_| "data_prep_agent.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            toml::from_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Env-first overrides for paths, endpoints and secrets
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DPA_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DPA_OUTPUT_DIR") {
            self.paths.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DPA_NOTEBOOK_DIR") {
            self.paths.notebook_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DPA_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DPA_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DPA_INGEST_GLOB")
            && !v.trim().is_empty()
        {
            self.ingest.glob = Some(v);
        }
        if let Ok(v) = std::env::var("DPA_AGENT_URL") {
            self.frontend.agent_service_url = v;
        }
        if let Ok(v) = std::env::var("DPA_FRONTEND_BIND")
            && let Ok(bind) = v.parse::<std::net::SocketAddr>()
        {
            self.frontend.bind = bind;
        }

        let is_placeholder = |s: &str| {
            let t = s.trim();
            t.is_empty() || t.contains("${") || t.eq_ignore_ascii_case("changeme")
        };
        self.llm.api_key = std::env::var("DPA_LLM_API_KEY")
            .ok()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !is_placeholder(k));
    }

    /// Clamp out-of-range values and reject unusable ones
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if self.classifier.max_attempts == 0 {
            self.classifier.max_attempts = 1;
        } else if self.classifier.max_attempts > 10 {
            tracing::warn!(
                "classifier.max_attempts {} exceeds max 10, clamping to 10",
                self.classifier.max_attempts
            );
            self.classifier.max_attempts = 10;
        }

        if self.ingest.chunk_size == 0 {
            anyhow::bail!("ingest.chunk_size must be > 0");
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            let clamped = self.ingest.chunk_size / 5;
            tracing::warn!(
                "ingest.chunk_overlap {} must be smaller than chunk_size {}, using {}",
                self.ingest.chunk_overlap,
                self.ingest.chunk_size,
                clamped
            );
            self.ingest.chunk_overlap = clamped;
        }
        if self.ingest.top_k == 0 {
            self.ingest.top_k = 1;
        }

        if !self.llm.base_url.starts_with("http://") && !self.llm.base_url.starts_with("https://")
        {
            anyhow::bail!(
                "llm.base_url '{}' must start with http:// or https://",
                self.llm.base_url
            );
        }
        if self.llm.api_key.is_none() {
            tracing::warn!("No DPA_LLM_API_KEY or OPENAI_API_KEY set; model calls will be unauthenticated");
        }

        match self.runtime.transport.as_str() {
            "stdio" | "http" => {}
            other => anyhow::bail!("Unknown transport '{}', expected stdio or http", other),
        }

        Ok(())
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        let mut cfg = Self {
            mcp_no_log: std::env::var("MCP_NO_LOG")
                .ok()
                .is_some_and(|v| v == "true" || v == "1"),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "data_prep_agent=info,rmcp=info".to_string()),
            ..Self::default()
        };

        cfg.transport = std::env::var("DPA_TRANSPORT").unwrap_or_else(|_| "stdio".to_string());
        if let Ok(v) = std::env::var("DPA_HTTP_BIND")
            && let Ok(bind) = v.parse::<std::net::SocketAddr>()
        {
            cfg.http_bind = bind;
        }
        cfg.http_path = std::env::var("DPA_HTTP_PATH").unwrap_or_else(|_| "/mcp".to_string());
        cfg.bearer_token = std::env::var("DPA_BEARER_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        if let Some(sse) = std::env::var("DPA_HTTP_SSE_KEEPALIVE_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            cfg.http_sse_keepalive_sec = sse;
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [paths]
            data_dir = "uploads"

            [classifier]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.data_dir, PathBuf::from("uploads"));
        assert_eq!(config.paths.dataset_file, "train.csv");
        assert_eq!(config.classifier.max_attempts, 5);
        assert!((config.classifier.retry_temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.ingest.chunk_size, 1024);
        assert_eq!(config.ingest.glob, None);
    }

    #[test]
    fn validate_clamps_attempts_and_overlap() {
        let mut config = Config::default();
        config.classifier.max_attempts = 0;
        config.ingest.chunk_size = 100;
        config.ingest.chunk_overlap = 100;
        config.validate().unwrap();

        assert_eq!(config.classifier.max_attempts, 1);
        assert_eq!(config.ingest.chunk_overlap, 20);
    }

    #[test]
    fn validate_rejects_unknown_transport() {
        let mut config = Config::default();
        config.runtime.transport = "carrier-pigeon".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn derived_paths_use_fixed_file_names() {
        let paths = PathsConfig::default();
        assert_eq!(
            paths.assignment_path(),
            PathBuf::from("output/feature_label_identifier_result.json")
        );
        assert_eq!(
            paths.notebook_path(),
            PathBuf::from("jupyter_notebooks/generated_notebook.ipynb")
        );
        assert_eq!(paths.dataset_path(), PathBuf::from("data_files/train.csv"));
    }
}
