//! Shared test doubles for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use data_prep_agent::clients::{CompletionOptions, LanguageModel, ModelError};
use data_prep_agent::config::{Config, PathsConfig};
use data_prep_agent::ingest::TextRetriever;
use data_prep_agent::server::DataPrepServer;

/// Replays canned responses in order and records every call
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, CompletionOptions)>>,
}

impl ScriptedModel {
    pub fn new<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, CompletionOptions)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), options));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::Http("script exhausted".into()))
    }
}

/// Paths rooted in a scratch directory
pub fn scratch_paths(root: &std::path::Path) -> PathsConfig {
    PathsConfig {
        data_dir: root.join("data_files"),
        output_dir: root.join("output"),
        notebook_dir: root.join("jupyter_notebooks"),
        dataset_file: "train.csv".to_string(),
    }
}

pub fn scratch_server(
    root: &std::path::Path,
    llm: Arc<dyn LanguageModel>,
    retriever: Option<Arc<TextRetriever>>,
) -> DataPrepServer {
    let config = Config {
        paths: scratch_paths(root),
        ..Config::default()
    };
    DataPrepServer::with_parts(config, llm, retriever)
}

pub fn write_csv(dir: &std::path::Path, name: &str, contents: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}
