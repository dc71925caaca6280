//! Feature/label classification of CSV column headers.
//!
//! The model is asked for a JSON object with `features` and `labels`. Its reply
//! may carry prose around the object, so the text between the first `{` and the
//! last `}` is parsed. Malformed replies are retried a bounded number of times;
//! the accepted object is persisted verbatim for the notebook generator.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clients::{CompletionOptions, LanguageModel};
use crate::config::ClassifierConfig;
use crate::error::{DataPrepError, Result};
use crate::headers::format_header_list;

pub const ASSIGNMENT_FILE_NAME: &str = "feature_label_identifier_result.json";

pub const FEATURE_LABEL_PROMPT: &str = r#"
{input}

In the context of machine learning, features are the input variables used to make predictions, while labels are the output variables that we want to predict.
Identify and discern the features and labels in a given list of column headers below.
Note to exclude not meaningful columns like "id", "timestamp", etc.

{headers}

Identify the features and labels in the above list of column headers, and give a response in JSON format with exactly two keys, "features" and "labels", each an array of column header strings.

example:
    Input: "[pixel_id, band1, band2, band3, color]"
    Output: {"features": ["band1", "band2", "band3"], "labels": ["color"]}
"#;

/// Which header columns are model inputs and which are prediction targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLabelAssignment {
    pub features: Vec<String>,
    pub labels: Vec<String>,
}

impl FeatureLabelAssignment {
    /// Load a previously persisted assignment
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DataPrepError::NotFound {
                message: format!(
                    "{} does not exist; run feature_label_identifier first",
                    path.display()
                ),
            },
            _ => e.into(),
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Entries that do not name one of `headers`
    pub fn unknown_columns<'a>(&'a self, headers: &[String]) -> Vec<&'a str> {
        let known: HashSet<&str> = headers.iter().map(String::as_str).collect();
        self.features
            .iter()
            .chain(self.labels.iter())
            .map(String::as_str)
            .filter(|c| !known.contains(c))
            .collect()
    }
}

/// Result of a successful classification run
#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    pub assignment: FeatureLabelAssignment,
    pub persisted_to: PathBuf,
    pub attempts: u32,
    pub model_calls: u32,
}

/// Slice out the JSON object from a reply that may carry prose around it.
///
/// Returns the text from the first `{` through the last `}`; if either is
/// missing (or they are out of order) the whole reply is returned.
pub fn extract_json_object(response: &str) -> &str {
    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &response[start..=end],
        _ => response,
    }
}

/// Parse a candidate reply into an assignment, describing why it was rejected
pub fn parse_assignment(candidate: &str) -> std::result::Result<FeatureLabelAssignment, String> {
    let value: serde_json::Value =
        serde_json::from_str(candidate).map_err(|e| format!("invalid JSON: {e}"))?;
    let obj = value
        .as_object()
        .ok_or_else(|| "JSON response is not an object".to_string())?;
    if !obj.contains_key("features") || !obj.contains_key("labels") {
        return Err(r#"JSON response missing "features" or "labels""#.to_string());
    }
    serde_json::from_value(value)
        .map_err(|e| format!(r#""features" and "labels" must be string arrays: {e}"#))
}

pub fn render_prompt(template: &str, instructions: &str, headers: &[String]) -> String {
    template
        .replace("{headers}", &format_header_list(headers))
        .replace("{input}", instructions)
}

pub struct FeatureLabelClassifier {
    llm: Arc<dyn LanguageModel>,
    config: ClassifierConfig,
    prompt: String,
}

impl FeatureLabelClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>, config: ClassifierConfig) -> Self {
        Self {
            llm,
            config,
            prompt: FEATURE_LABEL_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    fn check(&self, response: &str, headers: &[String]) -> std::result::Result<FeatureLabelAssignment, String> {
        let assignment = parse_assignment(extract_json_object(response))?;
        if self.config.validate_headers {
            let unknown = assignment.unknown_columns(headers);
            if !unknown.is_empty() {
                return Err(format!("columns not in the CSV header: {}", unknown.join(", ")));
            }
        }
        Ok(assignment)
    }

    /// Classify `headers` and persist the accepted JSON object to `output_dir`
    pub async fn identify(
        &self,
        instructions: &str,
        headers: &[String],
        output_dir: &Path,
    ) -> Result<ClassificationOutcome> {
        let first = CompletionOptions::new(self.config.temperature, self.config.max_tokens);
        let retry = CompletionOptions::new(self.config.retry_temperature, self.config.max_tokens);
        let retry_prompt = render_prompt(
            &self.prompt,
            if self.config.retry_with_instructions {
                instructions
            } else {
                ""
            },
            headers,
        );

        let mut model_calls = 1;
        let mut response = self
            .llm
            .complete(&render_prompt(&self.prompt, instructions, headers), first)
            .await?;
        info!("LLM response received. Parsing JSON...");

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        let assignment = loop {
            debug!("Attempt {}: raw response: {}", attempt, response);
            match self.check(&response, headers) {
                Ok(assignment) => break assignment,
                Err(reason) => {
                    warn!("Attempt {}: {}: {}", attempt, reason, response);
                    if attempt >= max_attempts {
                        return Err(DataPrepError::ModelOutput {
                            attempts: attempt,
                            message: reason,
                        });
                    }
                }
            }

            response = self.llm.complete(&retry_prompt, retry).await?;
            model_calls += 1;
            if self.config.duplicate_retry_call {
                response = self.llm.complete(&retry_prompt, retry).await?;
                model_calls += 1;
            }
            attempt += 1;
        };

        std::fs::create_dir_all(output_dir)?;
        let persisted_to = output_dir.join(ASSIGNMENT_FILE_NAME);
        std::fs::write(&persisted_to, extract_json_object(&response))?;
        info!(
            "Persisted {} feature(s) and {} label(s) to {}",
            assignment.features.len(),
            assignment.labels.len(),
            persisted_to.display()
        );

        Ok(ClassificationOutcome {
            assignment,
            persisted_to,
            attempts: attempt,
            model_calls,
        })
    }
}
