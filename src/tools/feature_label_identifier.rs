//! feature_label_identifier tool handler

use crate::classifier::FeatureLabelClassifier;
use crate::error::{DataPrepError, Result};
use crate::headers::extract_headers;
use crate::server::DataPrepServer;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct InstructionsParams {
    pub instructions: String,
}

impl DataPrepServer {
    pub async fn handle_feature_label_identifier(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult> {
        let params: InstructionsParams = super::parse_params(request)?;
        let status = self.identify_features_and_labels(&params.instructions).await?;
        Ok(super::status_result(status))
    }

    /// Classify the uploaded dataset's columns and persist the assignment.
    /// Returns the status line shown to the agent.
    pub async fn identify_features_and_labels(&self, instructions: &str) -> Result<String> {
        info!("feature_label_identifier: {}", instructions);
        let data_dir = &self.config.paths.data_dir;

        let headers = match extract_headers(data_dir) {
            Ok(Some(headers)) => headers,
            Ok(None) | Err(DataPrepError::NotFound { .. }) => {
                warn!("No dataset available in {}", data_dir.display());
                return Ok(format!(
                    "No CSV file found in {}. Please upload a dataset before identifying features and labels.",
                    data_dir.display()
                ));
            }
            Err(e) => return Err(e),
        };
        info!("Extracted headers: {:?}", headers);

        let classifier =
            FeatureLabelClassifier::new(self.llm.clone(), self.config.classifier.clone());
        let outcome = classifier
            .identify(instructions, &headers, &self.config.paths.output_dir)
            .await?;
        info!(
            "Classification accepted after {} attempt(s), {} model call(s)",
            outcome.attempts, outcome.model_calls
        );

        Ok(format!(
            "Feature and label identification completed. Run the notebook_generation tool to generate the notebook. {}",
            instructions
        ))
    }
}
