//! detailed_help tool handler to provide structured help for tools

use crate::error::{DataPrepError, Result};
use crate::server::DataPrepServer;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Default, Deserialize)]
pub struct HelpParams {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

fn tool_help(tool: &str) -> Option<Value> {
    let help = match tool {
        "feature_label_identifier" => json!({
            "name": "feature_label_identifier",
            "description": "Reads the column headers of the uploaded CSV and asks the model which columns are features and which are labels. The result is saved for notebook_generation.",
            "arguments": {
                "instructions": "string (required), what the user wants to predict"
            },
            "returns": "status string",
            "notes": [
                "Without an uploaded CSV the tool asks for an upload and does not call the model",
                "Malformed model output is retried up to classifier.max_attempts times"
            ],
            "examples": [{
                "request": {"name": "feature_label_identifier", "arguments": {"instructions": "predict the house price"}},
                "response": "Feature and label identification completed. Run the notebook_generation tool to generate the notebook. predict the house price"
            }]
        }),
        "notebook_generation" => json!({
            "name": "notebook_generation",
            "description": "Generates a Jupyter notebook: data loading and X/y split cells followed by model-written code and markdown cells.",
            "arguments": {
                "instructions": "string (required), what the notebook should do with X and y"
            },
            "returns": "status string with the notebook path",
            "notes": ["Requires a prior feature_label_identifier run"]
        }),
        "text_file_ingest" => json!({
            "name": "text_file_ingest",
            "description": "Similarity search over the text files ingested at startup (ingest.glob).",
            "arguments": {
                "query": "string (required)",
                "top_k": "integer, 1-50 (default ingest.top_k)"
            },
            "returns": "matching chunk texts separated by blank lines"
        }),
        _ => return None,
    };
    Some(help)
}

impl DataPrepServer {
    /// Handle the detailed_help tool call
    pub async fn handle_detailed_help(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult> {
        let params: HelpParams = match request.arguments {
            Some(_) => super::parse_params(request)?,
            None => HelpParams::default(),
        };
        Ok(CallToolResult::structured(self.detailed_help(&params)?))
    }

    pub fn detailed_help(&self, params: &HelpParams) -> Result<Value> {
        let Some(tool) = params.tool.as_deref() else {
            return Ok(json!({
                "tools": ["feature_label_identifier", "notebook_generation", "text_file_ingest"],
                "workflow": "upload a CSV, run feature_label_identifier, then notebook_generation"
            }));
        };
        let help = tool_help(tool).ok_or_else(|| DataPrepError::Validation {
            message: format!("Unknown tool: {}", tool),
        })?;

        let output = if params.format.as_deref() == Some("compact") {
            json!({
                "tool": tool,
                "summary": help.get("description").cloned().unwrap_or(json!("")),
                "arguments": help.get("arguments").cloned().unwrap_or(json!({}))
            })
        } else {
            help
        };
        Ok(output)
    }
}
