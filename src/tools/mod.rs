//! Tool handlers for the data-prep-agent MCP server

use crate::error::{DataPrepError, Result};
use rmcp::model::{CallToolRequestParam, CallToolResult, Content};
use serde::de::DeserializeOwned;

pub mod detailed_help;
pub mod feature_label_identifier;
pub mod notebook_generation;
pub mod text_file_ingest;

/// Decode tool arguments into a typed parameter struct
pub(crate) fn parse_params<T: DeserializeOwned>(request: CallToolRequestParam) -> Result<T> {
    let args = request.arguments.ok_or_else(|| DataPrepError::Mcp {
        message: "Missing parameters".into(),
    })?;
    serde_json::from_value(serde_json::Value::Object(args)).map_err(|e| {
        DataPrepError::InvalidParams {
            message: format!("Invalid parameters: {}", e),
        }
    })
}

/// Every data-prep tool answers with a single status string
pub(crate) fn status_result(status: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(status.into())])
}
