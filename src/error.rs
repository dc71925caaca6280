//! Domain-specific error types for data-prep-agent

use serde_json::json;
use thiserror::Error;

/// Main error type for the data-prep-agent tools and servers
#[derive(Error, Debug)]
pub enum DataPrepError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("CSV error: {message}")]
    Csv { message: String },

    #[error("Language model error: {message}")]
    Llm { message: String },

    #[error("Malformed model output after {attempts} attempt(s): {message}")]
    ModelOutput { attempts: u32, message: String },

    #[error("Embedding provider error: {message}")]
    Embedding { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Downstream service error: {message}")]
    Downstream { message: String },

    #[error("MCP protocol error: {message}")]
    Mcp { message: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for DataPrepError {
    fn from(err: anyhow::Error) -> Self {
        DataPrepError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for DataPrepError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => DataPrepError::NotFound {
                message: err.to_string(),
            },
            _ => DataPrepError::Io {
                message: err.to_string(),
            },
        }
    }
}

impl From<csv::Error> for DataPrepError {
    fn from(err: csv::Error) -> Self {
        DataPrepError::Csv {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DataPrepError {
    fn from(err: serde_json::Error) -> Self {
        DataPrepError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for DataPrepError {
    fn from(err: reqwest::Error) -> Self {
        DataPrepError::Llm {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<rmcp::ErrorData> for DataPrepError {
    fn from(err: rmcp::ErrorData) -> Self {
        DataPrepError::Mcp {
            message: err.message.to_string(),
        }
    }
}

/// Convert DataPrepError to MCP error
impl From<DataPrepError> for rmcp::ErrorData {
    fn from(err: DataPrepError) -> Self {
        use rmcp::model::ErrorCode;

        let (code, label, details) = match err {
            DataPrepError::Config { message } => {
                (ErrorCode::INVALID_PARAMS, "Configuration error", message)
            }
            DataPrepError::NotFound { message } => {
                (ErrorCode::INVALID_PARAMS, "Not found", message)
            }
            DataPrepError::Io { message } => (ErrorCode::INTERNAL_ERROR, "I/O error", message),
            DataPrepError::Csv { message } => (ErrorCode::INTERNAL_ERROR, "CSV error", message),
            DataPrepError::Llm { message } => {
                (ErrorCode::INTERNAL_ERROR, "Language model error", message)
            }
            DataPrepError::ModelOutput { attempts, message } => (
                ErrorCode::INTERNAL_ERROR,
                "Malformed model output",
                format!("{message} (after {attempts} attempt(s))"),
            ),
            DataPrepError::Embedding { message } => {
                (ErrorCode::INTERNAL_ERROR, "Embedding error", message)
            }
            DataPrepError::Serialization { message } => {
                (ErrorCode::INTERNAL_ERROR, "Serialization error", message)
            }
            DataPrepError::Validation { message } => {
                (ErrorCode::INVALID_PARAMS, "Validation error", message)
            }
            DataPrepError::Downstream { message } => {
                (ErrorCode::INTERNAL_ERROR, "Downstream service error", message)
            }
            DataPrepError::Mcp { message } => {
                (ErrorCode::INVALID_PARAMS, "MCP protocol error", message)
            }
            DataPrepError::InvalidParams { message } => {
                (ErrorCode::INVALID_PARAMS, "Invalid parameters", message)
            }
            DataPrepError::Internal { message } => {
                (ErrorCode::INTERNAL_ERROR, "Internal error", message)
            }
        };

        rmcp::ErrorData {
            code,
            message: format!("{label}: {details}").into(),
            data: Some(json!({ "details": details })),
        }
    }
}

/// Result type alias for data-prep-agent operations
pub type Result<T> = std::result::Result<T, DataPrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            DataPrepError::from(io),
            DataPrepError::NotFound { .. }
        ));
    }

    #[test]
    fn caller_mistakes_map_to_invalid_params() {
        let err: rmcp::ErrorData = DataPrepError::InvalidParams {
            message: "'instructions' parameter is required".into(),
        }
        .into();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("Invalid parameters"));
    }

    #[test]
    fn model_output_failures_are_internal() {
        let err: rmcp::ErrorData = DataPrepError::ModelOutput {
            attempts: 3,
            message: "missing \"labels\"".into(),
        }
        .into();
        assert_eq!(err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert!(err.message.contains("after 3 attempt(s)"));
    }
}
