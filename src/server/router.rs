use crate::server::DataPrepServer;
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, InitializeRequestParam,
        InitializeResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo, Tool, ToolsCapability,
    },
    service::{RequestContext, RoleServer},
};
use tracing::info;

pub const TOOL_NAMES: [&str; 4] = [
    "feature_label_identifier",
    "notebook_generation",
    "text_file_ingest",
    "detailed_help",
];

/// Tool catalogue advertised by `tools/list`
pub fn tool_catalogue() -> Vec<Tool> {
    vec![
        Tool {
            name: "feature_label_identifier".into(),
            title: Some("Feature/Label Identifier".into()),
            description: Some(
                "Identify which columns of the uploaded CSV are features and which are labels, and save the result"
                    .into(),
            ),
            input_schema: crate::schemas::feature_label_identifier_schema(),
            icons: None,
            annotations: None,
            output_schema: None,
            meta: None,
        },
        Tool {
            name: "notebook_generation".into(),
            title: Some("Notebook Generation".into()),
            description: Some(
                "Generate a Jupyter notebook that loads the dataset, splits X/y and implements the request"
                    .into(),
            ),
            input_schema: crate::schemas::notebook_generation_schema(),
            icons: None,
            annotations: None,
            output_schema: None,
            meta: None,
        },
        Tool {
            name: "text_file_ingest".into(),
            title: Some("Text File Retrieval".into()),
            description: Some("Retrieve passages from the ingested text files".into()),
            input_schema: crate::schemas::text_file_ingest_schema(),
            icons: None,
            annotations: None,
            output_schema: None,
            meta: None,
        },
        Tool {
            name: "detailed_help".into(),
            title: Some("Detailed Help".into()),
            description: Some("Get detailed help for a specific tool".into()),
            input_schema: crate::schemas::detailed_help_schema(),
            icons: None,
            annotations: None,
            output_schema: None,
            meta: None,
        },
    ]
}

impl ServerHandler for DataPrepServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "data-prep-agent".to_string(),
                title: Some("Data Prep Agent".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Upload a CSV, call feature_label_identifier, then notebook_generation.".into(),
            ),
            ..Default::default()
        }
    }

    async fn initialize(
        &self,
        request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<InitializeResult, McpError> {
        let mut info = self.get_info();
        info.protocol_version = request.protocol_version.clone();
        Ok(info)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("tools/list requested");
        Ok(ListToolsResult {
            tools: tool_catalogue(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        match request.name.as_ref() {
            "feature_label_identifier" => self
                .handle_feature_label_identifier(request)
                .await
                .map_err(|e| e.into()),
            "notebook_generation" => self
                .handle_notebook_generation(request)
                .await
                .map_err(|e| e.into()),
            "text_file_ingest" => self
                .handle_text_file_ingest(request)
                .await
                .map_err(|e| e.into()),
            "detailed_help" => self
                .handle_detailed_help(request)
                .await
                .map_err(|e| e.into()),
            _ => Err(McpError {
                code: rmcp::model::ErrorCode::METHOD_NOT_FOUND,
                message: format!("Unknown tool: {}", request.name).into(),
                data: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_matches_routed_names() {
        let names: Vec<String> = tool_catalogue()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        assert_eq!(names, TOOL_NAMES);
    }

    #[test]
    fn every_tool_has_object_schema() {
        for tool in tool_catalogue() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
        }
    }
}
