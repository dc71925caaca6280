//! notebook_generation tool handler

use crate::error::Result;
use crate::generation::NotebookGenerator;
use crate::server::DataPrepServer;
use crate::tools::feature_label_identifier::InstructionsParams;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use tracing::info;

impl DataPrepServer {
    pub async fn handle_notebook_generation(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult> {
        let params: InstructionsParams = super::parse_params(request)?;
        let status = self.generate_notebook(&params.instructions).await?;
        Ok(super::status_result(status))
    }

    pub async fn generate_notebook(&self, instructions: &str) -> Result<String> {
        info!("notebook_generation: {}", instructions);
        NotebookGenerator::new(
            self.llm.clone(),
            self.config.paths.clone(),
            self.config.generation.clone(),
        )
        .generate(instructions)
        .await
    }
}
