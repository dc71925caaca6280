//! Notebook generation: one model call, then assembly.

use std::sync::Arc;

use tracing::{debug, info};

use crate::classifier::FeatureLabelAssignment;
use crate::clients::{CompletionOptions, LanguageModel};
use crate::config::{GenerationConfig, PathsConfig};
use crate::error::Result;
use crate::notebook::{assemble_notebook, write_notebook};

pub const NOTEBOOK_FILE_NAME: &str = "generated_notebook.ipynb";

pub const NOTEBOOK_PROMPT: &str = r#"
user inquiry: {input}

Generate the code in blocks that are broken down into distinct functionalities. Include markdown comments.

In your response, write in a format similar to:
code block: <CODE>
code block: <CODE>
comment block: <MARKDOWN>

Do not include any system messages, and do not include code fences.

There are two existing variables in the context:
X, a numpy array of features
y, a numpy array of labels
"#;

pub fn render_prompt(template: &str, instructions: &str) -> String {
    template.replace("{input}", instructions)
}

pub struct NotebookGenerator {
    llm: Arc<dyn LanguageModel>,
    paths: PathsConfig,
    config: GenerationConfig,
}

impl NotebookGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, paths: PathsConfig, config: GenerationConfig) -> Self {
        Self { llm, paths, config }
    }

    /// Generate the notebook and return the status line for the agent.
    ///
    /// Fails with `NotFound` when no feature/label assignment has been
    /// persisted yet. The model is called exactly once.
    pub async fn generate(&self, instructions: &str) -> Result<String> {
        let assignment = FeatureLabelAssignment::load(&self.paths.assignment_path())?;

        let prompt = render_prompt(NOTEBOOK_PROMPT, instructions);
        debug!("Notebook prompt: {}", prompt);
        let response = self
            .llm
            .complete(
                &prompt,
                CompletionOptions::new(self.config.temperature, self.config.max_tokens),
            )
            .await?;
        debug!("Notebook model response: {}", response);

        let dataset_path = self.paths.dataset_path();
        let notebook = assemble_notebook(
            &response,
            &dataset_path.to_string_lossy(),
            &assignment.labels,
            &assignment.features,
        );
        let output_path = self.paths.notebook_path();
        write_notebook(&output_path, &notebook)?;
        info!(
            "Wrote notebook with {} cell(s) to {}",
            notebook.cells.len(),
            output_path.display()
        );

        Ok(format!(
            "Notebook generated successfully at: {}",
            output_path.display()
        ))
    }
}
