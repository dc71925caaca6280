pub mod openai;
pub mod traits;

pub use openai::ChatCompletionsClient;
pub use traits::{CompletionOptions, LanguageModel, ModelError};
