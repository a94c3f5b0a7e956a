use async_trait::async_trait;

pub mod openai;

use crate::Result;

pub use openai::OpenAiSummarizer;

/// Text-completion service used to produce the summary
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Send `prompt` and return the generated text, using at most `max_tokens` tokens
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}
