//! LLM integration module

pub mod intensity;
pub mod openai;
pub mod prompts;
pub mod tailor;

use crate::error::Result;
use async_trait::async_trait;

pub use intensity::Intensity;
pub use openai::OpenAiClient;
pub use tailor::{JobDetails, Tailor};

/// One prompt for the text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

/// "Given a prompt and a token budget, return generated text or an error."
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    fn model_name(&self) -> &str;
}
