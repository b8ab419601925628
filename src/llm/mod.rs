//! Text generation contracts shared by every model provider

pub mod prompts;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

pub use prompts::PromptBuilder;
pub use prompts::PromptTemplate;

use crate::config::AppConfig;
use crate::errors::IcebreakerError;
use crate::errors::Result;

/// Decoding parameters for one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub model: String,
    /// Sampling temperature in `[0, 1]`; `0` means greedy decoding
    pub temperature: f32,
    pub max_new_tokens: u32,
    pub min_new_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
}

impl GenerationParams {
    pub fn from_config(config: &AppConfig) -> Self {
        let generation = &config.generation;
        Self {
            model: config.llm_model().to_string(),
            temperature: generation.temperature,
            max_new_tokens: generation.max_new_tokens,
            min_new_tokens: generation.min_new_tokens,
            top_k: generation.top_k,
            top_p: generation.top_p,
        }
    }

    /// Same parameters targeting another model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub params: GenerationParams,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            prompt: prompt.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub usage: Option<TokenUsage>,
    pub stop_reason: Option<String>,
}

impl GenerationResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            stop_reason: None,
        }
    }
}

/// Hosted text-generation endpoint
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for `request.prompt`
    ///
    /// # Errors
    /// - `ModelUnsupported` when the model is not offered by this provider
    /// - `RateLimited` on throttling or exhausted quota
    /// - `GenerationUnavailable` on auth, network, server or response-shape failures
    /// - `Timeout` when the call exceeds the configured timeout
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;

    /// Model ids this generator accepts
    fn supported_models(&self) -> &[String];

    /// Fail with `ModelUnsupported` unless `model` is offered
    fn ensure_supported(&self, model: &str) -> Result<()> {
        if self.supported_models().iter().any(|m| m == model) {
            Ok(())
        } else {
            Err(IcebreakerError::ModelUnsupported(format!(
                "'{model}' is not one of: {}",
                self.supported_models().join(", ")
            )))
        }
    }
}
