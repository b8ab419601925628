//! Hosted model providers
//!
//! Each edition implements both [`Embedder`] and [`Generator`] against one
//! vendor API. [`create_provider`] picks the edition named in `provider.kind`.

pub mod gemini;
pub mod watsonx;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use tracing::info;

pub use gemini::GeminiProvider;
pub use watsonx::WatsonxProvider;

use crate::config::AppConfig;
use crate::config::ProviderKind;
use crate::embeddings::Embedder;
use crate::errors::IcebreakerError;
use crate::errors::Result;
use crate::llm::Generator;

/// Upstream error bodies are cut to this many characters in error messages
const MAX_ERROR_BODY_CHARS: usize = 300;

/// One vendor edition serving both embeddings and generation
pub trait ModelProvider: Embedder + Generator {
    /// Edition name used in logs and diagnostics
    fn name(&self) -> &'static str;

    fn as_embedder(self: Arc<Self>) -> Arc<dyn Embedder>;

    fn as_generator(self: Arc<Self>) -> Arc<dyn Generator>;
}

/// Create the provider selected in configuration
pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn ModelProvider>> {
    let provider: Arc<dyn ModelProvider> = match config.provider.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::from_config(config)?),
        ProviderKind::Watsonx => Arc::new(WatsonxProvider::from_config(config)?),
    };
    info!(
        "Using {} provider (llm: {}, embeddings: {})",
        provider.name(),
        config.llm_model(),
        config.embedding_model()
    );
    Ok(provider)
}

/// Which kind of call failed; decides the error variant for generic failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Embedding,
    Generation,
}

impl Stage {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Generation => "generation",
        }
    }

    pub(crate) fn unavailable(self, message: impl Into<String>) -> IcebreakerError {
        match self {
            Self::Embedding => IcebreakerError::EmbeddingUnavailable(message.into()),
            Self::Generation => IcebreakerError::GenerationUnavailable(message.into()),
        }
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| IcebreakerError::ConfigError(format!("failed to build HTTP client: {e}")))
}

/// Map a reqwest failure; client timeouts become `Timeout`
pub(crate) fn transport_error(
    stage: Stage,
    provider: &str,
    error: &reqwest::Error,
    timeout: Duration,
) -> IcebreakerError {
    if error.is_timeout() {
        IcebreakerError::timeout(stage.label(), timeout.as_secs())
    } else {
        stage.unavailable(format!("{provider} request failed: {error}"))
    }
}

/// Structured error codes the providers use for throttling, lowercased
const RATE_LIMIT_CODES: [&str; 2] = ["resource_exhausted", "token_quota_reached"];

/// Map a non-success HTTP status from a model API
pub(crate) fn status_error(
    stage: Stage,
    provider: &str,
    status: StatusCode,
    body: &str,
    model: &str,
) -> IcebreakerError {
    let lowered = body.to_ascii_lowercase();
    let snippet: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();

    if status == StatusCode::TOO_MANY_REQUESTS
        || RATE_LIMIT_CODES.iter().any(|code| lowered.contains(code))
    {
        return IcebreakerError::RateLimited(format!("{provider} {} ({status}): {snippet}", stage.label()));
    }

    let model_missing = status == StatusCode::NOT_FOUND
        || lowered.contains("model_not_supported")
        || lowered.contains("model_not_found");
    if model_missing && stage == Stage::Generation {
        return IcebreakerError::ModelUnsupported(format!("{provider} does not serve '{model}': {snippet}"));
    }

    stage.unavailable(format!("{provider} {} failed ({status}): {snippet}", stage.label()))
}

/// Credential check shared by the editions; missing keys fail at call time
pub(crate) fn require_credential<'a>(
    stage: Stage,
    value: Option<&'a str>,
    what: &str,
) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| stage.unavailable(format!("{what} is not configured")))
}
