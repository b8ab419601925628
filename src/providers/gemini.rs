//! Google Gemini (Generative Language API) edition

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::build_http_client;
use super::require_credential;
use super::status_error;
use super::transport_error;
use super::ModelProvider;
use super::Stage;
use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::embeddings::Vector;
use crate::errors::Result;
use crate::llm::GenerationRequest;
use crate::llm::GenerationResult;
use crate::llm::Generator;
use crate::llm::TokenUsage;

const NAME: &str = "gemini";
const DOCUMENT_TASK: &str = "RETRIEVAL_DOCUMENT";
const QUERY_TASK: &str = "RETRIEVAL_QUERY";

pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    embedding_model: String,
    supported_models: Vec<String>,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        embedding_model: impl Into<String>,
        supported_models: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            embedding_model: embedding_model.into(),
            supported_models,
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.provider.endpoint(),
            config.provider.api_key.clone(),
            config.embedding_model(),
            config.provider.supported_models(),
            config.request_timeout(),
        )
    }

    async fn post<B, R>(&self, stage: Stage, url: &str, body: &B, model: &str) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let api_key = require_credential(stage, self.api_key.as_deref(), "Gemini API key")?;

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(stage, NAME, &e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(stage, NAME, status, &text, model));
        }

        response
            .json()
            .await
            .map_err(|e| stage.unavailable(format!("malformed Gemini response: {e}")))
    }

    async fn embed_with_task(&self, texts: &[String], task_type: &'static str) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = qualified_model(&self.embedding_model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &model,
                    content: Content::from_text(text),
                    task_type,
                })
                .collect(),
        };

        let url = format!("{}/{}:batchEmbedContents", self.endpoint, model);
        debug!("Calling Gemini batch embeddings API: {} items", texts.len());

        let response: BatchEmbedResponse = self.post(Stage::Embedding, &url, &request, &model).await?;
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

/// Gemini addresses models as `models/<id>`; accept both spellings
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn from_text(text: &'a str) -> Self {
        Self {
            role: None,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

/// `min_new_tokens` has no Gemini counterpart and is not sent
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        let params = &request.params;
        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_new_tokens,
                top_p: params.top_p,
                top_k: params.top_k,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    fn into_result(self) -> Result<GenerationResult> {
        let usage = self.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(Stage::Generation.unavailable(format!("Gemini returned no answer: {reason}")));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            let reason = candidate.finish_reason.as_deref().unwrap_or("no text parts");
            return Err(Stage::Generation.unavailable(format!(
                "Gemini returned an empty answer (finish reason: {reason})"
            )));
        }

        Ok(GenerationResult {
            text: text.to_string(),
            usage,
            stop_reason: candidate.finish_reason,
        })
    }
}

#[async_trait]
impl Embedder for GeminiProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.embed_with_task(texts, DOCUMENT_TASK).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vector> {
        let mut vectors = self.embed_with_task(&[text.to_string()], QUERY_TASK).await?;
        vectors
            .pop()
            .ok_or_else(|| Stage::Embedding.unavailable("Gemini returned no vector for the query"))
    }

    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl Generator for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let model = &request.params.model;
        self.ensure_supported(model)?;

        let model_path = qualified_model(model);
        let url = format!("{}/{}:generateContent", self.endpoint, model_path);
        debug!("Calling Gemini generateContent with {}", model);

        let body = GenerateContentRequest::from_request(request);
        let response: GenerateContentResponse =
            self.post(Stage::Generation, &url, &body, model).await?;
        response.into_result()
    }

    fn supported_models(&self) -> &[String] {
        &self.supported_models
    }
}

impl ModelProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_embedder(self: Arc<Self>) -> Arc<dyn Embedder> {
        self
    }

    fn as_generator(self: Arc<Self>) -> Arc<dyn Generator> {
        self
    }
}
