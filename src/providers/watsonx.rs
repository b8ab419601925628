//! IBM watsonx.ai edition
//!
//! Calls are authorised with a short-lived IAM bearer token exchanged for the
//! API key and cached until shortly before it expires.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;

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
use crate::llm::GenerationParams;
use crate::llm::GenerationRequest;
use crate::llm::GenerationResult;
use crate::llm::Generator;
use crate::llm::TokenUsage;

const NAME: &str = "watsonx";
const GENERATION_API_VERSION: &str = "2023-05-29";
const EMBEDDING_API_VERSION: &str = "2023-10-25";
const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
/// Tokens are refreshed this long before their stated expiry
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

pub struct WatsonxProvider {
    client: Client,
    endpoint: String,
    iam_endpoint: String,
    api_key: Option<String>,
    project_id: Option<String>,
    embedding_model: String,
    supported_models: Vec<String>,
    timeout: Duration,
    token: Mutex<Option<CachedToken>>,
}

impl WatsonxProvider {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        endpoint: impl Into<String>,
        iam_endpoint: impl Into<String>,
        api_key: Option<String>,
        project_id: Option<String>,
        embedding_model: impl Into<String>,
        supported_models: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            iam_endpoint: iam_endpoint.into(),
            api_key,
            project_id,
            embedding_model: embedding_model.into(),
            supported_models,
            timeout,
            token: Mutex::new(None),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = &config.provider;
        Self::new(
            provider.endpoint(),
            provider.iam_endpoint.clone(),
            provider.api_key.clone(),
            provider.project_id.clone(),
            config.embedding_model(),
            provider.supported_models(),
            config.request_timeout(),
        )
    }

    /// Return a cached IAM token or exchange the API key for a new one
    async fn access_token(&self, stage: Stage) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.access_token.clone());
        }

        let api_key = require_credential(stage, self.api_key.as_deref(), "watsonx API key")?;
        debug!("Requesting IAM token from {}", self.iam_endpoint);

        let response = self
            .client
            .post(&self.iam_endpoint)
            .header("Accept", "application/json")
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", api_key)])
            .send()
            .await
            .map_err(|e| transport_error(stage, NAME, &e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.trim().chars().take(200).collect();
            return Err(stage.unavailable(format!("IAM token exchange failed ({status}): {snippet}")));
        }

        let token: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| stage.unavailable(format!("malformed IAM token response: {e}")))?;

        let expires_at = token.expires_at(Utc::now());
        info!("Obtained watsonx IAM token valid until {}", expires_at);
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });
        Ok(access_token)
    }

    fn project_id(&self, stage: Stage) -> Result<&str> {
        require_credential(stage, self.project_id.as_deref(), "watsonx project id")
    }

    async fn post<B, R>(&self, stage: Stage, path: &str, version: &str, body: &B, model: &str) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let token = self.access_token(stage).await?;
        let url = format!("{}{path}", self.endpoint);

        let response = self
            .client
            .post(&url)
            .query(&[("version", version)])
            .bearer_auth(token)
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
            .map_err(|e| stage.unavailable(format!("malformed watsonx response: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    /// Unix timestamp in seconds
    expiration: Option<i64>,
    expires_in: Option<i64>,
}

impl IamTokenResponse {
    fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.expiration
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .or_else(|| self.expires_in.map(|secs| now + chrono::Duration::seconds(secs)))
            .unwrap_or(now)
    }
}

/// Decoding settings; sampling fields are only sent with sampling decoding
#[derive(Debug, Serialize)]
struct TextGenParameters {
    decoding_method: &'static str,
    max_new_tokens: u32,
    min_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

impl From<&GenerationParams> for TextGenParameters {
    fn from(params: &GenerationParams) -> Self {
        let sampling = params.temperature > 0.0;
        Self {
            decoding_method: if sampling { "sample" } else { "greedy" },
            max_new_tokens: params.max_new_tokens,
            min_new_tokens: params.min_new_tokens,
            temperature: sampling.then_some(params.temperature),
            top_k: sampling.then_some(params.top_k),
            top_p: sampling.then_some(params.top_p),
        }
    }
}

#[derive(Debug, Serialize)]
struct TextGenRequest<'a> {
    model_id: &'a str,
    input: &'a str,
    project_id: &'a str,
    parameters: TextGenParameters,
}

#[derive(Debug, Deserialize)]
struct TextGenResult {
    #[serde(default)]
    generated_text: String,
    #[serde(default)]
    generated_token_count: u32,
    #[serde(default)]
    input_token_count: u32,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextGenResponse {
    #[serde(default)]
    results: Vec<TextGenResult>,
}

impl TextGenResponse {
    fn into_result(self) -> Result<GenerationResult> {
        let result = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Stage::Generation.unavailable("watsonx returned no results"))?;

        let text = result.generated_text.trim();
        if text.is_empty() {
            let reason = result.stop_reason.as_deref().unwrap_or("unknown");
            return Err(Stage::Generation.unavailable(format!(
                "watsonx returned an empty answer (stop reason: {reason})"
            )));
        }

        Ok(GenerationResult {
            text: text.to_string(),
            usage: Some(TokenUsage {
                prompt_tokens: result.input_token_count,
                completion_tokens: result.generated_token_count,
                total_tokens: result.input_token_count + result.generated_token_count,
            }),
            stop_reason: result.stop_reason,
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    inputs: &'a [String],
    model_id: &'a str,
    project_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResult {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    results: Vec<EmbeddingResult>,
}

#[async_trait]
impl Embedder for WatsonxProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingsRequest {
            inputs: texts,
            model_id: &self.embedding_model,
            project_id: self.project_id(Stage::Embedding)?,
        };
        debug!("Calling watsonx embeddings API: {} items", texts.len());

        let response: EmbeddingsResponse = self
            .post(
                Stage::Embedding,
                "/ml/v1/text/embeddings",
                EMBEDDING_API_VERSION,
                &request,
                &self.embedding_model,
            )
            .await?;
        Ok(response.results.into_iter().map(|r| r.embedding).collect())
    }

    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl Generator for WatsonxProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let model = &request.params.model;
        self.ensure_supported(model)?;

        let body = TextGenRequest {
            model_id: model,
            input: &request.prompt,
            project_id: self.project_id(Stage::Generation)?,
            parameters: TextGenParameters::from(&request.params),
        };
        debug!("Calling watsonx text generation with {}", model);

        let response: TextGenResponse = self
            .post(
                Stage::Generation,
                "/ml/v1/text/generation",
                GENERATION_API_VERSION,
                &body,
                model,
            )
            .await?;
        response.into_result()
    }

    fn supported_models(&self) -> &[String] {
        &self.supported_models
    }
}

impl ModelProvider for WatsonxProvider {
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
