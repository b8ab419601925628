//! Deterministic stand-ins for the hosted services, used by unit tests

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::config::DEFAULT_FALLBACK_ANSWER;
use crate::embeddings::Embedder;
use crate::embeddings::Vector;
use crate::errors::IcebreakerError;
use crate::errors::Result;
use crate::llm::GenerationRequest;
use crate::llm::GenerationResult;
use crate::llm::Generator;
use crate::models::Profile;
use crate::profile::MockProfileSource;
use crate::profile::ProfileFetcher;
use crate::profile::ProfileSource;
use crate::rag::RagService;

const DIMENSION: usize = 64;

/// Bag-of-words embedding: each lowercase word is hashed into one of 64 buckets
pub struct HashEmbedder;

impl HashEmbedder {
    pub fn vector(text: &str) -> Vector {
        let mut vector = vec![0.0; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3));
            vector[(hash % DIMENSION as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn embedding_model(&self) -> &str {
        "hash-bow"
    }
}

/// Answers from the `- Title: ... - Present` line of the context, or with the fallback phrase
pub struct TitleGenerator {
    models: Vec<String>,
    pub calls: AtomicUsize,
    pub delay: Option<Duration>,
}

impl TitleGenerator {
    pub fn new() -> Self {
        Self {
            models: AppConfig::default().provider.supported_models(),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn current_title(prompt: &str) -> Option<&str> {
        prompt
            .lines()
            .filter(|line| line.contains("Present"))
            .find_map(|line| {
                let rest = line.split("Title: ").nth(1)?;
                Some(rest.split(" at ").next().unwrap_or(rest).trim())
            })
    }
}

#[async_trait]
impl Generator for TitleGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.ensure_supported(&request.params.model)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let title = Self::current_title(&request.prompt);
        let text = if request.prompt.contains("answer the question") {
            title.map_or_else(|| DEFAULT_FALLBACK_ANSWER.to_string(), ToString::to_string)
        } else {
            format!(
                "1. Currently works as {}.\n2. Fact two.\n3. Fact three.",
                title.unwrap_or("an unknown role")
            )
        };
        Ok(GenerationResult::text(text))
    }

    fn supported_models(&self) -> &[String] {
        &self.models
    }
}

/// Live source that always rejects the credential
pub struct RejectingSource;

#[async_trait]
impl ProfileSource for RejectingSource {
    async fn fetch(&self, _target: &str, _credential: Option<&str>) -> Result<Profile> {
        Err(IcebreakerError::DataUnavailable(
            "invalid ProxyCurl API key (401 Unauthorized)".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "rejecting"
    }
}

pub fn service_with(generator: Arc<TitleGenerator>) -> Arc<RagService> {
    service_with_config(&AppConfig::default(), generator)
}

pub fn service_with_config(config: &AppConfig, generator: Arc<TitleGenerator>) -> Arc<RagService> {
    let fetcher = ProfileFetcher::new(
        Arc::new(MockProfileSource::bundled()),
        Arc::new(RejectingSource),
        None,
    );
    let service = RagService::from_parts(config, fetcher, Arc::new(HashEmbedder), generator);
    Arc::new(service.expect("test service"))
}

pub fn mock_service() -> Arc<RagService> {
    service_with(Arc::new(TitleGenerator::new()))
}
