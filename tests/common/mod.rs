//! Shared fixtures for integration tests: offline embedder and generator,
//! plus a helper that serves an axum router on an ephemeral port

#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use icebreaker::config::AppConfig;
use icebreaker::config::DEFAULT_FALLBACK_ANSWER;
use icebreaker::embeddings::Embedder;
use icebreaker::embeddings::Vector;
use icebreaker::llm::GenerationRequest;
use icebreaker::llm::GenerationResult;
use icebreaker::llm::Generator;
use icebreaker::profile::MockProfileSource;
use icebreaker::profile::ProfileFetcher;
use icebreaker::profile::ProfileSource;
use icebreaker::rag::RagService;
use icebreaker::Result;

pub const DIMENSION: usize = 64;

/// Configuration with every network endpoint pointing nowhere and the bundled mock profile
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.profile.mock_data_path = String::new();
    config.provider.endpoint = Some("http://127.0.0.1:9".to_string());
    config.timeouts.request_secs = 5;
    config
}

/// Bag-of-words vector over 64 hashed buckets
pub fn hash_vector(text: &str) -> Vector {
    let mut vector = vec![0.0; DIMENSION];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            });
        vector[(hash % DIMENSION as u64) as usize] += 1.0;
    }
    vector
}

/// Title on the `- Title: X at Y ... Present` line of a prompt, if any
pub fn current_title(prompt: &str) -> Option<String> {
    prompt
        .lines()
        .filter(|line| line.contains("Present"))
        .find_map(|line| {
            let rest = line.split("Title: ").nth(1)?;
            Some(rest.split(" at ").next().unwrap_or(rest).trim().to_string())
        })
}

/// What a well-behaved model would say for the given prompt
pub fn scripted_reply(prompt: &str) -> String {
    let title = current_title(prompt);
    if prompt.contains("answer the question") {
        title.unwrap_or_else(|| DEFAULT_FALLBACK_ANSWER.to_string())
    } else {
        format!(
            "1. Currently works as {}.\n2. Studied computer science.\n3. Writes about LLM tooling.",
            title.as_deref().unwrap_or("an unknown role")
        )
    }
}

pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| hash_vector(t)).collect())
    }

    fn embedding_model(&self) -> &str {
        "hash-bow"
    }
}

pub struct ScriptedGenerator {
    models: Vec<String>,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            models: config.provider.supported_models(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.ensure_supported(&request.params.model)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GenerationResult::text(scripted_reply(&request.prompt)))
    }

    fn supported_models(&self) -> &[String] {
        &self.models
    }
}

/// Service over the offline fakes with the given live profile source
pub fn offline_service(
    config: &AppConfig,
    mock: MockProfileSource,
    live: Arc<dyn ProfileSource>,
) -> Arc<RagService> {
    let fetcher = ProfileFetcher::new(Arc::new(mock), live, None);
    let service = RagService::from_parts(
        config,
        fetcher,
        Arc::new(HashEmbedder),
        Arc::new(ScriptedGenerator::new(config)),
    )
    .expect("offline service");
    Arc::new(service)
}

/// Serve `router` on 127.0.0.1 with an ephemeral port and return its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}
