//! Complete RAG pipeline: Fetch -> Chunk -> Embed -> Index -> Generate

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::embeddings::Chunker;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingService;
use crate::errors::IcebreakerError;
use crate::errors::Result;
use crate::llm::GenerationParams;
use crate::llm::GenerationRequest;
use crate::llm::GenerationResult;
use crate::llm::Generator;
use crate::llm::PromptBuilder;
use crate::llm::TokenUsage;
use crate::models::Profile;
use crate::profile::ProfileFetcher;
use crate::profile::ProfileRequest;
use crate::providers::create_provider;
use crate::rag::index::IndexStore;
use crate::rag::index::RankedSegment;
use crate::rag::index::VectorIndex;
use crate::rag::ContextAssembler;

/// Result of processing a profile
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub profile: Profile,
    pub initial_facts: String,
    pub segment_count: usize,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Answer to one question with the segments it was grounded on
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<RankedSegment>,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Everything `process` produces before it is installed into a session
pub(crate) struct PreparedProfile {
    pub profile: Profile,
    pub index: VectorIndex,
    pub initial_facts: String,
    pub usage: Option<TokenUsage>,
}

/// Stateless pipeline shared by every session
pub struct RagService {
    fetcher: ProfileFetcher,
    embeddings: EmbeddingService,
    generator: Arc<dyn Generator>,
    chunker: Chunker,
    prompts: PromptBuilder,
    context_assembler: ContextAssembler,
    params: GenerationParams,
    facts_query: String,
    top_k: usize,
    timeout: Duration,
}

impl RagService {
    /// Create the service with the configured provider and profile sources
    ///
    /// # Errors
    /// - Invalid chunking parameters or prompt templates
    /// - HTTP client configuration errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let provider = create_provider(config)?;
        let fetcher = ProfileFetcher::from_config(config)?;
        Self::from_parts(
            config,
            fetcher,
            provider.clone().as_embedder(),
            provider.as_generator(),
        )
    }

    /// Create from existing components
    pub fn from_parts(
        config: &AppConfig,
        fetcher: ProfileFetcher,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let params = GenerationParams::from_config(config);
        generator.ensure_supported(&params.model)?;

        Ok(Self {
            fetcher,
            embeddings: EmbeddingService::new(embedder, config.provider.embedding_batch_size),
            generator,
            chunker: Chunker::from_config(&config.retrieval)?,
            prompts: PromptBuilder::new(&config.prompts)?,
            context_assembler: ContextAssembler::new(config.prompts.context_delimiter.clone()),
            params,
            facts_query: config.prompts.facts_query.clone(),
            top_k: config.retrieval.similarity_top_k,
            timeout: config.request_timeout(),
        })
    }

    pub fn default_model(&self) -> &str {
        &self.params.model
    }

    pub fn supported_models(&self) -> &[String] {
        self.generator.supported_models()
    }

    pub fn embedding_model(&self) -> &str {
        self.embeddings.model()
    }

    /// Whether `request` names a live profile that will be answered from the mock
    pub fn substitutes_mock(&self, request: &ProfileRequest) -> bool {
        self.fetcher.substitutes_mock(request)
    }

    /// Pick the model for a session, rejecting unsupported overrides up front
    pub fn resolve_model(&self, requested: Option<&str>) -> Result<String> {
        match requested.map(str::trim).filter(|m| !m.is_empty()) {
            Some(model) => {
                self.generator.ensure_supported(model)?;
                Ok(model.to_string())
            }
            None => Ok(self.params.model.clone()),
        }
    }

    /// Run the full processing pipeline without touching any session state
    pub(crate) async fn prepare(&self, request: &ProfileRequest, model: &str) -> Result<PreparedProfile> {
        let started = Instant::now();

        debug!("Step 1: Fetching profile");
        let profile = self
            .with_timeout("profile fetch", self.fetcher.fetch(request))
            .await?;
        info!("Processing profile of {}", profile.display_name());

        debug!("Step 2: Chunking profile document");
        let document = profile.to_document();
        let segments = self.chunker.split_all(&document);
        if segments.is_empty() {
            return Err(IcebreakerError::EmptyIndex(format!(
                "profile of {} has no text to index",
                profile.display_name()
            )));
        }
        debug!("Split {} characters into {} segments", document.chars().count(), segments.len());

        debug!("Step 3: Embedding segments");
        let vectors = self
            .with_timeout("embedding", self.embeddings.embed_segments(&segments))
            .await?;

        debug!("Step 4: Building index");
        let index = VectorIndex::build(segments, vectors)?;

        debug!("Step 5: Generating initial facts");
        let query_vector = self
            .with_timeout(
                "embedding",
                self.embeddings.embed_query(&self.facts_query, index.dimension()),
            )
            .await?;
        let retrieved = index.query(&query_vector, self.top_k)?;
        let context = self.context_assembler.assemble(&retrieved);
        let prompt = self.prompts.build_initial_facts(&context)?;
        let generated = self.generate(prompt, model).await?;

        info!(
            "Indexed {} segments and generated initial facts in {:.2}s",
            index.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(PreparedProfile {
            profile,
            index,
            initial_facts: generated.text,
            usage: generated.usage,
        })
    }

    /// Answer a question against an already built index
    pub(crate) async fn answer(&self, store: &IndexStore, question: &str, model: &str) -> Result<Answer> {
        info!("Answering question: {}", question);
        let index = store.get()?;

        debug!("Step 1: Retrieving segments");
        let query_vector = self
            .with_timeout("embedding", self.embeddings.embed_query(question, index.dimension()))
            .await?;
        let sources = index.query(&query_vector, self.top_k)?;
        debug!("Retrieved {} segments", sources.len());

        debug!("Step 2: Assembling context");
        let context = self.context_assembler.assemble(&sources);

        debug!("Step 3: Generating answer");
        let prompt = self.prompts.build_question(&context, question)?;
        let generated = self.generate(prompt, model).await?;

        Ok(Answer {
            text: generated.text,
            sources,
            model: model.to_string(),
            usage: generated.usage,
        })
    }

    /// Embed one sample text and report the vector dimension
    pub async fn embedding_dimension(&self, sample: &str) -> Result<usize> {
        let vectors = self
            .with_timeout("embedding", self.embeddings.embed_texts(&[sample.to_string()]))
            .await?;
        Ok(vectors.first().map_or(0, Vec::len))
    }

    /// Send a raw prompt with the configured decoding parameters
    pub async fn generate(&self, prompt: String, model: &str) -> Result<GenerationResult> {
        let request = GenerationRequest::new(prompt, self.params.clone().with_model(model));
        self.with_timeout("generation", self.generator.generate(&request))
            .await
    }

    async fn with_timeout<T, F>(&self, stage: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| IcebreakerError::timeout(stage, self.timeout.as_secs()))?
    }
}
