//! Text chunking and embedding
//!
//! - [`Chunker`] splits a profile document into overlapping segments
//! - [`Embedder`] is implemented by every hosted model provider
//! - [`EmbeddingService`] batches segment texts and validates the returned vectors
//!
//! # Examples
//!
//! ```rust,no_run
//! use icebreaker::config::AppConfig;
//! use icebreaker::embeddings::Chunker;
//! use icebreaker::embeddings::EmbeddingService;
//! use icebreaker::providers::create_provider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let chunker = Chunker::from_config(&config.retrieval)?;
//!     let segments = chunker.split_all("Name: Eden Marco\nHeadline: AI Engineer");
//!
//!     let provider = create_provider(&config)?;
//!     let service = EmbeddingService::new(provider.as_embedder(), config.provider.embedding_batch_size);
//!     let vectors = service.embed_segments(&segments).await?;
//!     println!("Embedded {} segments", vectors.len());
//!
//!     Ok(())
//! }
//! ```

pub mod chunker;
pub mod generator;

use async_trait::async_trait;

pub use chunker::Chunker;
pub use generator::EmbeddingService;

use crate::errors::IcebreakerError;
use crate::errors::Result;

/// Dense embedding vector
pub type Vector = Vec<f32>;

/// Maps texts to fixed-dimension vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every text, preserving order
    ///
    /// # Errors
    /// - `EmbeddingUnavailable` for unreachable or failing services
    /// - `RateLimited` when the provider throttles the call
    /// - `Timeout` when the call exceeds the configured timeout
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Embed a single query text
    async fn embed_query(&self, text: &str) -> Result<Vector> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            IcebreakerError::EmbeddingUnavailable("provider returned no vector for the query".to_string())
        })
    }

    /// Embedding model identifier
    fn embedding_model(&self) -> &str;
}

/// Check that a provider answered with one non-empty vector per input and that
/// every vector has the same dimension. Returns the dimension.
pub fn validate_vectors(vectors: &[Vector], expected_count: usize) -> Result<usize> {
    if vectors.len() != expected_count {
        return Err(IcebreakerError::EmbeddingUnavailable(format!(
            "expected {expected_count} vectors, provider returned {}",
            vectors.len()
        )));
    }

    let Some(first) = vectors.first() else {
        return Ok(0);
    };
    let dimension = first.len();
    if dimension == 0 {
        return Err(IcebreakerError::EmbeddingUnavailable(
            "provider returned an empty vector".to_string(),
        ));
    }

    if let Some(position) = vectors.iter().position(|v| v.len() != dimension) {
        return Err(IcebreakerError::EmbeddingUnavailable(format!(
            "vector {position} has dimension {}, expected {dimension}",
            vectors[position].len()
        )));
    }
    Ok(dimension)
}
