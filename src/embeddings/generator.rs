//! Batched embedding of profile segments

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use super::validate_vectors;
use super::Embedder;
use super::Vector;
use crate::errors::IcebreakerError;
use crate::errors::Result;
use crate::models::Segment;

/// Wraps an [`Embedder`] with batching and vector validation
#[derive(Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl EmbeddingService {
    /// `batch_size` is clamped to at least one text per request
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed segment texts in order, one request per batch
    ///
    /// Every returned vector has the same dimension.
    pub async fn embed_segments(&self, segments: &[Segment]) -> Result<Vec<Vector>> {
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        self.embed_texts(&texts).await
    }

    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for (batch_number, batch) in texts.chunks(self.batch_size).enumerate() {
            debug!(
                "Embedding batch {} ({} texts) with {}",
                batch_number + 1,
                batch.len(),
                self.embedder.embedding_model()
            );
            let batch_vectors = self.embedder.embed(batch).await?;
            validate_vectors(&batch_vectors, batch.len())?;
            vectors.extend(batch_vectors);
        }

        let dimension = validate_vectors(&vectors, texts.len())?;
        info!("Embedded {} texts ({} dimensions)", vectors.len(), dimension);
        Ok(vectors)
    }

    /// Embed a query, checking it matches the dimension of the indexed vectors
    pub async fn embed_query(&self, query: &str, expected_dimension: usize) -> Result<Vector> {
        let vector = self.embedder.embed_query(query).await?;
        if vector.len() != expected_dimension {
            return Err(IcebreakerError::EmbeddingUnavailable(format!(
                "query vector has dimension {}, index expects {expected_dimension}",
                vector.len()
            )));
        }
        Ok(vector)
    }

    pub fn model(&self) -> &str {
        self.embedder.embedding_model()
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }
}
