//! In-memory vector index over profile segments

use std::cmp::Ordering;

use serde::Serialize;

use crate::embeddings::Vector;
use crate::errors::IcebreakerError;
use crate::errors::Result;
use crate::models::Segment;

/// A segment returned by a query, with its similarity and 1-based rank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSegment {
    pub segment: Segment,
    pub score: f32,
    pub rank: usize,
}

/// Ordered `(segment, vector)` pairs queried by cosine similarity
///
/// Built once per processed profile and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<(Segment, Vector)>,
    dimension: usize,
}

impl VectorIndex {
    /// Pair segments with their vectors
    ///
    /// # Errors
    /// - `EmptyIndex` when nothing is supplied or the two lists differ in length
    /// - `EmbeddingUnavailable` when vectors disagree on dimension
    pub fn build(segments: Vec<Segment>, vectors: Vec<Vector>) -> Result<Self> {
        if segments.len() != vectors.len() {
            return Err(IcebreakerError::EmptyIndex(format!(
                "{} segments but {} vectors",
                segments.len(),
                vectors.len()
            )));
        }
        if segments.is_empty() {
            return Err(IcebreakerError::EmptyIndex("no segments to index".to_string()));
        }

        let dimension = crate::embeddings::validate_vectors(&vectors, segments.len())?;
        Ok(Self {
            entries: segments.into_iter().zip(vectors).collect(),
            dimension,
        })
    }

    /// Top `min(k, len)` segments by descending cosine similarity; ties keep insertion order
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RankedSegment>> {
        if vector.len() != self.dimension {
            return Err(IcebreakerError::EmbeddingUnavailable(format!(
                "query vector has dimension {}, index expects {}",
                vector.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, (_, candidate))| (position, cosine_similarity(vector, candidate)))
            .collect();

        // sort_by is stable, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(rank, (position, score))| RankedSegment {
                segment: self.entries[position].0.clone(),
                score,
                rank: rank + 1,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.entries.iter().map(|(segment, _)| segment)
    }
}

/// Cosine similarity; a zero-norm vector scores 0 against everything
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0_f32, 0.0_f32, 0.0_f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_nan() {
        0.0
    } else {
        similarity
    }
}

/// Slot for the index of one session
#[derive(Debug, Clone, Default)]
pub struct IndexStore {
    index: Option<VectorIndex>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly built index, dropping the previous one
    pub fn replace(&mut self, index: VectorIndex) {
        self.index = Some(index);
    }

    pub fn clear(&mut self) {
        self.index = None;
    }

    pub fn get(&self) -> Result<&VectorIndex> {
        self.index.as_ref().ok_or(IcebreakerError::IndexNotReady)
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RankedSegment>> {
        self.get()?.query(vector, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(index: usize, text: &str) -> Segment {
        Segment {
            index,
            start: index * 10,
            end: index * 10 + text.chars().count(),
            overlap: 0,
            text: text.to_string(),
        }
    }

    fn sample_index() -> VectorIndex {
        VectorIndex::build(
            vec![
                segment(0, "education"),
                segment(1, "experience"),
                segment(2, "skills"),
                segment(3, "experience again"),
            ],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 2.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_build_rejects_empty_and_mismatched() {
        let empty = VectorIndex::build(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(empty, IcebreakerError::EmptyIndex(_)));

        let mismatched = VectorIndex::build(vec![segment(0, "a")], Vec::new()).unwrap_err();
        assert!(matches!(mismatched, IcebreakerError::EmptyIndex(_)));
    }

    #[test]
    fn test_build_rejects_mixed_dimensions() {
        let err = VectorIndex::build(
            vec![segment(0, "a"), segment(1, "b")],
            vec![vec![1.0, 0.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, IcebreakerError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn test_query_returns_at_most_k() {
        let index = sample_index();
        assert_eq!(index.query(&[1.0, 1.0, 1.0], 2).unwrap().len(), 2);
        assert_eq!(index.query(&[1.0, 1.0, 1.0], 10).unwrap().len(), 4);
        assert!(index.query(&[1.0, 1.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_ranks_by_similarity_with_stable_ties() {
        let index = sample_index();
        let results = index.query(&[0.0, 1.0, 0.0], 3).unwrap();

        // Segments 1 and 3 point the same way; insertion order breaks the tie
        assert_eq!(results[0].segment.index, 1);
        assert_eq!(results[1].segment.index, 3);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!(results[2].score.abs() < 1e-6);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let err = sample_index().query(&[1.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, IcebreakerError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
        assert!((cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_store_requires_build() {
        let mut store = IndexStore::new();
        assert!(matches!(store.query(&[1.0], 1).unwrap_err(), IcebreakerError::IndexNotReady));

        store.replace(sample_index());
        assert!(store.is_ready());
        assert_eq!(store.query(&[0.0, 0.0, 1.0], 1).unwrap()[0].segment.text, "skills");

        store.clear();
        assert!(!store.is_ready());
    }
}
