//! Overlapping fixed-size chunking of profile documents
//!
//! Sizes are counted in characters, not bytes, so multi-byte text never splits
//! inside a code point.

use std::iter::FusedIterator;

use crate::config::RetrievalConfig;
use crate::errors::IcebreakerError;
use crate::errors::Result;
use crate::models::Segment;

/// Splits text into segments of at most `size` characters where consecutive
/// segments share exactly `overlap` characters
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Fails when `size` is zero or `overlap >= size`, which would never make progress
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(IcebreakerError::ConfigError(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= size {
            return Err(IcebreakerError::ConfigError(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// One-shot iterator over the segments of `text`
    pub fn split<'a>(&self, text: &'a str) -> Segments<'a> {
        let mut offsets: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
        let char_count = offsets.len();
        offsets.push(text.len());

        Segments {
            text,
            offsets,
            char_count,
            size: self.size,
            overlap: self.overlap,
            next_start: (char_count > 0).then_some(0),
            index: 0,
        }
    }

    /// Collect every segment of `text`
    pub fn split_all(&self, text: &str) -> Vec<Segment> {
        self.split(text).collect()
    }
}

/// Iterator returned by [`Chunker::split`]
#[derive(Debug)]
pub struct Segments<'a> {
    text: &'a str,
    /// Byte offset of every character, plus the total length as a sentinel
    offsets: Vec<usize>,
    char_count: usize,
    size: usize,
    overlap: usize,
    next_start: Option<usize>,
    index: usize,
}

impl Segments<'_> {
    fn char_at(&self, position: usize) -> Option<char> {
        self.text[self.offsets[position]..].chars().next()
    }

    /// Move a hard cut back to just after the last whitespace in the second half
    /// of the window. The cut never moves so far back that the next segment would
    /// start at or before `start`.
    fn soft_end(&self, start: usize, hard_end: usize) -> usize {
        let earliest = start + (self.overlap + 1).max(self.size / 2);
        (earliest..=hard_end)
            .rev()
            .find(|&end| self.char_at(end - 1).is_some_and(char::is_whitespace))
            .unwrap_or(hard_end)
    }
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let start = self.next_start?;

        let hard_end = (start + self.size).min(self.char_count);
        let end = if hard_end < self.char_count {
            self.soft_end(start, hard_end)
        } else {
            hard_end
        };

        let overlap = if self.index == 0 { 0 } else { self.overlap };
        let segment = Segment {
            index: self.index,
            start,
            end,
            overlap,
            text: self.text[self.offsets[start]..self.offsets[end]].to_string(),
        };

        self.index += 1;
        self.next_start = (end < self.char_count).then(|| end - self.overlap);
        Some(segment)
    }
}

impl FusedIterator for Segments<'_> {}

/// Rebuild the original text from segments by dropping each segment's overlap
pub fn reassemble(segments: &[Segment]) -> String {
    segments
        .iter()
        .flat_map(|segment| segment.text.chars().skip(segment.overlap))
        .collect()
}
