//! Context assembly from retrieved segments

use crate::rag::index::RankedSegment;

/// Joins retrieved segment texts into the `{context_str}` of a prompt
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    delimiter: String,
}

impl ContextAssembler {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    /// Segment texts in rank order, separated by the delimiter
    #[must_use]
    pub fn assemble(&self, results: &[RankedSegment]) -> String {
        results
            .iter()
            .map(|result| result.segment.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }

    /// One line per source, as shown to users next to an answer
    #[must_use]
    pub fn create_summary(&self, results: &[RankedSegment]) -> String {
        if results.is_empty() {
            return "No segments retrieved.".to_string();
        }

        let mut summary = String::new();
        for result in results {
            let preview: String = result.segment.text.chars().take(80).collect();
            summary.push_str(&format!(
                "{}. [{:.2}] {}\n",
                result.rank,
                result.score,
                preview.replace('\n', " ")
            ));
        }
        summary
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Segment;

    fn ranked(rank: usize, text: &str) -> RankedSegment {
        RankedSegment {
            segment: Segment {
                index: rank,
                start: 0,
                end: text.chars().count(),
                overlap: 0,
                text: text.to_string(),
            },
            score: 0.5,
            rank,
        }
    }

    #[test]
    fn test_assemble_joins_in_order() {
        let results = vec![ranked(1, "first"), ranked(2, "second")];
        assert_eq!(ContextAssembler::default().assemble(&results), "first\n\nsecond");
        assert_eq!(ContextAssembler::new(" | ").assemble(&results), "first | second");
        assert_eq!(ContextAssembler::default().assemble(&[]), "");
    }

    #[test]
    fn test_summary_lists_sources() {
        let summary = ContextAssembler::default().create_summary(&[ranked(1, "Title: Engineer\nat X")]);
        assert_eq!(summary, "1. [0.50] Title: Engineer at X\n");
    }
}
