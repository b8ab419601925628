//! CLI output formatting utilities

use crate::rag::Answer;
use crate::rag::ContextAssembler;
use crate::rag::ProcessOutcome;

/// Safely truncate a string at character boundary (not byte boundary)
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Single-line preview of a retrieved segment
#[must_use]
pub fn segment_preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_str(&flat, max_chars)
}

pub fn print_outcome(outcome: &ProcessOutcome) {
    print_success(&format!(
        "Processed {} ({} segments, model {})",
        outcome.profile.display_name(),
        outcome.segment_count,
        outcome.model
    ));
    println!();
    println!("Here are 3 interesting facts about this person:");
    println!();
    println!("{}", outcome.initial_facts.trim());
    println!();
}

pub fn print_answer(answer: &Answer, show_sources: bool) {
    println!("{}", answer.text.trim());
    if show_sources {
        println!();
        println!("📚 Sources:");
        print!("{}", ContextAssembler::default().create_summary(&answer.sources));
    }
    println!();
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    println!("❌ {msg}");
}

pub fn print_prompt(msg: &str) {
    use std::io::Write;

    print!("{msg}");
    // A failed flush only delays the prompt
    let _ = std::io::stdout().flush();
}
