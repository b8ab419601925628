//! End-to-end self test against the mock profile

use std::sync::Arc;

use crate::cli::output::*;
use crate::errors::IcebreakerError;
use crate::profile::ProfileRequest;
use crate::rag::ProfileSession;
use crate::rag::RagService;
use crate::AppConfig;
use crate::Result;

pub const SELF_TEST_QUESTION: &str = "What is this person's current job title?";

/// Process the mock profile and ask one question, reporting each stage
///
/// Fails with the first stage error so the binary exits non-zero.
pub async fn handle_self_test(config: &AppConfig, model: Option<&str>) -> Result<()> {
    println!("🧪 Icebreaker self test");
    println!("=======================\n");

    let service = Arc::new(RagService::new(config)?);
    run_self_test(service, model).await
}

pub async fn run_self_test(service: Arc<RagService>, model: Option<&str>) -> Result<()> {
    let session = ProfileSession::new(service);

    let outcome = match session.process(ProfileRequest::mock(), model).await {
        Ok(outcome) => {
            print_success(&format!(
                "process: indexed {} segments for {}",
                outcome.segment_count,
                outcome.profile.display_name()
            ));
            outcome
        }
        Err(e) => {
            print_error(&format!("process: {e}"));
            return Err(e);
        }
    };

    if outcome.initial_facts.trim().is_empty() {
        print_error("initial facts: model returned no text");
        return Err(IcebreakerError::GenerationUnavailable(
            "empty initial facts".to_string(),
        ));
    }
    print_success("initial facts: generated");

    match session.ask(SELF_TEST_QUESTION).await {
        Ok(answer) => {
            print_success(&format!(
                "ask: {} ({} sources)",
                segment_preview(&answer.text, 80),
                answer.sources.len()
            ));
        }
        Err(e) => {
            print_error(&format!("ask: {e}"));
            return Err(e);
        }
    }

    println!();
    print_success("All checks passed");
    Ok(())
}
