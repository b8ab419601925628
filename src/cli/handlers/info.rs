//! Configuration display and connectivity diagnostics

use crate::cli::output::*;
use crate::profile::ProxycurlClient;
use crate::rag::RagService;
use crate::AppConfig;
use crate::Result;

const DIAGNOSE_PROMPT: &str = "Reply with the single word: ready";
const DIAGNOSE_EMBED_TEXT: &str = "Senior AI Engineer at Tech Innovations Ltd";

pub fn handle_config_command(config: &AppConfig) -> Result<()> {
    println!("📋 Icebreaker Configuration:");
    println!();
    print!("{}", config.to_redacted_toml()?);
    Ok(())
}

/// Check the ProxyCurl key and that the model provider answers
///
/// Both checks run; the first failure is returned afterwards.
pub async fn handle_diagnose(config: &AppConfig, api_key: Option<&str>) -> Result<()> {
    println!("🩺 Icebreaker diagnostics");
    println!("=========================\n");

    let mut first_error = None;

    let key = api_key
        .or(config.profile.api_key.as_deref())
        .map(str::trim)
        .filter(|key| !key.is_empty());
    match key {
        Some(key) => {
            let client = ProxycurlClient::from_config(config)?;
            match client.credit_balance(key).await {
                Ok(balance) => print_success(&format!("ProxyCurl: key valid, {balance} credits left")),
                Err(e) => {
                    print_error(&format!("ProxyCurl: {e}"));
                    first_error.get_or_insert(e);
                }
            }
        }
        None => print_warning("ProxyCurl: no API key configured, only mock mode is available"),
    }

    let provider = config.provider.kind.as_str();
    let checked = match RagService::new(config) {
        Ok(service) => check_provider(&service, provider).await,
        Err(e) => {
            print_error(&format!("{provider}: {e}"));
            Err(e)
        }
    };
    if let Err(e) = checked {
        first_error.get_or_insert(e);
    }

    first_error.map_or(Ok(()), Err)
}

/// Send a one-word prompt and embed one text with the configured models
///
/// Both checks run; the first failure is returned afterwards.
pub async fn check_provider(service: &RagService, provider: &str) -> Result<()> {
    let mut first_error = None;

    let model = service.default_model();
    match service.generate(DIAGNOSE_PROMPT.to_string(), model).await {
        Ok(result) => print_success(&format!(
            "{provider} ({model}): replied {:?}",
            truncate_str(result.text.trim(), 40)
        )),
        Err(e) => {
            print_error(&format!("{provider} ({model}): {e}"));
            first_error.get_or_insert(e);
        }
    }

    let embedding_model = service.embedding_model();
    match service.embedding_dimension(DIAGNOSE_EMBED_TEXT).await {
        Ok(dimension) => print_success(&format!(
            "{provider} embeddings ({embedding_model}): {dimension}-dimensional vectors"
        )),
        Err(e) => {
            print_error(&format!("{provider} embeddings ({embedding_model}): {e}"));
            first_error.get_or_insert(e);
        }
    }

    first_error.map_or(Ok(()), Err)
}
