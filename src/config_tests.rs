//! Unit tests for configuration module
//!
//! These tests validate configuration parsing, defaults, and validation.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use crate::config::*;
    use crate::errors::IcebreakerError;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp config");
        file.write_all(contents.as_bytes()).expect("write temp config");
        file
    }

    // ====== Default Value Tests ======

    #[test]
    fn test_default_retrieval_parameters() {
        let config = AppConfig::default();
        assert_eq!(config.retrieval.chunk_size, 512);
        assert_eq!(config.retrieval.chunk_overlap, 50);
        assert_eq!(config.retrieval.similarity_top_k, 3);
    }

    #[test]
    fn test_default_generation_parameters() {
        let config = AppConfig::default();
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_new_tokens, 1024);
        assert_eq!(config.generation.min_new_tokens, 1);
        assert_eq!(config.generation.top_k, 40);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_question_template_mentions_fallback() {
        let config = AppConfig::default();
        assert!(config.prompts.question_template.contains("{context_str}"));
        assert!(config.prompts.question_template.contains("{query_str}"));
        assert!(config.prompts.question_template.contains("{fallback_str}"));
    }

    // ====== Provider Tests ======

    #[test]
    fn test_provider_defaults_follow_kind() {
        let mut provider = ProviderConfig::default();
        assert_eq!(provider.llm_model(), "gemini-2.5-flash");
        assert_eq!(provider.embedding_model(), "models/text-embedding-004");

        provider.kind = ProviderKind::Watsonx;
        assert_eq!(provider.endpoint(), "https://us-south.ml.cloud.ibm.com");
        assert_eq!(provider.llm_model(), "ibm/granite-3-8b-instruct");
        assert!(provider
            .supported_models()
            .contains(&"mistralai/mistral-large".to_string()));
    }

    #[test]
    fn test_supported_models_include_configured_model() {
        let provider = ProviderConfig {
            llm_model: Some("gemini-exp".to_string()),
            supported_models: vec!["gemini-2.5-pro".to_string()],
            ..ProviderConfig::default()
        };
        let models = provider.supported_models();
        assert_eq!(models, vec!["gemini-exp", "gemini-2.5-pro"]);
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let provider = ProviderConfig {
            endpoint: Some("http://localhost:9000/".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(provider.endpoint(), "http://localhost:9000");
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("ibm".parse::<ProviderKind>().unwrap(), ProviderKind::Watsonx);
        assert!(matches!(
            "openai".parse::<ProviderKind>(),
            Err(IcebreakerError::ConfigError(_))
        ));
    }

    // ====== Credential Environment Tests ======

    #[test]
    fn test_credential_env_fills_missing_keys() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "gemini-secret"),
            ("PROXYCURL_API_KEY", "proxycurl-secret"),
            ("WATSONX_APIKEY", "ibm-secret"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_credential_env(|name| vars.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.provider.api_key.as_deref(), Some("gemini-secret"));
        assert_eq!(config.profile.api_key.as_deref(), Some("proxycurl-secret"));
        assert!(config.provider.project_id.is_none());
    }

    #[test]
    fn test_credential_env_does_not_override_explicit_keys() {
        let mut config = AppConfig::default();
        config.provider.kind = ProviderKind::Watsonx;
        config.provider.api_key = Some("from-file".to_string());

        config.apply_credential_env(|name| match name {
            "WATSONX_APIKEY" => Some("from-env".to_string()),
            "WATSONX_PROJECT_ID" => Some("project-1".to_string()),
            "WATSONX_URL" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.provider.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.provider.project_id.as_deref(), Some("project-1"));
        assert!(config.provider.endpoint.is_none());
    }

    // ====== File Loading Tests ======

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
[provider]
kind = "watsonx"
project_id = "abc"

[retrieval]
chunk_size = 400
similarity_top_k = 1
"#,
        );

        let config = AppConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Watsonx);
        assert_eq!(config.provider.project_id.as_deref(), Some("abc"));
        assert_eq!(config.retrieval.chunk_size, 400);
        assert_eq!(config.retrieval.chunk_overlap, 50);
        assert_eq!(config.retrieval.similarity_top_k, 1);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let file = write_config(
            r#"
[generation]
temperature = 0.0
max_new_tokens = 500

[server]
port = 8080
"#,
        );

        let config = AppConfig::load_from(Some(file.path())).unwrap();
        assert!(config.generation.temperature.abs() < f32::EPSILON);
        assert_eq!(config.generation.max_new_tokens, 500);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.retrieval.chunk_size, 512);
    }

    #[test]
    fn test_load_from_missing_explicit_path_fails() {
        let result = AppConfig::load_from(Some(std::path::Path::new(
            "/nonexistent/icebreaker/config.toml",
        )));
        assert!(matches!(result, Err(IcebreakerError::Config(_))));
    }

    // ====== Validation Tests ======

    #[test]
    fn test_overlap_not_smaller_than_size_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.chunk_overlap = config.retrieval.chunk_size;
        assert!(matches!(
            config.validate(),
            Err(IcebreakerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.generation.temperature = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_bounds_rejected() {
        let mut config = AppConfig::default();
        config.generation.min_new_tokens = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.similarity_top_k = 0;
        assert!(config.validate().is_err());
    }

    // ====== Redaction Tests ======

    #[test]
    fn test_redacted_toml_hides_secrets() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("super-secret".to_string());
        config.profile.api_key = Some("another-secret".to_string());

        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("another-secret"));
        assert!(rendered.contains("***"));
        assert_eq!(config.provider.api_key.as_deref(), Some("super-secret"));
    }
}
