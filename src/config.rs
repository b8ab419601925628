use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::IcebreakerError;

/// File looked up in the working directory when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix for environment overrides, e.g. `ICEBREAKER_RETRIEVAL__CHUNK_SIZE=256`
pub const ENV_PREFIX: &str = "ICEBREAKER";

const REDACTED: &str = "***";

/// Hosted model provider edition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Watsonx,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Watsonx => "watsonx",
        }
    }

    fn default_endpoint(self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::Watsonx => "https://us-south.ml.cloud.ibm.com",
        }
    }

    fn default_llm_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::Watsonx => "ibm/granite-3-8b-instruct",
        }
    }

    fn default_embedding_model(self) -> &'static str {
        match self {
            Self::Gemini => "models/text-embedding-004",
            Self::Watsonx => "ibm/slate-125m-english-rtrvr",
        }
    }

    fn default_supported_models(self) -> &'static [&'static str] {
        match self {
            Self::Gemini => &[
                "gemini-2.5-flash",
                "gemini-2.5-pro",
                "gemini-1.5-flash",
                "gemini-1.5-pro",
            ],
            Self::Watsonx => &[
                "ibm/granite-3-8b-instruct",
                "ibm/granite-3-2-8b-instruct",
                "meta-llama/llama-3-3-70b-instruct",
                "mistralai/mistral-large",
            ],
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = IcebreakerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "watsonx" | "ibm" => Ok(Self::Watsonx),
            other => Err(IcebreakerError::ConfigError(format!(
                "unknown provider '{other}' (expected 'gemini' or 'watsonx')"
            ))),
        }
    }
}

/// Model provider settings. Unset endpoints and model ids fall back to the
/// defaults of the selected `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// watsonx.ai project the generation and embedding calls are billed to
    pub project_id: Option<String>,
    pub iam_endpoint: String,
    pub llm_model: Option<String>,
    pub embedding_model: Option<String>,
    pub supported_models: Vec<String>,
    pub embedding_batch_size: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            endpoint: None,
            api_key: None,
            project_id: None,
            iam_endpoint: "https://iam.cloud.ibm.com/identity/token".to_string(),
            llm_model: None,
            embedding_model: None,
            supported_models: Vec::new(),
            embedding_batch_size: 100,
        }
    }
}

impl ProviderConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.kind.default_endpoint())
            .trim_end_matches('/')
    }

    pub fn llm_model(&self) -> &str {
        self.llm_model
            .as_deref()
            .unwrap_or_else(|| self.kind.default_llm_model())
    }

    pub fn embedding_model(&self) -> &str {
        self.embedding_model
            .as_deref()
            .unwrap_or_else(|| self.kind.default_embedding_model())
    }

    /// Models the generator accepts; the configured default model is always included
    pub fn supported_models(&self) -> Vec<String> {
        let mut models: Vec<String> = if self.supported_models.is_empty() {
            self.kind
                .default_supported_models()
                .iter()
                .map(|m| (*m).to_string())
                .collect()
        } else {
            self.supported_models.clone()
        };
        let default_model = self.llm_model().to_string();
        if !models.contains(&default_model) {
            models.insert(0, default_model);
        }
        models
    }
}

/// Decoding parameters sent with every generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_new_tokens: u32,
    pub min_new_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_new_tokens: 1024,
            min_new_tokens: 1,
            top_k: 40,
            top_p: 0.95,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum segment length in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive segments
    pub chunk_overlap: usize,
    pub similarity_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
            similarity_top_k: 3,
        }
    }
}

pub const DEFAULT_INITIAL_FACTS_TEMPLATE: &str = r"Context information is below.
---------------------
{context_str}
---------------------
Given the context information and not prior knowledge, provide three interesting and specific facts about this person's career or education.
Be detailed and cite actual information from the profile.

Format your response as:
1. [First fact]
2. [Second fact]
3. [Third fact]

Facts:
";

pub const DEFAULT_QUESTION_TEMPLATE: &str = r#"Context information is below.
---------------------
{context_str}
---------------------
Given the context information and not prior knowledge, answer the question: {query_str}

If the answer is not in the context, say "{fallback_str}"

Provide a clear, concise answer based only on the information provided.

Answer:
"#;

pub const DEFAULT_FALLBACK_ANSWER: &str =
    "I don't have enough information to answer that question based on the profile.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub initial_facts_template: String,
    pub question_template: String,
    /// Phrase the model must answer with when the context lacks the answer
    pub fallback_answer: String,
    pub context_delimiter: String,
    /// Retrieval query used to pick the segments for the initial facts
    pub facts_query: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            initial_facts_template: DEFAULT_INITIAL_FACTS_TEMPLATE.to_string(),
            question_template: DEFAULT_QUESTION_TEMPLATE.to_string(),
            fallback_answer: DEFAULT_FALLBACK_ANSWER.to_string(),
            context_delimiter: "\n\n".to_string(),
            facts_query: "Provide three interesting facts about this person's career or education."
                .to_string(),
        }
    }
}

/// Profile data source (ProxyCurl) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub endpoint: String,
    pub credit_balance_endpoint: String,
    pub api_key: Option<String>,
    /// Local JSON file that replaces the bundled sample profile when present
    pub mock_data_path: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nubela.co/proxycurl/api/v2/linkedin".to_string(),
            credit_balance_endpoint: "https://nubela.co/proxycurl/api/credit-balance".to_string(),
            api_key: None,
            mock_data_path: "mock_data/mock_profile.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub session_timeout_secs: u64,
    pub enable_cors: bool,
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            session_timeout_secs: 3600,
            enable_cors: false,
            max_concurrent_requests: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for each outbound call (profile fetch, embedding, generation)
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            backtrace: false,
            log_dir: "logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
    pub prompts: PromptsConfig,
    pub profile: ProfileConfig,
    pub server: ServerConfig,
    pub timeouts: TimeoutConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and the environment
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering defaults, the config file and environment overrides
    ///
    /// An explicit `path` must exist; the default `config.toml` is optional.
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(
                config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
            ),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("provider.supported_models")
                .try_parsing(true),
        );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.apply_credential_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Fill unset credentials from the provider's conventional environment variables
    pub fn apply_credential_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if self.provider.api_key.is_none() {
            self.provider.api_key = match self.provider.kind {
                ProviderKind::Gemini => lookup("GEMINI_API_KEY"),
                ProviderKind::Watsonx => lookup("WATSONX_APIKEY"),
            };
        }
        if self.provider.kind == ProviderKind::Watsonx {
            if self.provider.project_id.is_none() {
                self.provider.project_id = lookup("WATSONX_PROJECT_ID");
            }
            if self.provider.endpoint.is_none() {
                self.provider.endpoint = lookup("WATSONX_URL");
            }
        }
        if self.profile.api_key.is_none() {
            self.profile.api_key = lookup("PROXYCURL_API_KEY");
        }
    }

    /// Check value ranges that would otherwise fail deep inside the pipeline
    pub fn validate(&self) -> crate::Result<()> {
        let generation = &self.generation;
        if !(0.0..=1.0).contains(&generation.temperature) {
            return Err(IcebreakerError::ConfigError(format!(
                "generation.temperature must be within [0, 1], got {}",
                generation.temperature
            )));
        }
        if !(generation.top_p > 0.0 && generation.top_p <= 1.0) {
            return Err(IcebreakerError::ConfigError(format!(
                "generation.top_p must be within (0, 1], got {}",
                generation.top_p
            )));
        }
        if generation.max_new_tokens == 0 || generation.min_new_tokens > generation.max_new_tokens {
            return Err(IcebreakerError::ConfigError(format!(
                "generation token bounds are inconsistent (min {}, max {})",
                generation.min_new_tokens, generation.max_new_tokens
            )));
        }

        let retrieval = &self.retrieval;
        if retrieval.chunk_size == 0 || retrieval.chunk_overlap >= retrieval.chunk_size {
            return Err(IcebreakerError::ConfigError(format!(
                "retrieval.chunk_overlap ({}) must be smaller than retrieval.chunk_size ({})",
                retrieval.chunk_overlap, retrieval.chunk_size
            )));
        }
        if retrieval.similarity_top_k == 0 {
            return Err(IcebreakerError::ConfigError(
                "retrieval.similarity_top_k must be at least 1".to_string(),
            ));
        }
        if self.provider.embedding_batch_size == 0 {
            return Err(IcebreakerError::ConfigError(
                "provider.embedding_batch_size must be at least 1".to_string(),
            ));
        }
        if self.timeouts.request_secs == 0 {
            return Err(IcebreakerError::ConfigError(
                "timeouts.request_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy of the configuration with every credential masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.provider.api_key.is_some() {
            copy.provider.api_key = Some(REDACTED.to_string());
        }
        if copy.profile.api_key.is_some() {
            copy.profile.api_key = Some(REDACTED.to_string());
        }
        copy
    }

    /// Render the redacted configuration as TOML
    pub fn to_redacted_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        self.provider.llm_model()
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        self.provider.embedding_model()
    }

    /// Per-call timeout for outbound requests
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeouts.request_secs)
    }
}
