use thiserror::Error;

#[derive(Error, Debug)]
pub enum IcebreakerError {
    #[error("Profile data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Generation service unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Model not supported: {0}")]
    ModelUnsupported(String),

    #[error("Timed out after {seconds}s during {stage}")]
    Timeout { stage: String, seconds: u64 },

    #[error("Cannot build index: {0}")]
    EmptyIndex(String),

    #[error("Index has not been built for this session")]
    IndexNotReady,

    #[error("No profile has been processed in this session yet")]
    SessionNotReady,

    #[error("Session is busy with another request")]
    SessionBusy,

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Configuration loading error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IcebreakerError {
    /// Stable name of the error kind, shown by the CLI as `error[<kind>]`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataUnavailable(_) => "DataUnavailable",
            Self::EmbeddingUnavailable(_) => "EmbeddingUnavailable",
            Self::GenerationUnavailable(_) => "GenerationUnavailable",
            Self::RateLimited(_) => "RateLimited",
            Self::ModelUnsupported(_) => "ModelUnsupported",
            Self::Timeout { .. } => "Timeout",
            Self::EmptyIndex(_) => "EmptyIndex",
            Self::IndexNotReady => "IndexNotReady",
            Self::SessionNotReady => "SessionNotReady",
            Self::SessionBusy => "SessionBusy",
            Self::TemplateError(_) => "TemplateError",
            Self::InvalidInput(_) => "InvalidInput",
            Self::ConfigError(_) | Self::Config(_) => "ConfigError",
            Self::Serialization(_) | Self::TomlParsing(_) | Self::TomlSerialization(_) => {
                "SerializationError"
            }
            Self::Io(_) => "IoError",
        }
    }

    /// Whether the caller may retry after a backoff. Nothing in the crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Timeout { .. } | Self::SessionBusy)
    }

    pub(crate) fn timeout(stage: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            stage: stage.into(),
            seconds,
        }
    }
}

pub type Result<T> = std::result::Result<T, IcebreakerError>;
