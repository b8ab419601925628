//! Bundled sample profile for offline development and tests

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use tracing::info;

use super::ProfileSource;
use crate::config::AppConfig;
use crate::errors::IcebreakerError;
use crate::errors::Result;
use crate::models::Profile;

/// Sample profile compiled into the binary
pub const BUNDLED_PROFILE_JSON: &str = include_str!("../../data/mock_profile.json");

/// Returns the same sample profile for every target, with no network access
pub struct MockProfileSource {
    override_path: Option<PathBuf>,
}

impl MockProfileSource {
    /// Source that always returns the bundled profile
    pub fn bundled() -> Self {
        Self {
            override_path: None,
        }
    }

    /// Source that prefers a local JSON file and falls back to the bundled profile
    /// when the file does not exist
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            override_path: Some(path.into()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let path = config.profile.mock_data_path.trim();
        if path.is_empty() {
            Self::bundled()
        } else {
            Self::with_override(path)
        }
    }

    /// The bundled sample, parsed
    pub fn bundled_profile() -> Result<Profile> {
        Profile::from_json(BUNDLED_PROFILE_JSON)
    }

    fn load(&self) -> Result<Profile> {
        if let Some(path) = self.override_path.as_ref().filter(|p| p.exists()) {
            info!("Loading mock profile from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            return Profile::from_json(&content).map_err(|e| {
                IcebreakerError::DataUnavailable(format!(
                    "mock profile {} is not valid profile JSON: {e}",
                    path.display()
                ))
            });
        }

        debug!("Using bundled mock profile");
        Self::bundled_profile()
    }
}

#[async_trait]
impl ProfileSource for MockProfileSource {
    async fn fetch(&self, _target: &str, _credential: Option<&str>) -> Result<Profile> {
        self.load()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
