//! Profile sources
//!
//! A profile is fetched once per processed session, either live from the
//! ProxyCurl LinkedIn API or from the bundled sample profile:
//! - [`MockProfileSource`] never touches the network
//! - [`ProxycurlClient`] performs exactly one request per fetch
//! - [`ProfileFetcher`] picks between them per request

pub mod mock;
pub mod proxycurl;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use tracing::warn;
use url::Url;

pub use mock::MockProfileSource;
pub use proxycurl::ProxycurlClient;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::Profile;

/// Anything that can turn a profile identifier into a [`Profile`]
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the profile behind `target`
    ///
    /// # Errors
    /// - `DataUnavailable` for network failures, rejected credentials, malformed
    ///   upstream responses and unknown profiles
    /// - `Timeout` when the upstream call exceeds the configured timeout
    async fn fetch(&self, target: &str, credential: Option<&str>) -> Result<Profile>;

    /// Short label used in logs
    fn name(&self) -> &'static str;
}

/// What the caller asked for when processing a profile
#[derive(Debug, Clone, Default)]
pub struct ProfileRequest {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub use_mock: bool,
}

impl ProfileRequest {
    pub fn mock() -> Self {
        Self {
            url: None,
            api_key: None,
            use_mock: true,
        }
    }

    pub fn live(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: Some(url.into()),
            api_key,
            use_mock: false,
        }
    }
}

/// Routes each request to the mock or the live source
///
/// Mock mode is chosen explicitly or when no credential is available at all.
/// Live failures are surfaced as-is and never replaced by mock data.
#[derive(Clone)]
pub struct ProfileFetcher {
    mock: Arc<dyn ProfileSource>,
    live: Arc<dyn ProfileSource>,
    default_api_key: Option<String>,
}

impl ProfileFetcher {
    pub fn new(
        mock: Arc<dyn ProfileSource>,
        live: Arc<dyn ProfileSource>,
        default_api_key: Option<String>,
    ) -> Self {
        Self {
            mock,
            live,
            default_api_key,
        }
    }

    /// Build the standard mock + ProxyCurl pair from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mock = Arc::new(MockProfileSource::from_config(config));
        let live = Arc::new(ProxycurlClient::from_config(config)?);
        Ok(Self::new(mock, live, config.profile.api_key.clone()))
    }

    fn credential<'a>(&'a self, request: &'a ProfileRequest) -> Option<&'a str> {
        request
            .api_key
            .as_deref()
            .or(self.default_api_key.as_deref())
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// A live URL was given but no API key is available, so the mock is served instead
    pub fn substitutes_mock(&self, request: &ProfileRequest) -> bool {
        !request.use_mock && self.credential(request).is_none()
    }

    pub async fn fetch(&self, request: &ProfileRequest) -> Result<Profile> {
        let credential = self.credential(request);
        let target = request.url.as_deref().unwrap_or_default();

        if self.substitutes_mock(request) {
            warn!(
                "No ProxyCurl API key available for {}, using the {} profile instead",
                if target.is_empty() { "the request" } else { target },
                self.mock.name()
            );
            return self.mock.fetch(target, None).await;
        }
        if request.use_mock {
            debug!("Fetching profile from {} source", self.mock.name());
            return self.mock.fetch(target, None).await;
        }

        debug!("Fetching profile from {} source: {}", self.live.name(), target);
        self.live.fetch(target, credential).await
    }
}

/// Extract the `/in/<username>` handle from a LinkedIn profile URL
///
/// Accepts URLs with or without scheme, `www.`, trailing slash or query string.
pub fn extract_username(profile_url: &str) -> Option<String> {
    let trimmed = profile_url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?;
    if !(host == "linkedin.com" || host.ends_with(".linkedin.com")) {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some("in"), Some(username)) => Some(username.to_string()),
        _ => None,
    }
}
