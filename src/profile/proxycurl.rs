//! ProxyCurl LinkedIn profile API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::extract_username;
use super::ProfileSource;
use crate::config::AppConfig;
use crate::errors::IcebreakerError;
use crate::errors::Result;
use crate::models::Profile;

/// Live profile source; one GET per fetch
pub struct ProxycurlClient {
    endpoint: String,
    credit_balance_endpoint: String,
    client: Client,
    timeout: Duration,
}

impl ProxycurlClient {
    /// Create a new ProxyCurl client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(
        endpoint: impl Into<String>,
        credit_balance_endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IcebreakerError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            credit_balance_endpoint: credit_balance_endpoint.into(),
            client,
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.profile.endpoint.clone(),
            config.profile.credit_balance_endpoint.clone(),
            config.request_timeout(),
        )
    }

    /// Remaining ProxyCurl credits for `api_key`; used to validate a key without spending credits
    pub async fn credit_balance(&self, api_key: &str) -> Result<u64> {
        #[derive(Deserialize)]
        struct CreditBalance {
            credit_balance: u64,
        }

        let response = self
            .client
            .get(&self.credit_balance_endpoint)
            .bearer_auth(api_key.trim())
            .send()
            .await
            .map_err(|e| self.transport_error(&e, "credit balance check"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, "credit balance"));
        }

        let balance: CreditBalance = response.json().await.map_err(|e| {
            IcebreakerError::DataUnavailable(format!("malformed credit balance response: {e}"))
        })?;
        Ok(balance.credit_balance)
    }

    fn transport_error(&self, error: &reqwest::Error, stage: &str) -> IcebreakerError {
        if error.is_timeout() {
            IcebreakerError::timeout(stage, self.timeout.as_secs())
        } else {
            IcebreakerError::DataUnavailable(format!("ProxyCurl request failed: {error}"))
        }
    }
}

/// Map a non-success ProxyCurl status to `DataUnavailable` with a readable reason
fn status_error(status: StatusCode, body: &str, what: &str) -> IcebreakerError {
    let reason = match status {
        StatusCode::UNAUTHORIZED => "invalid ProxyCurl API key".to_string(),
        StatusCode::FORBIDDEN => "ProxyCurl account is inactive or the key is forbidden".to_string(),
        StatusCode::NOT_FOUND => format!("{what} not found"),
        StatusCode::TOO_MANY_REQUESTS => "ProxyCurl rate limit reached".to_string(),
        _ => format!("unexpected ProxyCurl response: {}", body.trim()),
    };
    IcebreakerError::DataUnavailable(format!("{reason} ({status})"))
}

#[async_trait]
impl ProfileSource for ProxycurlClient {
    async fn fetch(&self, target: &str, credential: Option<&str>) -> Result<Profile> {
        let api_key = credential.map(str::trim).filter(|k| !k.is_empty()).ok_or_else(|| {
            IcebreakerError::DataUnavailable("a ProxyCurl API key is required".to_string())
        })?;

        let username = extract_username(target).ok_or_else(|| {
            IcebreakerError::DataUnavailable(format!("'{target}' is not a LinkedIn profile URL"))
        })?;

        info!("Fetching LinkedIn profile for '{}'", username);
        let started = std::time::Instant::now();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", target.trim())])
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| self.transport_error(&e, "profile fetch"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("ProxyCurl returned {} for '{}'", status, username);
            return Err(status_error(status, &body, &format!("profile '{username}'")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e, "profile fetch"))?;
        let profile = Profile::from_json(&body).map_err(|e| {
            IcebreakerError::DataUnavailable(format!("malformed ProxyCurl response: {e}"))
        })?;

        if profile.is_empty() {
            return Err(IcebreakerError::DataUnavailable(format!(
                "ProxyCurl returned an empty profile for '{username}'"
            )));
        }

        debug!(
            "Fetched profile '{}' in {:.2}s",
            profile.display_name(),
            started.elapsed().as_secs_f64()
        );
        Ok(profile)
    }

    fn name(&self) -> &'static str {
        "proxycurl"
    }
}
