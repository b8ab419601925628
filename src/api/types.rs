//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::profile::ProfileRequest;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub model: String,
    pub active_sessions: usize,
}

/// `POST /process` form body; an unchecked checkbox is simply absent
#[derive(Debug, Default, Deserialize)]
pub struct ProcessForm {
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub use_mock: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ProcessForm {
    pub fn use_mock(&self) -> bool {
        self.use_mock
            .as_deref()
            .is_some_and(|v| matches!(v, "on" | "true" | "1" | "yes"))
    }

    pub fn to_request(&self) -> ProfileRequest {
        ProfileRequest {
            url: non_blank(self.profile_url.as_deref()),
            api_key: non_blank(self.api_key.as_deref()),
            use_mock: self.use_mock(),
        }
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// `POST /chat` form body
#[derive(Debug, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub question: String,
}

/// `GET /` query string
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub session_id: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
