use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployLensError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Configuration was not available after {0:?}; check the config file and environment")]
    ConfigTimeout(Duration),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("API request to {url} failed: {status} {status_text} - {body}")]
    Api {
        status: u16,
        status_text: String,
        body: String,
        url: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Onboarding store error: {0}")]
    Store(String),

    #[error("Onboarding error: {0}")]
    Onboarding(String),
}

impl DeployLensError {
    /// Whether the error means "this endpoint has nothing for us" rather than
    /// a failure: 403/404 responses, or anything reporting a deprecated endpoint.
    pub fn is_expected_absence(&self) -> bool {
        if let Self::Api { status: 403 | 404, .. } = self {
            return true;
        }
        self.to_string().to_lowercase().contains("deprecated")
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, DeployLensError>;
