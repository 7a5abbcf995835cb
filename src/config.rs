//! Connection settings for the deployment server.
//!
//! Settings come from layered sources. CLI flags and environment variables
//! (handled by `clap`) win over the user config file at
//! `~/.deploylens/config.toml`. [`resolve`] loads every source concurrently,
//! merges them field by field and fails fast when the sources do not answer
//! in time or required fields are still missing.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use log::debug;
use serde::Deserialize;
use url::Url;

use crate::auth::AccessToken;
use crate::error::{DeployLensError, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// One partially filled configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_concurrency: Option<usize>,
}

impl ServerConfig {
    pub fn is_configured(&self) -> bool {
        non_blank(self.server_url.as_deref()).is_some() && non_blank(self.api_key.as_deref()).is_some()
    }

    /// Fill every field `self` leaves empty from `lower`.
    #[must_use]
    pub fn or(self, lower: ServerConfig) -> ServerConfig {
        ServerConfig {
            server_url: self.server_url.filter(|v| !v.trim().is_empty()).or(lower.server_url),
            api_key: self.api_key.filter(|v| !v.trim().is_empty()).or(lower.api_key),
            request_timeout_secs: self.request_timeout_secs.or(lower.request_timeout_secs),
            max_concurrency: self.max_concurrency.or(lower.max_concurrency),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Fully resolved settings, ready to build an API client from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: Url,
    pub api_key: AccessToken,
    pub request_timeout: Duration,
    pub max_concurrency: usize,
}

impl TryFrom<ServerConfig> for Settings {
    type Error = DeployLensError;

    fn try_from(config: ServerConfig) -> Result<Self> {
        let server_url = non_blank(config.server_url.as_deref());
        let api_key = non_blank(config.api_key.as_deref());

        let mut missing = Vec::new();
        if server_url.is_none() {
            missing.push("server URL (--server-url or DEPLOYLENS_SERVER_URL)");
        }
        if api_key.is_none() {
            missing.push("API key (--api-key or DEPLOYLENS_API_KEY)");
        }
        let (Some(server_url), Some(api_key)) = (server_url, api_key) else {
            return Err(DeployLensError::ConfigMissing(format!(
                "{}; set them on the command line, in the environment, or in ~/.deploylens/config.toml",
                missing.join(", ")
            )));
        };

        Ok(Self {
            server_url: parse_server_url(server_url)?,
            api_key: AccessToken::from(api_key),
            request_timeout: config
                .request_timeout_secs
                .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs),
            max_concurrency: config
                .max_concurrency
                .unwrap_or(DEFAULT_MAX_CONCURRENCY)
                .max(1),
        })
    }
}

/// Parse the server root and normalize it to end in `/` so endpoint paths join below it.
fn parse_server_url(raw: &str) -> Result<Url> {
    let mut url =
        Url::parse(raw).map_err(|e| DeployLensError::Config(format!("Invalid server URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DeployLensError::Config(format!(
            "Server URL must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &str;

    async fn load(&self) -> Result<Option<ServerConfig>>;
}

/// Values given explicitly on the command line or through the environment.
pub struct Overrides(pub ServerConfig);

#[async_trait]
impl ConfigSource for Overrides {
    fn name(&self) -> &str {
        "command line"
    }

    async fn load(&self) -> Result<Option<ServerConfig>> {
        Ok(Some(self.0.clone()))
    }
}

/// TOML config file; a missing file is an empty layer.
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `~/.deploylens/config.toml`
    pub fn user_default() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".deploylens").join("config.toml")))
    }
}

#[async_trait]
impl ConfigSource for ConfigFile {
    fn name(&self) -> &str {
        "config file"
    }

    async fn load(&self) -> Result<Option<ServerConfig>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map(Some).map_err(|e| {
            DeployLensError::Config(format!("Malformed {}: {e}", self.path.display()))
        })
    }
}

/// Resolve settings from `sources`, listed highest precedence first.
///
/// # Errors
///
/// `ConfigTimeout` if the sources have not all answered within `wait`,
/// `ConfigMissing` if the merged layers still lack a server URL or API key,
/// and `Config` for malformed values.
pub async fn resolve(sources: &[&dyn ConfigSource], wait: Duration) -> Result<Settings> {
    let loads = join_all(sources.iter().map(|source| source.load()));
    let layers = tokio::time::timeout(wait, loads)
        .await
        .map_err(|_| DeployLensError::ConfigTimeout(wait))?;

    let mut merged = ServerConfig::default();
    for (source, layer) in sources.iter().zip(layers) {
        if let Some(layer) = layer? {
            debug!("Loaded configuration layer from {}", source.name());
            merged = merged.or(layer);
        }
    }

    Settings::try_from(merged)
}
