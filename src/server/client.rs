use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::auth::AccessToken;
use crate::config::{self, ConfigSource, Settings};
use crate::error::{DeployLensError, Result};

/// Authenticated JSON client for the deployment server REST API.
pub struct ApiClient {
    client: Client,
    server_url: Url,
    token: AccessToken,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("DeployLens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeployLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            server_url: settings.server_url.clone(),
            token: settings.api_key.clone(),
            timeout: settings.request_timeout,
        })
    }

    /// Resolve settings from `sources` and build a client, failing after `wait`.
    pub async fn init(sources: &[&dyn ConfigSource], wait: Duration) -> Result<(Self, Settings)> {
        let settings = config::resolve(sources, wait).await?;
        let client = Self::new(&settings)?;
        Ok((client, settings))
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.server_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| DeployLensError::Config(format!("Invalid endpoint '{endpoint}': {e}")))
    }

    /// Issue one request. A 204 or empty body yields `None`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Option<T>> {
        let url = self.endpoint_url(endpoint)?;
        let started = Instant::now();

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(self.token.as_str())
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };

        let (status, bytes) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "{method} {endpoint} timed out after {} ms",
                    self.timeout.as_millis()
                );
                return Err(DeployLensError::Timeout {
                    url: url.to_string(),
                    after: self.timeout,
                });
            }
        };

        debug!(
            "{method} {endpoint} -> {} ({} ms)",
            status.as_u16(),
            started.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(DeployLensError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
                url: url.to_string(),
            });
        }

        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<Option<T>> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<Option<T>> {
        self.request(Method::PUT, endpoint, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>> {
        self.request(Method::DELETE, endpoint, None).await
    }

    /// GET that treats 403/404/deprecated responses as "no data".
    pub async fn safe_get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>> {
        match self.get(endpoint).await {
            Err(e) if e.is_expected_absence() => {
                debug!("No data at {endpoint}: {e}");
                Ok(None)
            }
            other => other,
        }
    }
}
