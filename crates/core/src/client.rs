//! HTTP client for the media API

use crate::config::{redact, ConfigFile};
use crate::error::{Error, Result};
use crate::signature::SignatureAlgorithm;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Default API root, the cloud name is appended to it
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Scheme of the `CLOUDINARY_URL` connection string
pub const CLOUDINARY_URL_SCHEME: &str = "cloudinary://";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const USER_AGENT: &str = concat!("mediapilot/", env!("CARGO_PKG_VERSION"));

/// Account credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Parse `cloudinary://<api_key>:<api_secret>@<cloud_name>`
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url.trim().strip_prefix(CLOUDINARY_URL_SCHEME).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "connection string must start with {}",
                CLOUDINARY_URL_SCHEME
            ))
        })?;

        let (auth, cloud) = rest.rsplit_once('@').ok_or_else(|| {
            Error::InvalidConfig("connection string is missing '@<cloud_name>'".to_string())
        })?;
        let (api_key, api_secret) = auth.split_once(':').ok_or_else(|| {
            Error::InvalidConfig("connection string is missing '<api_key>:<api_secret>'".to_string())
        })?;

        let cloud_name = cloud.split(['/', '?']).next().unwrap_or_default();
        if cloud_name.is_empty() || api_key.is_empty() || api_secret.is_empty() {
            return Err(Error::InvalidConfig(
                "connection string has an empty cloud name, api key or api secret".to_string(),
            ));
        }

        Ok(Self::new(cloud_name, api_key, api_secret))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &redact(&self.api_secret))
            .finish()
    }
}

/// Media API client
#[derive(Debug, Clone)]
pub struct MediaClient {
    credentials: Credentials,
    http_client: Client,
    base_url: String,
    signature_algorithm: SignatureAlgorithm,
}

impl MediaClient {
    /// Create a new client against the default API root
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self {
            credentials,
            http_client: build_http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            signature_algorithm: SignatureAlgorithm::default(),
        })
    }

    /// Create a client from the configuration file
    pub fn from_config(config: &ConfigFile) -> Result<Self> {
        let cloud = &config.cloud;
        let credentials = Credentials::new(&cloud.cloud_name, &cloud.api_key, &cloud.api_secret);
        let timeout = config.advanced.as_ref().map(|a| a.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
        let algorithm = config
            .upload
            .as_ref()
            .map(|u| u.signature_algorithm)
            .unwrap_or_default();

        Ok(Self::new(credentials)?
            .with_base_url(&cloud.api_base_url)
            .with_timeout(Duration::from_secs(timeout))?
            .with_signature_algorithm(algorithm))
    }

    /// Point the client at another API root (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = build_http_client(timeout)?;
        Ok(self)
    }

    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    pub fn cloud_name(&self) -> &str {
        &self.credentials.cloud_name
    }

    pub fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    pub(crate) fn api_secret(&self) -> &str {
        &self.credentials.api_secret
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Full URL of an endpoint of this cloud
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.credentials.cloud_name,
            path.trim_start_matches('/')
        )
    }

    /// Handle API response
    pub(crate) async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "media API request succeeded");
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::warn!(status = status.as_u16(), error = %message, "media API request failed");

        Err(match status.as_u16() {
            401 => Error::Authentication(message),
            403 => Error::PermissionDenied(message),
            404 => Error::NotFound(message),
            420 | 429 => Error::RateLimited(message),
            code => Error::Api {
                status: code,
                message,
            },
        })
    }
}

fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::HttpClient(format!("failed to build HTTP client: {}", e)))
}

/// Error body: `{"error": {"message": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error.message;
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}
