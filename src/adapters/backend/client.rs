//! Shared HTTP client for the backend REST and storage APIs

use crate::config::BackendConfig;
use crate::domain::{BackendError, FerryError, Result};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;
use url::Url;

use crate::config::SecretString;

/// Authenticated HTTP client bound to one backend project
///
/// Every request carries the `apikey` header and a bearer token: the session
/// token when configured, the API key otherwise.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    api_key: SecretString,
    access_token: Option<SecretString>,
}

impl BackendClient {
    /// Create a client from the `[backend]` section
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            FerryError::Configuration(format!(
                "Invalid backend.base_url '{}': {}",
                config.base_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FerryError::Configuration(format!(
                "backend.base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let http = client_builder
            .build()
            .map_err(|e| FerryError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// URL made of the base URL followed by `segments`
    ///
    /// Each segment is percent-encoded; a segment may not contain `/`.
    pub fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Start an authenticated request
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self
            .access_token
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty())
            .unwrap_or(&self.api_key);

        self.http
            .request(method, url)
            .header("apikey", self.api_key.expose_secret().as_str())
            .bearer_auth(token.expose_secret().as_str())
    }

    /// Send a request, turning transport failures and non-2xx statuses into
    /// [`BackendError`]s
    pub async fn send(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<reqwest::Response, BackendError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }
}

/// Classify an HTTP status
pub(crate) fn status_error(status: StatusCode, body: String) -> BackendError {
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("no response body").to_string()
    } else {
        body
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BackendError::AuthenticationFailed(message)
        }
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT => BackendError::Timeout(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited(message),
        s if s.is_server_error() => BackendError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => BackendError::ClientError {
            status: s.as_u16(),
            message,
        },
    }
}

/// Classify a transport-level failure
pub(crate) fn transport_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout(error.to_string())
    } else if error.is_decode() {
        BackendError::InvalidResponse(error.to_string())
    } else {
        BackendError::ConnectionFailed(error.to_string())
    }
}
