//! The reqwest-backed [`HttpSession`].

use core::fmt;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tether_repository::{Cancellables, Session};

use crate::config::SessionConfig;
use crate::error::HttpError;
use crate::request::{HttpRequest, HttpResponse};

/// Executes [`HttpRequest`]s against a base URL.
pub struct HttpSession {
    client: reqwest::Client,
    base_url: Url,
    config: SessionConfig,
    cancellables: Cancellables,
}

impl fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSession")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("in_flight", &self.cancellables.len())
            .finish_non_exhaustive()
    }
}

impl HttpSession {
    /// Creates a session from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or a default header is invalid, or if
    /// the HTTP client cannot be built.
    pub fn new(config: SessionConfig) -> Result<Self, HttpError> {
        let mut base_url = Url::parse(&config.base_url).map_err(|err| HttpError::InvalidUrl {
            url: config.base_url.clone(),
            message: err.to_string(),
        })?;
        // Relative paths resolve below the base path only if it ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HttpError::InvalidHeader { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeader { name: name.clone() })?;
            headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        tracing::debug!(base_url = %base_url, "http session created");
        Ok(Self {
            client,
            base_url,
            config,
            cancellables: Cancellables::new(),
        })
    }

    /// Returns the session's configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolves `request`'s path and query against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] if the path cannot be joined.
    pub fn url_for(&self, request: &HttpRequest) -> Result<Url, HttpError> {
        let path = request.path.trim_start_matches('/');
        let mut url = self.base_url.join(path).map_err(|err| HttpError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            message: err.to_string(),
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Session for HttpSession {
    type Request = HttpRequest;
    type Error = HttpError;

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = self.url_for(request)?;
        tracing::debug!(method = %request.method, url = %url, "sending http request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "http request returned error status");
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body: body.to_vec(),
        })
    }

    fn cancellables(&self) -> &Cancellables {
        &self.cancellables
    }
}
