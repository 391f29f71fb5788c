//! HTTP request and response values.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tether_endpoint::{EndpointError, Request};

/// An HTTP request relative to a session's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Path relative to the base URL.
    pub path: String,
    /// Query parameters, appended in order.
    pub query: Vec<(String, String)>,
    /// Per-request headers, added on top of the session defaults.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Option<Vec<u8>>,
}

impl Request for HttpRequest {
    type Response = HttpResponse;
}

impl HttpRequest {
    /// Creates a request without query, headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Creates a `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Sets a header.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidInput`] if the name or value is not a valid header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, EndpointError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| EndpointError::invalid_input(format!("invalid header name `{name}`")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| EndpointError::invalid_input(format!("invalid value for header `{name}`")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the `Authorization: Bearer` header.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidInput`] if the token is not a valid header value.
    pub fn bearer_auth(mut self, token: &str) -> Result<Self, EndpointError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| EndpointError::invalid_input("bearer token is not a valid header value"))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    /// Serializes `body` as the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Json`] if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, EndpointError> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }
}

/// A successful HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Decodes the body as JSON. An empty body decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Json`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, EndpointError> {
        if self.body.is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decodes the body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidResponse`] if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, EndpointError> {
        String::from_utf8(self.body.clone())
            .map_err(|err| EndpointError::invalid_response(format!("body is not utf-8: {err}")))
    }
}
