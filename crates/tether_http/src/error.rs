//! HTTP session errors.

/// Failure of an [`HttpSession`](crate::HttpSession).
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The configured base URL, or a URL built from it, is not valid.
    #[error("invalid url `{url}`: {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// A configured header name or value is not valid.
    #[error("invalid header `{name}`")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// Configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("http status {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Response body, lossily decoded as UTF-8.
        body: String,
    },
}

impl HttpError {
    /// Returns the response status for [`Status`](Self::Status) errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for 4xx statuses.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|status| (400..500).contains(&status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_reports_client_errors() {
        let err = HttpError::Status {
            status: 404,
            body: "missing".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "http status 404: missing");

        let err = HttpError::Config("bad timeout".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_client_error());
    }
}
