//! Error types for the device update client

use thiserror::Error;

/// Errors that can occur while talking to the hub or the update service
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure: DNS, connect, TLS, timeouts, broken reads
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The service answered with a status the caller cannot treat as a result
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not the JSON we expected
    #[error("Response parsing error: {0}")]
    Parse(String),

    /// Endpoint configuration could not be turned into a request URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// HTTP status code, when the error came from a status response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(error: url::ParseError) -> Self {
        ClientError::InvalidUrl(error.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Parse(error.to_string())
    }
}

/// Type alias for results that can return a ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network/HTTP error: connection refused");

        let err = ClientError::Http {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: busy");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_conversions() {
        let parse_err: ClientError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(parse_err, ClientError::Parse(_)));
        assert_eq!(parse_err.status(), None);

        let url_err: ClientError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(url_err, ClientError::InvalidUrl(_)));
    }
}
