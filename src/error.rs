//! Error handling for the loyalty client

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Error body returned by PostgREST when a request is rejected
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Unified error type for the loyalty client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The remote store rejected the request with a structured body
    #[error("API error: {details} (Status: {status})")]
    Api {
        details: ApiErrorDetails,
        status: reqwest::StatusCode,
    },

    /// The remote store rejected the request with a body we could not parse
    #[error("API error (unparsed): {message} (Status: {status})")]
    UnparsedApi {
        message: String,
        status: reqwest::StatusCode,
    },

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input rejected before anything was sent
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A staff action needs a resolved customer first
    #[error("No customer selected")]
    NoCustomerSelected,

    /// No authenticated session
    #[error("Not signed in")]
    NotSignedIn,

    /// A scoped read or write matched no rows
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored amounts add up past what a decimal can hold
    #[error("Amount overflow: {0}")]
    Overflow(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new overflow error
    pub fn overflow<T: fmt::Display>(msg: T) -> Self {
        Error::Overflow(msg.to_string())
    }

    /// Build an API error from a failed response body
    pub fn from_response_body(status: reqwest::StatusCode, body: String) -> Self {
        match serde_json::from_str::<ApiErrorDetails>(&body) {
            Ok(details) => Error::Api { details, status },
            Err(_) => Error::UnparsedApi {
                message: body,
                status,
            },
        }
    }

    /// Whether the error came from user input rather than the remote store
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::NoCustomerSelected)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_body_becomes_api_error() {
        let body = r#"{"code":"23502","message":"null value","details":null,"hint":null}"#;
        match Error::from_response_body(reqwest::StatusCode::BAD_REQUEST, body.to_string()) {
            Error::Api { details, status } => {
                assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
                assert_eq!(details.code.as_deref(), Some("23502"));
                assert_eq!(details.to_string(), "Code: 23502, Message: null value");
            }
            e => panic!("Expected Api error, got {:?}", e),
        }
    }

    #[test]
    fn plain_body_becomes_unparsed_error() {
        let err = Error::from_response_body(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        );
        assert!(matches!(err, Error::UnparsedApi { .. }));
        assert!(!err.is_validation());
    }

    #[test]
    fn input_failures_are_validation() {
        assert!(Error::validation("bad amount").is_validation());
        assert!(Error::NoCustomerSelected.is_validation());
        assert!(!Error::NotSignedIn.is_validation());
    }
}
