//! Error types
//!
//! One enum per layer. Startup failures (`ConfigError`, `RegistryError`) abort
//! the process; everything raised while serving a call ends up in a
//! `ToolError` and is rendered into a failure envelope by the registry.

use std::fmt;

use thiserror::Error;

/// Configuration errors (fatal at startup)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "TestingBot credentials not found. Please set TESTINGBOT_KEY and TESTINGBOT_SECRET environment variables."
    )]
    MissingCredentials,

    #[error("Invalid TESTINGBOT_API_URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("Invalid TESTINGBOT_TIMEOUT_SECS '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// Registry construction errors (fatal at startup)
#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("Tool name must not be empty")]
    EmptyName,

    #[error("Duplicate tool registered: {0}")]
    DuplicateTool(String),

    #[error("Tool '{tool}' declares parameter '{param}' more than once")]
    DuplicateParameter { tool: String, param: String },

    #[error("Tool '{tool}' marks parameter '{param}' required but also gives it a default")]
    RequiredWithDefault { tool: String, param: String },
}

/// A single failing parameter
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, format!("missing required parameter {}", field))
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Failures surfaced by the TestingBot API client
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed. Please check your credentials. ({0})")]
    Authentication(String),

    #[error("TestingBot API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status code, when the failure came from an API response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication(_) => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Io(_) => None,
        }
    }
}

/// Failures raised inside a tool handler
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    Invalid(String),

    #[error("Unexpected arguments: {0}")]
    Decode(String),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

/// Per-request failure kinds produced by dispatch
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {}", join_fields(.0))]
    InvalidArguments(Vec<FieldError>),

    #[error("{source}")]
    Handler {
        tool: String,
        #[source]
        source: HandlerError,
    },
}

impl ToolError {
    /// Short kind label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Handler { .. } => "handler_error",
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.reason.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_lists_every_field() {
        let err = ToolError::InvalidArguments(vec![
            FieldError::missing("sessionId"),
            FieldError::new("limit", "limit must be at most 100"),
        ]);
        let text = err.to_string();
        assert!(text.contains("missing required parameter sessionId"));
        assert!(text.contains("limit must be at most 100"));
    }

    #[test]
    fn test_handler_error_keeps_original_message() {
        let err = ToolError::Handler {
            tool: "getTests".to_string(),
            source: HandlerError::Api(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            }),
        };
        assert_eq!(err.to_string(), "TestingBot API returned 500: boom");
        assert_eq!(err.kind(), "handler_error");
    }

    #[test]
    fn test_status_code() {
        let err = ApiError::Status {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(ApiError::Authentication("x".into()).status_code(), Some(401));
    }
}
