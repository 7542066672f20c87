//! Typed error handling for the resource API
//!
//! Every failure the dispatcher can produce is an [`ApiError`]. Each variant
//! knows its HTTP status, a stable error code, and the envelope it renders:
//!
//! - client errors render `{"message": "..."}`
//! - handler validation failures render `{"errors": [{"path", "message"}]}`
//! - internal faults render a generic message and never leak details
//!
//! Collaborators (search backends, handlers, stores) return `anyhow::Result`;
//! the `From<anyhow::Error>` conversion recovers an `ApiError` if one was
//! wrapped, otherwise the fault becomes [`ApiError::Internal`].
//!
//! # Example
//!
//! ```rust,ignore
//! use resource_api::prelude::*;
//!
//! match dispatcher.show(&caller, "company_tests", "t-1", &params).await {
//!     Ok(body) => println!("{}", body),
//!     Err(ApiError::NotFound { message }) => println!("{}", message),
//!     Err(e) => eprintln!("status {}", e.status_code()),
//! }
//! ```

use crate::core::auth::Action;
use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Message returned for every 500, whatever the cause
pub const APPLICATION_ERROR_MESSAGE: &str = "Application error, please try again later";

/// Message returned when a route names no registered resource
pub const URL_NOT_FOUND_MESSAGE: &str = "URL not found";

/// The error type returned by the dispatcher and the HTTP layer
#[derive(Debug)]
pub enum ApiError {
    /// Missing, malformed, unknown, revoked or mismatched credential
    Unauthorized,

    /// Caller lacks the endpoint permission or the per-record ability
    Forbidden,

    /// Unknown resource route or missing record
    NotFound { message: String },

    /// A query clause referenced a field outside the filterable set
    BadFilter { key: String, model: String },

    /// A sort key referenced a field outside the sortable set
    BadSort { key: String, model: String },

    /// Malformed request (body, include, parameters)
    BadInput { message: String },

    /// Field-scoped validation errors from input checks or a handler
    ValidationFailed(Vec<FieldError>),

    /// Resource configuration is inconsistent or incomplete
    Config(ConfigError),

    /// Unexpected fault; the message is for logs only
    Internal(String),
}

impl ApiError {
    pub fn not_found(model: &str) -> Self {
        ApiError::NotFound {
            message: format!("{} not found", capitalize(model)),
        }
    }

    pub fn url_not_found() -> Self {
        ApiError::NotFound {
            message: URL_NOT_FOUND_MESSAGE.to_string(),
        }
    }

    pub fn bad_input(message: impl Into<String>) -> Self {
        ApiError::BadInput {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadFilter { .. }
            | ApiError::BadSort { .. }
            | ApiError::BadInput { .. }
            | ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::BadFilter { .. } => "BAD_FILTER",
            ApiError::BadSort { .. } => "BAD_SORT",
            ApiError::BadInput { .. } => "BAD_INPUT",
            ApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is a server-side fault that must be reported
    pub fn is_internal(&self) -> bool {
        matches!(self, ApiError::Config(_) | ApiError::Internal(_))
    }

    /// The message shown to the caller
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Forbidden => "Forbidden".to_string(),
            ApiError::NotFound { message } => message.clone(),
            ApiError::BadFilter { key, model } => {
                format!("{} is not a filterable field for {}", key, model)
            }
            ApiError::BadSort { key, model } => {
                format!("{} is not a sortable field for {}", key, model)
            }
            ApiError::BadInput { message } => message.clone(),
            ApiError::ValidationFailed(_) => "Validation failed".to_string(),
            ApiError::Config(_) | ApiError::Internal(_) => APPLICATION_ERROR_MESSAGE.to_string(),
        }
    }

    /// Render the response envelope
    pub fn body(&self) -> Value {
        match self {
            ApiError::ValidationFailed(errors) => json!({ "errors": errors }),
            other => json!({ "message": other.public_message() }),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(e) => write!(f, "Configuration error: {}", e),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ValidationFailed(errors) => {
                let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
                write!(f, "Validation failed on: {}", paths.join(", "))
            }
            other => write!(f, "{}", other.public_message()),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// A validation error scoped to one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// camelCase path of the offending attribute
    pub path: String,
    pub message: String,
}

impl FieldError {
    /// Build an error for a snake_case attribute; the path is camelCased
    pub fn new(attribute: &str, message: impl Into<String>) -> Self {
        Self {
            path: to_camel_case(attribute),
            message: message.into(),
        }
    }
}

/// Convert a snake_case attribute name into lower camelCase
///
/// Dotted attributes (`owner.first_name`) keep their separators.
pub fn to_camel_case(attribute: &str) -> String {
    attribute
        .split('.')
        .map(|part| {
            let mut out = String::with_capacity(part.len());
            let mut upper_next = false;
            for c in part.chars() {
                if c == '_' {
                    upper_next = !out.is_empty();
                } else if upper_next {
                    out.extend(c.to_uppercase());
                    upper_next = false;
                } else {
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while loading configuration or resolving resources
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("failed to read configuration file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("invalid value for '{field}' on resource '{resource}': {message}")]
    InvalidValue {
        resource: String,
        field: String,
        message: String,
    },

    #[error("invalid environment override {var}='{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("resource '{0}' is registered twice")]
    DuplicateResource(String),

    #[error("no {action} handler '{identity}' registered for resource '{resource}'")]
    MissingHandler {
        resource: String,
        action: Action,
        identity: String,
    },

    #[error("serializer '{identity}' for resource '{resource}' is not registered")]
    MissingSerializer { resource: String, identity: String },
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Config(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api) => api,
            Err(other) => ApiError::Internal(format!("{:#}", other)),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadInput {
            message: format!("Malformed request body: {}", err),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_input(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => ApiError::bad_input(e.body_text()),
            other => ApiError::Internal(other.body_text()),
        }
    }
}

/// Result type alias used across the crate
pub type ApiResult<T> = Result<T, ApiError>;
