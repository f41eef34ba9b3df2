// Crate error types and their HTTP mapping
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::params::error::RegistryError;

/// Where a rejected value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    Query,
    Body,
}

/// Structured location of a validation failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

/// First policy violation found by a validate pipeline
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub details: ValidationDetails,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: ValidationDetails::default(),
        }
    }

    /// `Invalid key <k>` for a key rejected during traversal
    pub fn invalid_key(key: &str, path: Option<&str>) -> Self {
        let mut error = Self::new(format!("Invalid key {}", key)).with_key(key);
        error.details.path = path.map(str::to_string);
        error
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.details.key = Some(key.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.details.path = Some(path.into());
        self
    }

    /// Sets the source unless an inner pipeline already did
    pub fn with_source(mut self, source: ErrorSource) -> Self {
        self.details.source.get_or_insert(source);
        self
    }

    /// Sets the param unless an inner pipeline already did
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        if self.details.param.is_none() {
            self.details.param = Some(param.into());
        }
        self
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Extension error: {0}")]
    Extension(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn model_not_found(uid: impl Into<String>) -> Self {
        Error::ModelNotFound(uid.into())
    }

    pub fn extension(message: impl Into<String>) -> Self {
        Error::Extension(message.into())
    }

    /// Attach source/param to a validation error, leaving other errors alone
    pub fn tag(self, source: ErrorSource, param: Option<&str>) -> Self {
        match self {
            Error::Validation(err) => {
                let err = err.with_source(source);
                Error::Validation(match param {
                    Some(param) => err.with_param(param),
                    None => err,
                })
            }
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::ModelNotFound(_) => 404,
            Error::Registry(_) => 500,
            Error::Extension(_) => 500,
            Error::Json(_) => 400,
            Error::Yaml(_) => 500,
            Error::Io(_) => 500,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::ModelNotFound(_) => "NOT_FOUND",
            Error::Registry(_) => "INTERNAL_SERVER_ERROR",
            Error::Extension(_) => "INTERNAL_SERVER_ERROR",
            Error::Json(_) => "INVALID_JSON",
            Error::Yaml(_) => "INTERNAL_SERVER_ERROR",
            Error::Io(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            Error::Validation(err) => json!({
                "error": true,
                "message": err.message,
                "code": self.error_code(),
                "details": err.details,
            }),
            Error::Json(_) => json!({
                "error": true,
                "message": self.to_string(),
                "code": self.error_code(),
            }),
            _ => {
                // Internal failures are logged, never echoed back
                tracing::error!("Sanitize pipeline error: {}", self);
                json!({
                    "error": true,
                    "message": "An error occurred while processing your request",
                    "code": self.error_code(),
                })
            }
        }
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
