use std::path::PathBuf;

use esm_core::{DomainError, ErrorClass, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store io failed at `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("session store at `{path}` could not be decoded: {source}")]
    Decode { path: PathBuf, source: serde_json::Error },
}

/// Failures of a call made through the session client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request was rejected as unauthorized: {message}")]
    Unauthorized { message: String },
    #[error("session expired: {reason}")]
    SessionExpired { reason: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("bad request ({status}): {message}")]
    BadRequest { status: u16, message: String },
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::Domain(DomainError::Validation(error))
    }
}

impl ApiError {
    /// Maps a non-success HTTP status onto the error taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound { message },
            409 => Self::Conflict { message },
            400..=499 => Self::BadRequest { status, message },
            _ => Self::Server { status, message },
        }
    }

    pub fn from_transport(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            return Self::Network(format!("request timed out after {timeout_secs}s"));
        }
        if error.is_connect() {
            return Self::Network(format!("could not connect to the API: {error}"));
        }
        Self::Network(error.to_string())
    }

    pub fn not_signed_in() -> Self {
        Self::Unauthorized { message: "no signed-in user".to_string() }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Unauthorized { .. } => ErrorClass::Unauthorized,
            Self::SessionExpired { .. } => ErrorClass::SessionExpired,
            Self::Forbidden { .. } => ErrorClass::Forbidden,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Conflict { .. } => ErrorClass::Conflict,
            Self::BadRequest { .. } => ErrorClass::BadRequest,
            Self::Server { .. } => ErrorClass::Server,
            Self::Network(_) => ErrorClass::Network,
            Self::Decode(_) => ErrorClass::Decode,
            Self::Storage(_) => ErrorClass::Storage,
            Self::Domain(error) => error.class(),
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::SessionExpired { .. })
    }
}
