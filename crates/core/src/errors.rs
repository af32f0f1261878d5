use serde::Serialize;
use thiserror::Error;

use crate::domain::submission::{EmployeeAction, SubmissionStatus};
use crate::validation::ValidationError;
use crate::workflow::ProjectionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("action {action:?} is not offered for a {status} submission")]
    ActionNotOffered { action: EmployeeAction, status: SubmissionStatus },
    #[error("unknown role `{0}` (expected admin|manager|employee)")]
    UnknownRole(String),
    #[error("unknown account status `{0}` (expected active|locked)")]
    UnknownAccountStatus(String),
    #[error("unknown approval action `{0}` (expected approve|reject)")]
    UnknownAction(String),
}

/// Failure classes surfaced to callers; each maps to one user-facing message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Validation,
    Unauthorized,
    SessionExpired,
    Forbidden,
    NotFound,
    Conflict,
    BadRequest,
    Server,
    Network,
    Decode,
    Storage,
    Configuration,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unauthorized => "unauthorized",
            Self::SessionExpired => "session_expired",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::BadRequest => "bad_request",
            Self::Server => "server",
            Self::Network => "network",
            Self::Decode => "decode",
            Self::Storage => "storage",
            Self::Configuration => "configuration",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation => "Some fields are missing or invalid. Correct them and try again.",
            Self::Unauthorized => "You are not signed in or your credentials were declined.",
            Self::SessionExpired => "Your session has expired. Please sign in again.",
            Self::Forbidden => "You do not have permission to perform this action.",
            Self::NotFound => "The requested record could not be found.",
            Self::Conflict => "The record was changed by someone else. Reload and try again.",
            Self::BadRequest => "The request could not be processed. Check inputs and try again.",
            Self::Server => "The server failed to process the request. Please retry shortly.",
            Self::Network => "The service could not be reached. Check your connection and retry.",
            Self::Decode => "The server returned a response that could not be read.",
            Self::Storage => "The local session could not be read or written.",
            Self::Configuration => "The client configuration is invalid.",
        }
    }
}

impl DomainError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Projection(ProjectionError::UnknownHistoryEntry(_)) => ErrorClass::NotFound,
            Self::Validation(_)
            | Self::ActionNotOffered { .. }
            | Self::UnknownRole(_)
            | Self::UnknownAccountStatus(_)
            | Self::UnknownAction(_) => ErrorClass::Validation,
        }
    }
}
